//! One-off certificate issuance (`portico get`).

use portico_core::Settings;

use crate::error::SupervisorError;
use crate::process::{CommandRunner, CommandSpec};

/// Build the `certbot certonly` invocation for `args`.
///
/// Arguments containing `@` become `--email`, everything else `-d`, in the
/// order given.
pub fn issue_command(settings: &Settings, args: &[String]) -> Result<CommandSpec, SupervisorError> {
    if args.is_empty() {
        return Err(SupervisorError::InvalidArguments(
            "at least one domain or email address is required".to_string(),
        ));
    }

    let mut cmd = CommandSpec::new(&settings.programs.certbot)
        .args(["certonly", "--agree-tos", "--non-interactive", "--webroot", "-w"])
        .arg(&settings.webroot);
    for arg in args {
        let flag = if arg.contains('@') { "--email" } else { "-d" };
        cmd = cmd.arg(flag).arg(arg);
    }
    Ok(cmd)
}

/// Request a certificate for `args` right away.
pub fn get<R: CommandRunner>(
    runner: &R,
    settings: &Settings,
    args: &[String],
) -> Result<(), SupervisorError> {
    let cmd = issue_command(settings, args)?;
    runner.run(&cmd)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::tests::RecordingRunner;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn arguments_are_classified_in_order() {
        let settings = Settings::default();
        let cmd = issue_command(
            &settings,
            &strings(&["a.example", "ops@a.example", "b.example"]),
        )
        .unwrap();
        assert_eq!(
            cmd.to_string(),
            "certbot certonly --agree-tos --non-interactive --webroot -w /webroot \
             -d a.example --email ops@a.example -d b.example"
        );
    }

    #[test]
    fn empty_arguments_are_rejected() {
        let err = issue_command(&Settings::default(), &[]).unwrap_err();
        assert!(matches!(err, SupervisorError::InvalidArguments(_)));
    }

    #[test]
    fn get_runs_one_command() {
        let runner = RecordingRunner::default();
        get(&runner, &Settings::default(), &strings(&["a.example"])).unwrap();
        assert_eq!(runner.calls().len(), 1);
        assert!(runner.calls()[0].starts_with("certbot certonly"));
    }
}
