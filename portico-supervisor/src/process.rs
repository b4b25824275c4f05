//! External command execution.
//!
//! Every command portico runs goes through a [`CommandRunner`], so the
//! orchestrator can be driven by a real runner, a logging-only runner, or a
//! test double.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use crate::error::ProcessError;

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl CommandSpec {
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    fn std_command(&self) -> std::process::Command {
        let mut cmd = std::process::Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }

    /// Async variant for long-running children; the child is killed when dropped.
    pub(crate) fn tokio_command(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        cmd
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {arg:?}")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Runs a command to completion.
pub trait CommandRunner: Send + Sync {
    fn run(&self, command: &CommandSpec) -> Result<(), ProcessError>;
}

/// Executes commands with stdout/stderr passed through to ours.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: &CommandSpec) -> Result<(), ProcessError> {
        tracing::info!(command = %command, "running");
        let status = command
            .std_command()
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| ProcessError::Spawn {
                command: command.to_string(),
                source,
            })?;
        check_status(command, status)
    }
}

/// Logs each command instead of running it.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunner;

impl CommandRunner for DryRunner {
    fn run(&self, command: &CommandSpec) -> Result<(), ProcessError> {
        tracing::info!(command = %command, "[dry-run] would run");
        Ok(())
    }
}

pub(crate) fn check_status(
    command: &CommandSpec,
    status: std::process::ExitStatus,
) -> Result<(), ProcessError> {
    if status.success() {
        Ok(())
    } else {
        Err(ProcessError::Exit {
            command: command.to_string(),
            code: status.code(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_quotes_arguments_with_spaces() {
        let cmd = CommandSpec::new("nginx").args(["-g", "daemon off;"]);
        assert_eq!(cmd.to_string(), r#"nginx -g "daemon off;""#);
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let cmd = CommandSpec::new("/nonexistent/portico-test-binary");
        let err = SystemRunner.run(&cmd).unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_reported_with_code() {
        let cmd = CommandSpec::new("sh").args(["-c", "exit 3"]);
        match SystemRunner.run(&cmd) {
            Err(ProcessError::Exit { code, command }) => {
                assert_eq!(code, Some(3));
                assert_eq!(command, r#"sh -c "exit 3""#);
            }
            other => panic!("expected exit error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn zero_exit_succeeds() {
        SystemRunner
            .run(&CommandSpec::new("sh").args(["-c", "true"]))
            .expect("success");
    }

    #[test]
    fn dry_runner_never_fails() {
        DryRunner
            .run(&CommandSpec::new("/nonexistent/portico-test-binary"))
            .expect("dry run");
    }
}
