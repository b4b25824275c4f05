//! Supervised mode: run the proxy in the foreground and keep it configured.

use std::future::Future;
use std::sync::Arc;

use portico_core::{EndpointCollection, Settings};

use crate::error::{io_err, join_err, ProcessError, SupervisorError};
use crate::orchestrator::{Orchestrator, OrchestratorState};
use crate::port::wait_for_port;
use crate::process::{check_status, CommandRunner, CommandSpec, SystemRunner};
use crate::renewal::RenewalTask;

const LOCALHOST: &str = "127.0.0.1";

/// Install the global `tracing` subscriber (`RUST_LOG`, default `info`).
///
/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run `future` to completion on a fresh multi-threaded runtime.
pub fn block_on<F: Future>(future: F) -> Result<F::Output, SupervisorError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    Ok(runtime.block_on(future))
}

/// Run the proxy under supervision until it exits.
///
/// 1. Remove managed configs left over from a previous run.
/// 2. Start the proxy in the foreground with only the unmanaged configs.
/// 3. Wait for the HTTP port, then rebuild, issue certificates and reload.
/// 4. Renew on a timer until the proxy exits.
///
/// Ctrl-C asks the proxy to quit and keeps waiting for it. If the proxy exits
/// during step 3, the configuration step in flight runs to completion before
/// the exit is reported.
pub async fn supervise(
    settings: Settings,
    collection: EndpointCollection,
) -> Result<(), SupervisorError> {
    let orchestrator = Arc::new(Orchestrator::new(
        settings,
        Arc::new(collection),
        SystemRunner,
    )?);
    supervise_with(orchestrator).await
}

async fn supervise_with<R>(
    orchestrator: Arc<Orchestrator<R>>,
) -> Result<(), SupervisorError>
where
    R: CommandRunner + 'static,
{
    blocking(&orchestrator, "clean", |o| o.clean().map(|_| ())).await?;

    let proxy = CommandSpec::new(&orchestrator.settings().programs.nginx)
        .args(["-g", "daemon off;"]);
    orchestrator.set_state(OrchestratorState::ReloadingOrStarting);
    let mut child = proxy.tokio_command().spawn().map_err(|source| {
        orchestrator.set_state(OrchestratorState::Failed);
        ProcessError::Spawn {
            command: proxy.to_string(),
            source,
        }
    })?;
    tracing::info!(pid = child.id().unwrap_or(0), "proxy started without managed configs");

    enum Startup {
        Ready(RenewalTask),
        Failed(SupervisorError),
        ProxyExited(std::io::Result<std::process::ExitStatus>),
    }

    let start = start_services(&orchestrator);
    tokio::pin!(start);
    let startup = tokio::select! {
        result = &mut start => match result {
            Ok(task) => Startup::Ready(task),
            Err(err) => Startup::Failed(err),
        },
        status = child.wait() => Startup::ProxyExited(status),
    };

    let renewal = match startup {
        Startup::Ready(task) => task,
        Startup::Failed(err) => {
            tracing::error!(error = %err, "startup failed, stopping proxy");
            orchestrator.set_state(OrchestratorState::Failed);
            let _ = child.kill().await;
            return Err(err);
        }
        Startup::ProxyExited(status) => {
            let status = status.map_err(|e| io_err(&orchestrator.settings().programs.nginx, e));
            // A step already on the blocking pool cannot be cancelled; let it
            // finish so no command outlives supervision.
            match start.await {
                Ok(task) => task.stop().await?,
                Err(err) => tracing::debug!(error = %err, "startup step failed after proxy exit"),
            }
            orchestrator.set_state(OrchestratorState::Failed);
            let status = status?;
            tracing::error!(status = %status, "proxy exited during startup");
            return Err(ProcessError::Exit {
                command: proxy.to_string(),
                code: status.code(),
            }
            .into());
        }
    };

    tracing::info!("proxy running with managed configs");

    let mut quitting = false;
    let mut kill_requested = false;
    let status = loop {
        if kill_requested {
            let _ = child.start_kill();
            kill_requested = false;
        }
        tokio::select! {
            status = child.wait() => break status,
            signal = tokio::signal::ctrl_c(), if !quitting => {
                quitting = true;
                match signal {
                    Ok(()) => {
                        tracing::info!("received ctrl-c, asking proxy to quit");
                        if let Err(err) = blocking(&orchestrator, "quit", |o| o.quit_proxy()).await {
                            tracing::warn!(error = %err, "graceful quit failed, killing proxy");
                            kill_requested = true;
                        }
                    }
                    Err(err) => tracing::warn!(error = %err, "ctrl-c handler unavailable"),
                }
            }
        }
    };

    renewal.stop().await?;

    let status = status.map_err(|e| io_err(&orchestrator.settings().programs.nginx, e))?;
    tracing::info!(status = %status, "proxy exited");
    if quitting {
        orchestrator.set_state(OrchestratorState::Idle);
        return Ok(());
    }
    orchestrator.track(check_status(&proxy, status).map_err(SupervisorError::from))?;
    orchestrator.set_state(OrchestratorState::Idle);
    Ok(())
}

async fn start_services<R>(
    orchestrator: &Arc<Orchestrator<R>>,
) -> Result<RenewalTask, SupervisorError>
where
    R: CommandRunner + 'static,
{
    let settings = orchestrator.settings();
    orchestrator.set_state(OrchestratorState::WaitingForReadiness);
    orchestrator.track(
        wait_for_port(LOCALHOST, settings.http_port, settings.port_wait)
            .await
            .map_err(SupervisorError::from),
    )?;

    blocking(orchestrator, "reload", |o| o.reload().map(|_| ())).await?;

    let renew_target = Arc::clone(orchestrator);
    Ok(RenewalTask::start(settings.renew_interval, move || {
        let orchestrator = Arc::clone(&renew_target);
        async move { blocking(&orchestrator, "renew", |o| o.renew()).await }
    }))
}

/// Run a synchronous orchestrator operation on the blocking pool.
async fn blocking<R, T, F>(
    orchestrator: &Arc<Orchestrator<R>>,
    task: &'static str,
    f: F,
) -> Result<T, SupervisorError>
where
    R: CommandRunner + 'static,
    T: Send + 'static,
    F: FnOnce(&Orchestrator<R>) -> Result<T, SupervisorError> + Send + 'static,
{
    let orchestrator = Arc::clone(orchestrator);
    tokio::task::spawn_blocking(move || f(&orchestrator))
        .await
        .map_err(|e| join_err(task, e))?
}
