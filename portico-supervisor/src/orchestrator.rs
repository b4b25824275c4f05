//! Rebuild / certificate / reload sequencing.
//!
//! ```text
//! Idle → Rebuilding → RunningCertScript → WaitingForReadiness → ReloadingOrStarting → Steady
//!                     any state ──error──▶ Failed
//! ```
//!
//! Every operation is synchronous. The current state is published on a
//! [`tokio::sync::watch`] channel so the supervised runtime (or a test) can
//! observe progress without sharing mutable state.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

use portico_core::{EndpointCollection, Selector, Settings};
use portico_renderer::{TemplateEngine, TemplateKind};
use portico_sync::{clean, mark_executable, reconcile, render_to_file, FileChange, ManagedDir};

use crate::error::SupervisorError;
use crate::process::{CommandRunner, CommandSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Idle,
    Rebuilding,
    RunningCertScript,
    WaitingForReadiness,
    ReloadingOrStarting,
    Steady,
    Failed,
}

impl fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrchestratorState::Idle => "idle",
            OrchestratorState::Rebuilding => "rebuilding",
            OrchestratorState::RunningCertScript => "running-cert-script",
            OrchestratorState::WaitingForReadiness => "waiting-for-readiness",
            OrchestratorState::ReloadingOrStarting => "reloading",
            OrchestratorState::Steady => "steady",
            OrchestratorState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Per-file outcomes of one rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildReport {
    pub https: Vec<FileChange>,
    pub stream: Vec<FileChange>,
    pub cert_script: FileChange,
}

impl RebuildReport {
    pub fn changes(&self) -> impl Iterator<Item = &FileChange> {
        self.https
            .iter()
            .chain(&self.stream)
            .chain(std::iter::once(&self.cert_script))
    }

    pub fn changed_count(&self) -> usize {
        self.changes().filter(|c| c.is_change()).count()
    }
}

pub struct Orchestrator<R> {
    settings: Settings,
    engine: TemplateEngine,
    collection: Arc<EndpointCollection>,
    runner: R,
    state: watch::Sender<OrchestratorState>,
}

impl<R: CommandRunner> Orchestrator<R> {
    pub fn new(
        settings: Settings,
        collection: Arc<EndpointCollection>,
        runner: R,
    ) -> Result<Self, SupervisorError> {
        let engine = TemplateEngine::new(&settings)?;
        let (state, _) = watch::channel(OrchestratorState::Idle);
        Ok(Self {
            settings,
            engine,
            collection,
            runner,
            state,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> OrchestratorState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<OrchestratorState> {
        self.state.subscribe()
    }

    pub(crate) fn set_state(&self, state: OrchestratorState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            tracing::debug!(from = %previous, to = %state, "orchestrator state");
        }
    }

    /// Record `Failed` if `result` is an error, then hand it back.
    pub(crate) fn track<T>(
        &self,
        result: Result<T, SupervisorError>,
    ) -> Result<T, SupervisorError> {
        if result.is_err() {
            self.set_state(OrchestratorState::Failed);
        }
        result
    }

    fn https_dir(&self) -> ManagedDir {
        ManagedDir::vhosts(self.settings.vhosts_dir())
    }

    fn stream_dir(&self) -> ManagedDir {
        ManagedDir::vhosts(self.settings.stream_vhosts_dir())
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Reconcile both vhost directories, then regenerate the certificate script.
    pub fn rebuild(&self) -> Result<RebuildReport, SupervisorError> {
        let report = self.track(self.rebuild_inner())?;
        self.set_state(OrchestratorState::Idle);
        Ok(report)
    }

    fn rebuild_inner(&self) -> Result<RebuildReport, SupervisorError> {
        self.set_state(OrchestratorState::Rebuilding);
        let https = self.reconcile_kind(TemplateKind::Https, &self.https_dir())?;
        let stream = self.reconcile_kind(TemplateKind::Stream, &self.stream_dir())?;

        let script = self.settings.cert_script();
        let cert_script = render_to_file(
            &self.engine,
            TemplateKind::CertScript,
            &script,
            &self.collection,
            Selector::All,
            false,
        )?;
        mark_executable(&script)?;

        let report = RebuildReport {
            https,
            stream,
            cert_script,
        };
        tracing::info!(
            endpoints = self.collection.len(),
            changed = report.changed_count(),
            "rebuild complete"
        );
        Ok(report)
    }

    fn reconcile_kind(
        &self,
        kind: TemplateKind,
        target: &ManagedDir,
    ) -> Result<Vec<FileChange>, SupervisorError> {
        Ok(reconcile(
            &self.engine,
            kind,
            target,
            &self.collection,
            kind.selector(),
            false,
        )?)
    }

    /// Execute the generated certificate script.
    pub fn run_cert_script(&self) -> Result<(), SupervisorError> {
        self.track(self.run_cert_script_inner())
    }

    fn run_cert_script_inner(&self) -> Result<(), SupervisorError> {
        self.set_state(OrchestratorState::RunningCertScript);
        let cmd = CommandSpec::new(&self.settings.programs.shell).arg(self.settings.cert_script());
        Ok(self.runner.run(&cmd)?)
    }

    /// Validate the proxy configuration and, only if it is valid, reload it.
    pub fn reload_proxy(&self) -> Result<(), SupervisorError> {
        self.track(self.reload_proxy_inner())?;
        self.set_state(OrchestratorState::Steady);
        Ok(())
    }

    fn reload_proxy_inner(&self) -> Result<(), SupervisorError> {
        self.set_state(OrchestratorState::ReloadingOrStarting);
        let nginx = &self.settings.programs.nginx;
        self.runner.run(&CommandSpec::new(nginx).arg("-t"))?;
        self.runner
            .run(&CommandSpec::new(nginx).args(["-s", "reload"]))?;
        Ok(())
    }

    /// `rebuild` + certificate script + `reload_proxy`.
    pub fn reload(&self) -> Result<RebuildReport, SupervisorError> {
        let report = self.track(self.rebuild_inner())?;
        self.run_cert_script()?;
        self.reload_proxy()?;
        Ok(report)
    }

    /// Renew certificates, then reload the proxy so it picks them up.
    pub fn renew(&self) -> Result<(), SupervisorError> {
        let cmd = CommandSpec::new(&self.settings.programs.certbot).arg("renew");
        self.track(self.runner.run(&cmd).map_err(SupervisorError::from))?;
        self.reload_proxy()
    }

    /// Ask the running proxy to shut down gracefully.
    pub fn quit_proxy(&self) -> Result<(), SupervisorError> {
        let cmd = CommandSpec::new(&self.settings.programs.nginx).args(["-s", "quit"]);
        Ok(self.runner.run(&cmd)?)
    }

    /// Delete every managed vhost file in both directories.
    pub fn clean(&self) -> Result<Vec<FileChange>, SupervisorError> {
        let mut removed = clean(&self.https_dir(), false)?;
        removed.extend(clean(&self.stream_dir(), false)?);
        tracing::info!(removed = removed.len(), "removed managed configs");
        Ok(removed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
