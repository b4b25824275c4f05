//! `portico reload` and `portico dry-run`.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use portico_core::Settings;
use portico_supervisor::{CommandRunner, DryRunner, Orchestrator, SystemRunner};

use super::{load_collection, print_changes};

#[derive(Args, Debug)]
pub struct ReloadArgs {}

impl ReloadArgs {
    /// With `dry_run`, files are still rebuilt but commands are only logged.
    pub fn run(self, settings: &Settings, dry_run: bool) -> Result<()> {
        if dry_run {
            reload_with(settings, DryRunner)?;
            println!("[dry-run] configs rebuilt; certificate script and nginx commands were not run");
        } else {
            reload_with(settings, SystemRunner)?;
            println!("✓ nginx reloaded");
        }
        Ok(())
    }
}

fn reload_with<R: CommandRunner>(settings: &Settings, runner: R) -> Result<()> {
    let collection = load_collection(settings)?;
    let orchestrator = Orchestrator::new(settings.clone(), Arc::new(collection), runner)
        .context("failed to load templates")?;
    let report = orchestrator.reload().context("reload failed")?;
    print_changes("rebuilt", report.changes(), false);
    Ok(())
}
