//! `portico build` — render managed vhosts and the certificate script.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use portico_core::Settings;
use portico_supervisor::{Orchestrator, SystemRunner};

use super::{load_collection, print_changes};

#[derive(Args, Debug)]
pub struct BuildArgs {}

impl BuildArgs {
    pub fn run(self, settings: &Settings) -> Result<()> {
        let collection = load_collection(settings)?;
        let orchestrator = Orchestrator::new(settings.clone(), Arc::new(collection), SystemRunner)
            .context("failed to load templates")?;
        let report = orchestrator.rebuild().context("rebuild failed")?;
        print_changes("rebuilt", report.changes(), false);
        Ok(())
    }
}
