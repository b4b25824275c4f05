//! `portico clean` — remove every managed vhost file.

use anyhow::{Context, Result};
use clap::Args;

use portico_core::Settings;
use portico_sync::{clean, ManagedDir};

use super::print_changes;

#[derive(Args, Debug)]
pub struct CleanArgs {
    /// List the files that would be removed without deleting them.
    #[arg(long)]
    pub dry_run: bool,
}

impl CleanArgs {
    pub fn run(self, settings: &Settings) -> Result<()> {
        let mut changes = Vec::new();
        for dir in [settings.vhosts_dir(), settings.stream_vhosts_dir()] {
            let target = ManagedDir::vhosts(&dir);
            let removed = clean(&target, self.dry_run)
                .with_context(|| format!("failed to clean {}", dir.display()))?;
            changes.extend(removed);
        }
        print_changes("cleaned", &changes, self.dry_run);
        Ok(())
    }
}
