pub mod build;
pub mod clean;
pub mod diff;
pub mod get;
pub mod list;
pub mod reload;
pub mod supervise;
pub mod wait_port;

use anyhow::{Context, Result};

use portico_core::{store, EndpointCollection, Settings};
use portico_sync::FileChange;

/// Load and validate every definition under the backends directory.
pub(crate) fn load_collection(settings: &Settings) -> Result<EndpointCollection> {
    store::load(&settings.backends_dir).with_context(|| {
        format!(
            "failed to load endpoint definitions from {}",
            settings.backends_dir.display()
        )
    })
}

pub(crate) fn print_changes<'a>(
    label: &str,
    changes: impl IntoIterator<Item = &'a FileChange>,
    dry_run: bool,
) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    let changes: Vec<&FileChange> = changes.into_iter().collect();
    let mut written = 0;
    let mut removed = 0;
    let mut unchanged = 0;
    for change in &changes {
        match change {
            FileChange::Written { .. } | FileChange::WouldWrite { .. } => written += 1,
            FileChange::Removed { .. } | FileChange::WouldRemove { .. } => removed += 1,
            FileChange::Unchanged { .. } => unchanged += 1,
        }
    }

    if written == 0 && removed == 0 {
        println!("{prefix}✓ {label}: nothing to do ({unchanged} unchanged)");
        return;
    }

    println!("{prefix}✓ {label} ({written} written, {removed} removed, {unchanged} unchanged)");
    for change in changes {
        let marker = match change {
            FileChange::Written { .. } => "✎ ",
            FileChange::WouldWrite { .. } => "~ ",
            FileChange::Removed { .. } => "✗ ",
            FileChange::WouldRemove { .. } => "- ",
            FileChange::Unchanged { .. } => "· ",
        };
        println!("  {marker} {}", change.path().display());
    }
}
