//! Rendering every selected endpoint into one shared file.

use std::path::Path;

use portico_core::{EndpointCollection, Selector};
use portico_renderer::{TemplateEngine, TemplateKind};

use crate::error::SyncError;
use crate::writer::{self, FileChange};

/// Render `kind` for every record accepted by `selector` and store the
/// concatenation at `path`. Parent directories are created as needed.
pub fn render_to_file(
    engine: &TemplateEngine,
    kind: TemplateKind,
    path: &Path,
    collection: &EndpointCollection,
    selector: Selector,
    dry_run: bool,
) -> Result<FileChange, SyncError> {
    let content = engine.render_concatenated(kind, collection, selector)?;
    writer::write_if_changed(path, &content, dry_run)
}

/// Set mode `0755` on `path`.
#[cfg(unix)]
pub fn mark_executable(path: &Path) -> Result<(), SyncError> {
    use std::os::unix::fs::PermissionsExt;

    let perms = std::fs::Permissions::from_mode(0o755);
    std::fs::set_permissions(path, perms).map_err(|e| crate::error::io_err(path, e))
}

/// No permission bits to set on this platform.
#[cfg(not(unix))]
pub fn mark_executable(_path: &Path) -> Result<(), SyncError> {
    Ok(())
}
