//! Managed-directory reconciliation.
//!
//! A managed file is named `<MANAGED_PREFIX><id><extension>`. After a
//! successful [`reconcile`], the managed files in the directory are exactly
//! the ones implied by the selected records. Files that do not follow the
//! naming convention are never touched.
//!
//! An I/O failure aborts immediately and may leave the directory partially
//! updated; re-running the rebuild restores consistency.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use portico_core::settings::{MANAGED_PREFIX, VHOST_EXTENSION};
use portico_core::{EndpointCollection, Selector};
use portico_renderer::{TemplateEngine, TemplateKind};

use crate::error::{io_err, SyncError};
use crate::writer::{self, FileChange};

/// An output directory and the extension of the files portico owns in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedDir {
    pub dir: PathBuf,
    pub extension: String,
}

impl ManagedDir {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    /// A vhost directory using the `.conf` extension.
    pub fn vhosts(dir: impl Into<PathBuf>) -> Self {
        Self::new(dir, VHOST_EXTENSION)
    }

    /// `<dir>/<MANAGED_PREFIX><id><extension>`
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir
            .join(format!("{MANAGED_PREFIX}{id}{}", self.extension))
    }

    /// The id encoded in a managed file name, or `None` for unmanaged names.
    pub fn id_of<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        file_name
            .strip_prefix(MANAGED_PREFIX)?
            .strip_suffix(self.extension.as_str())
            .filter(|id| !id.is_empty())
    }

    /// Every managed file currently present, keyed by id. A missing directory is empty.
    pub fn existing(&self) -> Result<BTreeMap<String, PathBuf>, SyncError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(io_err(&self.dir, err)),
        };

        let mut found = BTreeMap::new();
        for entry in entries {
            let entry = entry.map_err(|e| io_err(&self.dir, e))?;
            let file_type = entry.file_type().map_err(|e| io_err(entry.path(), e))?;
            if file_type.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(id) = self.id_of(name) {
                found.insert(id.to_string(), entry.path());
            }
        }
        Ok(found)
    }
}

/// Make the managed files in `target` match the records accepted by `selector`.
///
/// Order: render everything, prune stale files, then write desired files by id.
/// Rendering happens first so a template error leaves the directory untouched.
pub fn reconcile(
    engine: &TemplateEngine,
    kind: TemplateKind,
    target: &ManagedDir,
    collection: &EndpointCollection,
    selector: Selector,
    dry_run: bool,
) -> Result<Vec<FileChange>, SyncError> {
    let desired: BTreeMap<String, String> = engine
        .render_selected(kind, collection, selector)?
        .into_iter()
        .map(|(id, content)| (id.0, content))
        .collect();

    if !dry_run {
        std::fs::create_dir_all(&target.dir).map_err(|e| io_err(&target.dir, e))?;
    }

    let mut changes = Vec::new();
    for (id, path) in target.existing()? {
        if !desired.contains_key(&id) {
            changes.push(writer::remove(&path, dry_run)?);
        }
    }

    for (id, content) in &desired {
        let path = target.path_for(id);
        changes.push(writer::write_if_changed(&path, content, dry_run)?);
    }

    tracing::info!(
        dir = %target.dir.display(),
        desired = desired.len(),
        changed = changes.iter().filter(|c| c.is_change()).count(),
        "reconciled managed directory"
    );
    Ok(changes)
}

/// Delete every managed file in `target`, regardless of the current definitions.
pub fn clean(target: &ManagedDir, dry_run: bool) -> Result<Vec<FileChange>, SyncError> {
    let mut changes = Vec::new();
    for path in target.existing()?.into_values() {
        changes.push(writer::remove(&path, dry_run)?);
    }
    Ok(changes)
}

pub(crate) fn relative_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
