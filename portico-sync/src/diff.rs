//! Unified-diff preview for `portico diff`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use similar::TextDiff;

use portico_core::{EndpointCollection, Selector};
use portico_renderer::{TemplateEngine, TemplateKind};

use crate::error::SyncError;
use crate::reconcile::{relative_name, ManagedDir};
use crate::writer::{existing_text, read_existing};

/// A single file that a rebuild would change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub path: PathBuf,
    pub unified_diff: String,
}

/// Compare what [`crate::reconcile`] would produce in `target` with what is on disk.
///
/// Stale managed files show up as deletions. No files are written.
pub fn diff_managed(
    engine: &TemplateEngine,
    kind: TemplateKind,
    target: &ManagedDir,
    collection: &EndpointCollection,
    selector: Selector,
) -> Result<Vec<FileDiff>, SyncError> {
    let mut planned: BTreeMap<PathBuf, String> = target
        .existing()?
        .into_values()
        .map(|path| (path, String::new()))
        .collect();
    for (id, content) in engine.render_selected(kind, collection, selector)? {
        planned.insert(target.path_for(id.as_str()), content);
    }

    let mut diffs = Vec::new();
    for (path, rendered) in planned {
        if let Some(diff) = diff_one(&path, &rendered)? {
            diffs.push(diff);
        }
    }
    Ok(diffs)
}

/// Compare what [`crate::render_to_file`] would write at `path` with what is on disk.
pub fn diff_single_file(
    engine: &TemplateEngine,
    kind: TemplateKind,
    path: &Path,
    collection: &EndpointCollection,
    selector: Selector,
) -> Result<Option<FileDiff>, SyncError> {
    let rendered = engine.render_concatenated(kind, collection, selector)?;
    diff_one(path, &rendered)
}

fn diff_one(path: &Path, rendered: &str) -> Result<Option<FileDiff>, SyncError> {
    let existing = read_existing(path)?
        .map(|bytes| existing_text(&bytes))
        .unwrap_or_default();
    if existing == rendered {
        return Ok(None);
    }

    let name = relative_name(path);
    let old_header = format!("a/{name}");
    let new_header = format!("b/{name}");
    let unified = TextDiff::from_lines(existing.as_str(), rendered)
        .unified_diff()
        .header(&old_header, &new_header)
        .context_radius(3)
        .to_string();

    Ok(Some(FileDiff {
        path: path.to_path_buf(),
        unified_diff: unified,
    }))
}
