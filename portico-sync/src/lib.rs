//! # portico-sync
//!
//! Reconciles generated files on disk with the current endpoint collection.
//!
//! - [`reconcile`] — one file per endpoint in a managed directory, stale files pruned
//! - [`render_to_file`] — every endpoint rendered into one shared file
//! - [`clean`] — remove every managed file from a directory
//! - [`diff`] — preview what a rebuild would change, without writing

pub mod diff;
pub mod error;
pub mod reconcile;
pub mod single_file;
pub mod writer;

pub use diff::{diff_managed, diff_single_file, FileDiff};
pub use error::SyncError;
pub use reconcile::{clean, reconcile, ManagedDir};
pub use single_file::{mark_executable, render_to_file};
pub use writer::FileChange;
