//! # portico-renderer
//!
//! Tera-based template engine that renders proxy vhosts and certificate
//! script stanzas from endpoint records.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use portico_core::{store, Settings};
//! use portico_renderer::{TemplateEngine, TemplateKind};
//!
//! fn render_all(settings: &Settings) {
//!     let Ok(collection) = store::load(&settings.backends_dir) else { return };
//!     if let Ok(engine) = TemplateEngine::new(settings) {
//!         for kind in TemplateKind::all() {
//!             if let Ok(outputs) = engine.render_selected(*kind, &collection, kind.selector()) {
//!                 for (id, content) in outputs {
//!                     println!("{id}: {} bytes", content.len());
//!                 }
//!             }
//!         }
//!     }
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod filters;

pub use context::TemplateContext;
pub use engine::{TemplateEngine, TemplateKind, CERT_SCRIPT_PREAMBLE};
pub use error::RenderError;
