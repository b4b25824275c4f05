//! Portico core library: endpoint definitions, the endpoint store, settings.
//!
//! Public API surface:
//! - [`types`] — endpoint domain types and the [`Selector`] predicate
//! - [`error`] — [`StoreError`] and [`ValidationError`]
//! - [`store`] — load and validate a backends directory
//! - [`settings`] — explicit runtime configuration

pub mod error;
pub mod settings;
pub mod store;
pub mod types;

pub use error::{StoreError, ValidationError};
pub use settings::{PortWaitPolicy, Programs, Settings};
pub use types::{
    ClientDefinition, EndpointCollection, EndpointDefinition, EndpointId, EndpointRecord,
    Protocol, Selector,
};
