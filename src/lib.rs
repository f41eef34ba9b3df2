//! Schema-driven sanitize/validate pipelines for content API payloads
//!
//! Every entity, query and body is walked against its model schema by the
//! [`traverse`] engine while an ordered chain of [`visitors`] decides what to
//! keep. [`sanitize`] drops offending keys, [`validate`] rejects the request
//! on the first one. Plugins widen the accepted keys through the
//! [`params`] registry before it is frozen at bootstrap.

pub mod cli;
pub mod config;
pub mod content_api;
pub mod error;
pub mod extensions;
pub mod handlers;
pub mod options;
pub mod params;
pub mod permissions;
pub mod sanitize;
pub mod schema;
pub mod traverse;
pub mod validate;
pub mod visitors;

#[cfg(test)]
pub mod testing;

pub use content_api::ContentApi;
pub use error::{Error, ErrorSource, Result, ValidationError};
pub use options::{ApiSurface, RequestOptions};
