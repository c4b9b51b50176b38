//! Console backend API client
//!
//! Thin REST client for the administration console, exposing only the
//! operations the import pipeline consumes: the reference catalogs, the
//! existing-credential corpus, and the batch-create call.

pub mod client;
pub mod models;

pub use client::{ConsoleApi, ConsoleClient};
pub use models::{
    BatchCreateResponse, CatalogEntry, CreatedAuthority, ExistingCredential, FailedAuthority,
};
