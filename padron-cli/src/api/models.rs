//! Wire models for the console backend API

use serde::{Deserialize, Serialize};

use crate::import::validator::CandidateRecord;

/// One entry of a reference catalog (institutions, cities)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: i64,
    pub name: String,
}

/// Identifier/email pair of an authority already persisted in the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistingCredential {
    pub identifier: String,
    #[serde(default)]
    pub email: String,
}

/// Request body of the batch-create call
#[derive(Debug, Serialize)]
pub struct BatchCreateRequest<'a> {
    pub records: &'a [CandidateRecord],
}

/// Per-item outcomes of the batch-create call
///
/// The backend reports every submitted record in exactly one of the two
/// lists; the reconciler guards against records missing from both.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchCreateResponse {
    #[serde(default)]
    pub successes: Vec<CreatedAuthority>,
    #[serde(default)]
    pub failures: Vec<FailedAuthority>,
}

/// A record the backend persisted, with its assigned login
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedAuthority {
    pub identifier: String,
    pub name: String,
    pub username: String,
}

/// A record the backend rejected
#[derive(Debug, Clone, Deserialize)]
pub struct FailedAuthority {
    pub identifier: String,
    pub name: String,
    pub error: String,
}
