//! Repository Module
//!
//! Typed access to the tenant's collections on top of [`DocumentStore`].
//! Each module is a set of free functions taking a [`TenantDb`].

pub mod member;
pub mod settings;
pub mod staff;
pub mod transaction;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use thiserror::Error;

use super::{Collection, CollectionQuery, DocPath, Document, DocumentStore, StoreError};
use crate::utils::{AppError, ErrorCode};

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::with_message(ErrorCode::NotFound, msg),
            RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::AlreadyExists, msg),
            RepoError::Validation(msg) => AppError::validation(msg),
            RepoError::Store(e) => e.into(),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Store handle scoped to one tenant namespace
#[derive(Clone)]
pub struct TenantDb {
    store: Arc<dyn DocumentStore>,
    tenant: String,
}

impl TenantDb {
    pub fn new(store: Arc<dyn DocumentStore>, tenant: impl Into<String>) -> Self {
        Self {
            store,
            tenant: tenant.into(),
        }
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    pub fn path(&self, collection: Collection, id: impl Into<String>) -> DocPath {
        DocPath::new(self.tenant.clone(), collection, id)
    }

    pub fn query(&self, collection: Collection) -> CollectionQuery {
        CollectionQuery::new(self.tenant.clone(), collection)
    }
}

/// Decode a collection result, skipping documents that no longer parse
pub fn decode_all<T: DeserializeOwned>(docs: &[Document]) -> Vec<T> {
    docs.iter()
        .filter_map(|doc| match doc.decode::<T>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(id = %doc.id, error = %e, "Skipping malformed document");
                None
            }
        })
        .collect()
}
