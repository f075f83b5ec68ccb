//! Single-partition key/value storage for visit entities.
//!
//! Two interchangeable backends implement [`VisitRepository`]: a row store on
//! SQLite and a document store keeping one JSON document per visit. The
//! backend is picked once at startup and wrapped in [`VisitStore`].

pub mod document;
pub mod table;

use std::future::Future;

use thiserror::Error;

use crate::config::StorageConfig;
use crate::db;
use crate::models::VisitEntity;

pub use document::DocumentVisitStore;
pub use table::TableVisitStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid name: {0:?}")]
    InvalidName(String),
}

/// Storage contract shared by both backends. All keys live in the fixed
/// [`crate::models::PARTITION_KEY`] partition.
///
/// Writes are conditional: a write whose precondition fails leaves the store
/// untouched and reports `false`.
pub trait VisitRepository: Send + Sync {
    fn list(&self) -> impl Future<Output = Result<Vec<VisitEntity>, StoreError>> + Send;
    fn get(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<VisitEntity>, StoreError>> + Send;
    /// Store a new entity. `false` when the key already exists.
    fn insert(
        &self,
        entity: &VisitEntity,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;
    /// Replace an existing entity in full. `false` when the key does not exist.
    fn replace(
        &self,
        entity: &VisitEntity,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;
    /// Returns `true` when an entity was removed.
    fn delete(&self, id: &str) -> impl Future<Output = Result<bool, StoreError>> + Send;
}

/// The backend selected by configuration.
#[derive(Debug, Clone)]
pub enum VisitStore {
    Table(TableVisitStore),
    Document(DocumentVisitStore),
}

impl VisitStore {
    /// Connect the configured backend, creating its table or directory if
    /// missing.
    pub async fn connect(config: &StorageConfig) -> Result<Self, StoreError> {
        match config {
            StorageConfig::Table {
                database_url,
                table_name,
            } => {
                tracing::info!("Using row store {} (table {})", database_url, table_name);
                let pool = db::init_pool(database_url).await?;
                Ok(Self::Table(TableVisitStore::open(pool, table_name).await?))
            }
            StorageConfig::Document {
                directory,
                collection,
            } => {
                tracing::info!(
                    "Using document store {} (collection {})",
                    directory.display(),
                    collection
                );
                Ok(Self::Document(
                    DocumentVisitStore::open(directory, collection).await?,
                ))
            }
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Table(_) => "table",
            Self::Document(_) => "document",
        }
    }
}

impl VisitRepository for VisitStore {
    async fn list(&self) -> Result<Vec<VisitEntity>, StoreError> {
        match self {
            Self::Table(store) => store.list().await,
            Self::Document(store) => store.list().await,
        }
    }

    async fn get(&self, id: &str) -> Result<Option<VisitEntity>, StoreError> {
        match self {
            Self::Table(store) => store.get(id).await,
            Self::Document(store) => store.get(id).await,
        }
    }

    async fn insert(&self, entity: &VisitEntity) -> Result<bool, StoreError> {
        match self {
            Self::Table(store) => store.insert(entity).await,
            Self::Document(store) => store.insert(entity).await,
        }
    }

    async fn replace(&self, entity: &VisitEntity) -> Result<bool, StoreError> {
        match self {
            Self::Table(store) => store.replace(entity).await,
            Self::Document(store) => store.replace(entity).await,
        }
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        match self {
            Self::Table(store) => store.delete(id).await,
            Self::Document(store) => store.delete(id).await,
        }
    }
}

/// Names used to build table names and directory paths: ASCII alphanumerics,
/// `_` and `-`, not starting with `-`.
pub(crate) fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
