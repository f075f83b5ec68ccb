//! Mapping between public [`Visit`] records and stored [`VisitEntity`] rows.

use thiserror::Error;
use tracing::{error, warn};

use crate::models::{Visit, VisitEntity};
use crate::store::{StoreError, VisitRepository, VisitStore};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("visit id is required")]
    MissingId,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct VisitService {
    store: VisitStore,
}

impl VisitService {
    pub fn new(store: VisitStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &VisitStore {
        &self.store
    }

    pub async fn list_all(&self) -> Result<Vec<Visit>, ServiceError> {
        let entities = self.store.list().await.map_err(logged)?;
        Ok(entities.into_iter().map(Visit::from).collect())
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Visit>, ServiceError> {
        let entity = self.store.get(id).await.map_err(logged)?;
        Ok(entity.map(Visit::from))
    }

    /// Store a new visit and return the stored copy. `Ok(None)` when the key
    /// already exists; the existing record is left as it was.
    pub async fn create(&self, visit: &Visit) -> Result<Option<Visit>, ServiceError> {
        let entity = Self::entity(visit)?;
        if !self.store.insert(&entity).await.map_err(logged)? {
            warn!("Visit {} already exists, not created", visit.id);
            return Ok(None);
        }
        self.read_back(visit).await
    }

    /// Replace an existing visit and return the stored copy. `Ok(None)` when
    /// there is no visit with that id; nothing is written then.
    pub async fn update(&self, visit: &Visit) -> Result<Option<Visit>, ServiceError> {
        let entity = Self::entity(visit)?;
        if !self.store.replace(&entity).await.map_err(logged)? {
            warn!("Visit {} does not exist, not updated", visit.id);
            return Ok(None);
        }
        self.read_back(visit).await
    }

    /// Delete a visit, returning the record as it was read before deletion.
    pub async fn delete(&self, id: &str) -> Result<Option<Visit>, ServiceError> {
        let Some(entity) = self.store.get(id).await.map_err(logged)? else {
            return Ok(None);
        };

        let removed = self.store.delete(id).await.map_err(logged)?;
        Ok(removed.then(|| Visit::from(entity)))
    }

    fn entity(visit: &Visit) -> Result<VisitEntity, ServiceError> {
        if visit.id.is_empty() {
            return Err(ServiceError::MissingId);
        }
        Ok(VisitEntity::from(visit))
    }

    /// Read back the authoritative copy rather than echoing the input.
    async fn read_back(&self, visit: &Visit) -> Result<Option<Visit>, ServiceError> {
        self.get_by_id(&visit.id).await
    }
}

fn logged(e: StoreError) -> ServiceError {
    error!("Storage error: {e}");
    ServiceError::Store(e)
}
