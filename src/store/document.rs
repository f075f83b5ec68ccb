use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

use super::{StoreError, VisitRepository, is_safe_name};
use crate::models::{PARTITION_KEY, VisitEntity};

/// Longest id that maps to a document file name. Longer ids hit file system
/// name limits, so they are treated as absent like any other unusable id.
const MAX_ID_LEN: usize = 200;

/// Document store: one JSON document per visit under
/// `<root>/<collection>/<partition>/<id>.json`.
#[derive(Debug, Clone)]
pub struct DocumentVisitStore {
    dir: PathBuf,
    /// Serializes replace and delete, so a replace cannot bring back a
    /// document deleted after its existence check.
    write_lock: Arc<Mutex<()>>,
}

impl DocumentVisitStore {
    /// Open the collection under `root`, creating its directory if missing.
    pub async fn open(root: impl AsRef<Path>, collection: &str) -> Result<Self, StoreError> {
        if !is_safe_name(collection) {
            return Err(StoreError::InvalidName(collection.to_string()));
        }
        let dir = root.as_ref().join(collection).join(PARTITION_KEY);
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the document for `id`, or `None` when the id cannot name a file
    /// inside the collection.
    fn document_path(&self, id: &str) -> Option<PathBuf> {
        (id.len() <= MAX_ID_LEN && is_safe_name(id))
            .then(|| self.dir.join(format!("{id}.json")))
    }

    fn writable_path(&self, entity: &VisitEntity) -> Result<PathBuf, StoreError> {
        self.document_path(&entity.row_key)
            .ok_or_else(|| StoreError::InvalidName(entity.row_key.clone()))
    }

    /// Write `entity` to a hidden staging file next to its document, so
    /// readers never see a partial document.
    async fn stage(&self, entity: &VisitEntity) -> Result<PathBuf, StoreError> {
        let body = serde_json::to_vec_pretty(entity)?;
        let staging = self
            .dir
            .join(format!(".{}.{}.tmp", entity.row_key, Uuid::new_v4()));

        if let Err(e) = tokio::fs::write(&staging, body).await {
            discard(&staging).await;
            return Err(e.into());
        }
        Ok(staging)
    }
}

async fn discard(staging: &Path) {
    match tokio::fs::remove_file(staging).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove staging file {:?}: {}", staging, e),
    }
}

impl VisitRepository for DocumentVisitStore {
    async fn list(&self) -> Result<Vec<VisitEntity>, StoreError> {
        let mut entities = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let contents = tokio::fs::read_to_string(&path).await?;
            match serde_json::from_str::<VisitEntity>(&contents) {
                Ok(entity) if entity.partition_key == PARTITION_KEY => entities.push(entity),
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable document {:?}: {}", path, e),
            }
        }

        entities.sort_by(|a, b| a.creation_date.cmp(&b.creation_date));
        Ok(entities)
    }

    async fn get(&self, id: &str) -> Result<Option<VisitEntity>, StoreError> {
        let Some(path) = self.document_path(id) else {
            return Ok(None);
        };

        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let entity: VisitEntity = serde_json::from_str(&contents)?;
        Ok((entity.partition_key == PARTITION_KEY).then_some(entity))
    }

    async fn insert(&self, entity: &VisitEntity) -> Result<bool, StoreError> {
        let path = self.writable_path(entity)?;
        let staging = self.stage(entity).await?;

        // Linking fails when the document exists, so an insert never overwrites.
        let linked = tokio::fs::hard_link(&staging, &path).await;
        discard(&staging).await;

        match linked {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn replace(&self, entity: &VisitEntity) -> Result<bool, StoreError> {
        // No document can exist under an unusable id.
        let Some(path) = self.document_path(&entity.row_key) else {
            return Ok(false);
        };
        let _guard = self.write_lock.lock().await;

        if !tokio::fs::try_exists(&path).await? {
            return Ok(false);
        }

        let staging = self.stage(entity).await?;
        if let Err(e) = tokio::fs::rename(&staging, &path).await {
            discard(&staging).await;
            return Err(e.into());
        }
        Ok(true)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let Some(path) = self.document_path(id) else {
            return Ok(false);
        };
        let _guard = self.write_lock.lock().await;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
