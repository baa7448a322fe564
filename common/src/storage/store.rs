use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::{path::Path as ObjPath, ObjectStore};

use crate::utils::config::{AppConfig, StorageKind};

pub type DynStore = Arc<dyn ObjectStore>;

/// Storage manager wrapping the configured object store backend.
///
/// User-scoped objects (avatars) live under a `{user_id}/...` prefix so that
/// account deletion can drop everything a user owns in one sweep.
#[derive(Clone)]
pub struct StorageManager {
    store: DynStore,
    backend_kind: StorageKind,
}

impl StorageManager {
    /// Create a new StorageManager with the specified configuration.
    pub async fn new(cfg: &AppConfig) -> object_store::Result<Self> {
        let backend_kind = cfg.storage.clone();
        let store = create_storage_backend(cfg)?;

        Ok(Self {
            store,
            backend_kind,
        })
    }

    /// Create a StorageManager with a custom storage backend.
    ///
    /// Useful for testing scenarios where you want to inject a specific backend.
    pub fn with_backend(store: DynStore, backend_kind: StorageKind) -> Self {
        Self {
            store,
            backend_kind,
        }
    }

    /// Get the storage backend kind.
    pub fn backend_kind(&self) -> &StorageKind {
        &self.backend_kind
    }

    /// Store bytes at the specified location.
    pub async fn put(&self, location: &str, data: Bytes) -> object_store::Result<()> {
        let path = ObjPath::from(location);
        let payload = object_store::PutPayload::from_bytes(data);
        self.store.put(&path, payload).await.map(|_| ())
    }

    /// Retrieve bytes from the specified location, fully buffered.
    pub async fn get(&self, location: &str) -> object_store::Result<Bytes> {
        let path = ObjPath::from(location);
        let result = self.store.get(&path).await?;
        result.bytes().await
    }

    /// Get a streaming handle for large objects.
    pub async fn get_stream(
        &self,
        location: &str,
    ) -> object_store::Result<BoxStream<'static, object_store::Result<Bytes>>> {
        let path = ObjPath::from(location);
        let result = self.store.get(&path).await?;
        Ok(result.into_stream())
    }

    /// Delete all objects below the specified prefix.
    pub async fn delete_prefix(&self, prefix: &str) -> object_store::Result<()> {
        let prefix_path = ObjPath::from(prefix);
        let locations = self
            .store
            .list(Some(&prefix_path))
            .map_ok(|m| m.location)
            .boxed();
        self.store
            .delete_stream(locations)
            .try_collect::<Vec<_>>()
            .await?;

        Ok(())
    }

    /// List all objects below the specified prefix.
    pub async fn list(
        &self,
        prefix: Option<&str>,
    ) -> object_store::Result<Vec<object_store::ObjectMeta>> {
        let prefix_path = prefix.map(ObjPath::from);
        self.store.list(prefix_path.as_ref()).try_collect().await
    }

    /// Check if an object exists at the specified location.
    pub async fn exists(&self, location: &str) -> object_store::Result<bool> {
        let path = ObjPath::from(location);
        match self.store.head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

fn create_storage_backend(cfg: &AppConfig) -> object_store::Result<DynStore> {
    match cfg.storage {
        StorageKind::Local => {
            let base = PathBuf::from(&cfg.data_dir).join("files");
            std::fs::create_dir_all(&base).map_err(|source| object_store::Error::Generic {
                store: "LocalFileSystem",
                source: Box::new(source),
            })?;
            let store = LocalFileSystem::new_with_prefix(base)?;
            Ok(Arc::new(store))
        }
        StorageKind::Memory => Ok(Arc::new(InMemory::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_manager() -> StorageManager {
        StorageManager::with_backend(Arc::new(InMemory::new()), StorageKind::Memory)
    }

    #[tokio::test]
    async fn put_get_roundtrip() {
        let storage = memory_manager();
        let payload = Bytes::from_static(b"avatar bytes");

        storage
            .put("user-1/avatar/a.png", payload.clone())
            .await
            .expect("Failed to put object");

        let fetched = storage
            .get("user-1/avatar/a.png")
            .await
            .expect("Failed to get object");
        assert_eq!(fetched, payload);

        assert!(storage
            .exists("user-1/avatar/a.png")
            .await
            .expect("Failed head"));
        assert!(!storage
            .exists("user-1/avatar/missing.png")
            .await
            .expect("Failed head"));
    }

    #[tokio::test]
    async fn delete_prefix_removes_all_user_objects() {
        let storage = memory_manager();

        storage
            .put("user-1/avatar/a.png", Bytes::from_static(b"a"))
            .await
            .expect("Failed to put");
        storage
            .put("user-1/avatar/b.png", Bytes::from_static(b"b"))
            .await
            .expect("Failed to put");
        storage
            .put("user-2/avatar/c.png", Bytes::from_static(b"c"))
            .await
            .expect("Failed to put");

        storage
            .delete_prefix("user-1")
            .await
            .expect("Failed to delete prefix");

        let remaining = storage.list(None).await.expect("Failed to list");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].location.as_ref(), "user-2/avatar/c.png");
    }

    #[tokio::test]
    async fn local_backend_creates_base_directory() {
        let dir = tempfile::tempdir().expect("Failed to create tempdir");
        let cfg = AppConfig {
            data_dir: dir.path().to_string_lossy().into_owned(),
            storage: StorageKind::Local,
            ..AppConfig::default()
        };

        let storage = StorageManager::new(&cfg)
            .await
            .expect("Failed to build local storage");
        assert_eq!(storage.backend_kind(), &StorageKind::Local);
        assert!(dir.path().join("files").is_dir());
    }
}
