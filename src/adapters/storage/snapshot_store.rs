use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::application::ports::SnapshotStorePort;
use crate::domain::{
    errors::{DomainError, DomainResult},
    snapshot::{sanitize_filename, StoredSnapshot},
};

/// Carpeta plana servida bajo `/uploads/`.
pub struct FsSnapshotStore {
    dir: PathBuf,
    url_prefix: String,
}

impl FsSnapshotStore {
    pub async fn open(dir: impl Into<PathBuf>) -> DomainResult<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| DomainError::Storage(format!("{}: {e}", dir.display())))?;
        Ok(Self { dir, url_prefix: "/uploads".into() })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl SnapshotStorePort for FsSnapshotStore {
    async fn write(&self, file_name: &str, bytes: &[u8]) -> DomainResult<StoredSnapshot> {
        let name = sanitize_filename(file_name);
        let file_path = self.dir.join(&name);
        tokio::fs::write(&file_path, bytes)
            .await
            .map_err(|e| DomainError::Storage(format!("{}: {e}", file_path.display())))?;
        Ok(StoredSnapshot { public_url: format!("{}/{}", self.url_prefix, name), file_path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_inside_dir_even_for_hostile_names() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsSnapshotStore::open(tmp.path().join("uploads")).await.unwrap();
        let s = store.write("../../escape.jpg", b"jpeg").await.unwrap();
        assert_eq!(s.public_url, "/uploads/escape.jpg");
        assert_eq!(s.file_path, store.dir().join("escape.jpg"));
        assert_eq!(std::fs::read(&s.file_path).unwrap(), b"jpeg");
    }
}
