use async_trait::async_trait;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::ports::ShopModeStorePort;
use crate::domain::{
    errors::{DomainError, DomainResult},
    shop::ShopMode,
};

#[derive(Debug, Serialize, Deserialize)]
struct ShopModeFile {
    is_on: bool,
    /// Texto libre; ficheros antiguos lo guardan sin zona horaria.
    #[serde(default)]
    updated: Option<String>,
}

/// Guarda el modo de tienda como `{"is_on": bool, "updated": ...}`.
pub struct JsonShopModeStore {
    path: PathBuf,
}

impl JsonShopModeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ShopModeStorePort for JsonShopModeStore {
    async fn load(&self) -> DomainResult<Option<ShopMode>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(DomainError::Storage(format!("{}: {e}", self.path.display()))),
        };
        let file: ShopModeFile = serde_json::from_slice(&raw)
            .map_err(|e| DomainError::Storage(format!("{}: {e}", self.path.display())))?;
        Ok(Some(ShopMode::from_is_on(file.is_on)))
    }

    async fn save(&self, mode: ShopMode) -> DomainResult<()> {
        let file = ShopModeFile { is_on: mode.is_on(), updated: Some(Local::now().to_rfc3339()) };
        let json = serde_json::to_vec(&file)
            .map_err(|e| DomainError::Storage(e.to_string()))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| DomainError::Storage(format!("{}: {e}", self.path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_and_tolerates_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonShopModeStore::new(tmp.path().join("shop_mode.json"));
        assert_eq!(store.load().await.unwrap(), None);

        store.save(ShopMode::Closed).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(ShopMode::Closed));
    }

    #[tokio::test]
    async fn reads_file_with_naive_timestamp() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("shop_mode.json");
        let saved = br#"{"is_on": true, "updated": "2024-05-01T21:03:11.120394"}"#;
        std::fs::write(&path, saved).unwrap();
        assert_eq!(JsonShopModeStore::new(path).load().await.unwrap(), Some(ShopMode::Closed));
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("shop_mode.json");
        std::fs::write(&path, b"not json").unwrap();
        assert!(JsonShopModeStore::new(path).load().await.is_err());
    }
}
