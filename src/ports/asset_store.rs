use std::path::Path;

use color_eyre::eyre::Result;

/// A file copied into the asset store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    /// Stable reference kept on the owning row, relative to the store root.
    pub reference: String,
    /// False when an identical file was already stored under this reference.
    pub newly_written: bool,
}

/// Port trait for the binary asset store holding series photos.
///
/// Implementations live in `services::media_storage` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AssetStore: Send + Sync {
    /// Copy `source` into the store under `file_name`.
    async fn save(&self, file_name: &str, source: &Path) -> Result<StoredAsset>;

    async fn remove(&self, reference: &str) -> Result<()>;
}
