use std::path::{Path, PathBuf};

use color_eyre::{Result, eyre::Context};
use sha2::{Digest, Sha256};

use crate::ports::asset_store::{AssetStore, StoredAsset};

/// Directory under the media root where series photos live
pub const SERIES_PHOTO_DIR: &str = "series_photos";

/// Filesystem-backed asset store rooted at the configured media root.
pub struct FsAssetStore {
    root: PathBuf,
}

impl FsAssetStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn resolve(&self, reference: &str) -> PathBuf {
        self.root.join(reference)
    }
}

/// Hex SHA-256 of a file's contents
async fn content_digest(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .context(format!("Failed to read file: {}", path.display()))?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

/// `poster.png` + `3fa9c01` -> `poster_3fa9c01.png`
fn suffixed_name(file_name: &str, suffix: &str) -> String {
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}_{}", stem, suffix),
    }
}

#[async_trait::async_trait]
impl AssetStore for FsAssetStore {
    async fn save(&self, file_name: &str, source: &Path) -> Result<StoredAsset> {
        let file_name = Path::new(file_name)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| color_eyre::eyre::eyre!("Invalid asset file name: {}", file_name))?;

        let dir = self.root.join(SERIES_PHOTO_DIR);
        tokio::fs::create_dir_all(&dir)
            .await
            .context(format!("Failed to create asset directory: {}", dir.display()))?;

        let mut stored_name = file_name.clone();
        if dir.join(&stored_name).exists() {
            let digest = content_digest(source).await?;
            stored_name = suffixed_name(&file_name, &digest[..7]);

            // Same name and same content prefix: already stored
            if dir.join(&stored_name).exists() {
                log::debug!("Asset already stored as: {}", stored_name);
                return Ok(StoredAsset {
                    reference: format!("{}/{}", SERIES_PHOTO_DIR, stored_name),
                    newly_written: false,
                });
            }
        }

        let target = dir.join(&stored_name);
        tokio::fs::copy(source, &target).await.context(format!(
            "Failed to copy {} to {}",
            source.display(),
            target.display()
        ))?;

        let reference = format!("{}/{}", SERIES_PHOTO_DIR, stored_name);
        log::info!("Stored asset: {}", reference);
        Ok(StoredAsset {
            reference,
            newly_written: true,
        })
    }

    async fn remove(&self, reference: &str) -> Result<()> {
        let path = self.resolve(reference);
        tokio::fs::remove_file(&path)
            .await
            .context(format!("Failed to remove asset: {}", path.display()))?;
        log::debug!("Removed asset: {}", reference);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffixed_name() {
        assert_eq!(suffixed_name("poster.png", "3fa9c01"), "poster_3fa9c01.png");
        assert_eq!(suffixed_name("poster", "3fa9c01"), "poster_3fa9c01");
    }

    #[tokio::test]
    async fn test_save_copies_into_photo_dir() {
        let media = tempfile::tempdir().unwrap();
        let src_dir = tempfile::tempdir().unwrap();
        let source = src_dir.path().join("poster.png");
        std::fs::write(&source, b"png-bytes").unwrap();

        let store = FsAssetStore::new(media.path().to_path_buf());
        let stored = store.save("poster.png", &source).await.unwrap();

        assert_eq!(stored.reference, "series_photos/poster.png");
        assert!(stored.newly_written);
        assert_eq!(
            std::fs::read(store.resolve(&stored.reference)).unwrap(),
            b"png-bytes"
        );
    }

    #[tokio::test]
    async fn test_save_name_taken_gets_digest_suffix() {
        let media = tempfile::tempdir().unwrap();
        let src_dir = tempfile::tempdir().unwrap();
        let first = src_dir.path().join("a.png");
        let second = src_dir.path().join("b.png");
        std::fs::write(&first, b"first").unwrap();
        std::fs::write(&second, b"second").unwrap();

        let store = FsAssetStore::new(media.path().to_path_buf());
        store.save("poster.png", &first).await.unwrap();
        let stored = store.save("poster.png", &second).await.unwrap();

        let digest = format!("{:x}", Sha256::digest(b"second"));
        assert_eq!(
            stored.reference,
            format!("series_photos/poster_{}.png", &digest[..7])
        );
        assert!(stored.newly_written);

        // Saving the same content again reuses the suffixed file
        let again = store.save("poster.png", &second).await.unwrap();
        assert_eq!(again.reference, stored.reference);
        assert!(!again.newly_written);
    }

    #[tokio::test]
    async fn test_remove() {
        let media = tempfile::tempdir().unwrap();
        let src_dir = tempfile::tempdir().unwrap();
        let source = src_dir.path().join("poster.png");
        std::fs::write(&source, b"png-bytes").unwrap();

        let store = FsAssetStore::new(media.path().to_path_buf());
        let stored = store.save("poster.png", &source).await.unwrap();
        store.remove(&stored.reference).await.unwrap();

        assert!(!store.resolve(&stored.reference).exists());
    }
}
