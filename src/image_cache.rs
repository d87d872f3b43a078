use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tracing::{debug, warn};

use crate::asset::AssetRecord;
use crate::error::Result;
use crate::market::ImageApi;

pub const IMAGE_FOLDER_NAME: &str = "asset_images";

/// Asset icons stored on disk by asset id, downloaded on first use.
pub struct ImageCache {
    api: Arc<dyn ImageApi>,
    folder: PathBuf,
}

impl ImageCache {
    pub fn new(api: Arc<dyn ImageApi>, data_dir: &Path) -> Self {
        Self {
            api,
            folder: data_dir.join(IMAGE_FOLDER_NAME),
        }
    }

    /// One flat file per id. Bytes outside `[A-Za-z0-9_-]` are percent-encoded,
    /// `%` included, so distinct ids never share a file.
    pub fn image_path(&self, asset_id: &str) -> PathBuf {
        let mut file_name = String::with_capacity(asset_id.len());
        for byte in asset_id.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
                file_name.push(byte as char);
            } else {
                file_name.push_str(&format!("%{byte:02X}"));
            }
        }
        self.folder.join(file_name)
    }

    pub async fn load(&self, asset: &AssetRecord) -> Result<Vec<u8>> {
        let path = self.image_path(&asset.id);

        match fs::read(&path).await {
            Ok(bytes) => {
                debug!("Image cache hit for {}", asset.id);
                return Ok(bytes);
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => warn!("Failed reading cached image {} : {err}", path.display()),
        }

        let bytes = self.api.get_image(&asset.icon_url).await?;
        if let Err(err) = self.save(&path, &bytes).await {
            warn!("Failed caching image {} : {err}", path.display());
        }
        Ok(bytes)
    }

    async fn save(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        fs::create_dir_all(&self.folder).await?;
        fs::write(path, bytes).await
    }
}
