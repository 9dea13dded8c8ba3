use crate::domain::deposit::generate_trx;
use crate::domain::ports::MediaStore;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Stores uploaded images on local disk and hands back a stable URL path.
///
/// Stands in for the external object-storage collaborator; the rest of the
/// crate only ever sees the returned URL.
pub struct DiskMediaStore {
    root: PathBuf,
    public_base: String,
}

impl DiskMediaStore {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.into(),
        }
    }
}

#[async_trait]
impl MediaStore for DiskMediaStore {
    async fn store_image(&self, filename: &str, bytes: &[u8]) -> Result<String> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| Error::internal(format!("upload {filename} has no extension")))?;
        let name = format!("{}.{}", generate_trx(16), extension.to_ascii_lowercase());

        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&name), bytes).await?;

        Ok(format!(
            "{}/{}",
            self.public_base.trim_end_matches('/'),
            name
        ))
    }
}
