//! Uploaded organization avatars, stored on local disk.

use async_trait::async_trait;
use image::ImageFormat;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use std::{io::ErrorKind, path::PathBuf};
use tracing::{debug, instrument};

use crate::settings::{
    RegistryError,
    registry::{AvatarStore, RegistryResult},
    types::{AvatarForm, AvatarSource, Organization},
};

const ACCEPTED_FORMATS: [ImageFormat; 4] = [
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// Writes `{dir}/{org_id}` and records a content digest on the account row.
pub struct DiskAvatars {
    pool: PgPool,
    dir: PathBuf,
    max_bytes: usize,
}

impl DiskAvatars {
    #[must_use]
    pub fn new(pool: PgPool, dir: PathBuf, max_bytes: usize) -> Self {
        Self {
            pool,
            dir,
            max_bytes,
        }
    }

    fn path_for(&self, org: &Organization) -> PathBuf {
        self.dir.join(org.id.to_string())
    }
}

/// Rejects empty, oversized, and non-image uploads.
fn check_upload(content: &[u8], max_bytes: usize) -> RegistryResult<ImageFormat> {
    if content.is_empty() {
        return Err(RegistryError::Avatar("empty upload".to_string()));
    }
    if content.len() > max_bytes {
        return Err(RegistryError::Avatar(format!(
            "avatar is larger than {max_bytes} bytes"
        )));
    }
    match image::guess_format(content) {
        Ok(format) if ACCEPTED_FORMATS.contains(&format) => Ok(format),
        _ => Err(RegistryError::Avatar("unsupported image format".to_string())),
    }
}

#[async_trait]
impl AvatarStore for DiskAvatars {
    #[instrument(skip(self, org, form), fields(org = %org.name, bytes = form.content.len()))]
    async fn update_avatar(&self, org: &Organization, form: &AvatarForm) -> RegistryResult<()> {
        if form.source != AvatarSource::Local {
            return Err(RegistryError::Avatar(
                "only uploaded avatars are supported".to_string(),
            ));
        }
        let format = check_upload(&form.content, self.max_bytes)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.path_for(org), &form.content).await?;

        let digest = hex::encode(Sha256::digest(&form.content));
        sqlx::query(
            r"
            UPDATE accounts
            SET avatar = $2, use_custom_avatar = TRUE, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(org.id)
        .bind(&digest)
        .execute(&self.pool)
        .await?;

        debug!(format = ?format, "avatar stored");
        Ok(())
    }

    async fn delete_avatar(&self, org: &Organization) -> RegistryResult<()> {
        match tokio::fs::remove_file(self.path_for(org)).await {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }

        sqlx::query(
            r"
            UPDATE accounts
            SET avatar = NULL, use_custom_avatar = FALSE, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(org.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn accepts_known_image_formats() {
        assert!(matches!(check_upload(PNG_MAGIC, 1024), Ok(ImageFormat::Png)));
        assert!(matches!(
            check_upload(b"GIF89a\x01\0\x01\0", 1024),
            Ok(ImageFormat::Gif)
        ));
    }

    #[test]
    fn rejects_empty_large_and_unknown_uploads() {
        assert!(matches!(check_upload(b"", 1024), Err(RegistryError::Avatar(_))));
        assert!(matches!(check_upload(PNG_MAGIC, 4), Err(RegistryError::Avatar(_))));
        assert!(matches!(
            check_upload(b"plain text, not an image", 1024),
            Err(RegistryError::Avatar(_))
        ));
    }
}
