//! Profile picture storage on the local filesystem.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use axum::body::Bytes;
use image::io::{Limits, Reader};
use image::ImageFormat;
use tracing::{error, info, warn};
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::{FormErrors, MSG_INVALID_IMAGE};

use crate::extractors::UploadedFile;

/// Subdirectory of the media root holding profile pictures
const PROFILE_PICTURE_DIR: &str = "profile_pictures";

/// URL prefix the media root is served under
pub const MEDIA_URL: &str = "/media";

/// Largest accepted picture width or height, in pixels
pub const MAX_PICTURE_DIMENSION: u32 = 4096;

/// Decoder allocation ceiling for one picture
const MAX_DECODE_BYTES: u64 = 128 * 1024 * 1024;

/// Writes uploads below a root directory and maps stored paths to URLs.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the storage directories if missing.
    pub async fn ensure_dirs(&self) -> AppResult<()> {
        tokio::fs::create_dir_all(self.root.join(PROFILE_PICTURE_DIR))
            .await
            .map_err(|e| AppError::internal(format!("Cannot create media directory: {}", e)))
    }

    /// Confirm an upload is a decodable PNG, JPEG, GIF or WebP image within
    /// the size limits. Decoding runs on the blocking pool.
    pub async fn inspect(&self, file: &UploadedFile) -> Result<ImageFormat, FormErrors> {
        let invalid = || FormErrors::single("profile_picture", MSG_INVALID_IMAGE);

        let format = image::guess_format(&file.bytes).map_err(|_| invalid())?;
        if !matches!(
            format,
            ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Gif | ImageFormat::WebP
        ) {
            return Err(invalid());
        }

        let bytes = file.bytes.clone();
        match tokio::task::spawn_blocking(move || decodes_within_limits(bytes, format)).await {
            Ok(true) => Ok(format),
            Ok(false) => Err(invalid()),
            Err(e) => {
                error!("Image check task failed: {}", e);
                Err(invalid())
            }
        }
    }

    /// Store an inspected upload and return its path relative to the root.
    pub async fn save(&self, file: &UploadedFile, format: ImageFormat) -> AppResult<String> {
        let extension = match format {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Gif => "gif",
            ImageFormat::WebP => "webp",
            other => {
                return Err(AppError::internal(format!(
                    "unsupported image format {:?}",
                    other
                )))
            }
        };

        self.ensure_dirs().await?;
        let relative = format!("{}/{}.{}", PROFILE_PICTURE_DIR, Uuid::new_v4(), extension);
        tokio::fs::write(self.root.join(&relative), &file.bytes)
            .await
            .map_err(|e| AppError::internal(format!("Cannot write upload: {}", e)))?;

        info!(path = %relative, original = %file.file_name, "Stored profile picture");
        Ok(relative)
    }

    /// Delete a stored file. Failures are logged, not returned.
    pub async fn remove(&self, relative: &str) {
        if let Err(e) = tokio::fs::remove_file(self.root.join(relative)).await {
            warn!(path = %relative, "Cannot remove stored upload: {}", e);
        }
    }

    /// Public URL for a stored relative path.
    pub fn url(&self, relative: &str) -> String {
        format!("{}/{}", MEDIA_URL, relative.trim_start_matches('/'))
    }
}

fn decodes_within_limits(bytes: Bytes, format: ImageFormat) -> bool {
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_PICTURE_DIMENSION);
    limits.max_image_height = Some(MAX_PICTURE_DIMENSION);
    limits.max_alloc = Some(MAX_DECODE_BYTES);

    let mut reader = Reader::with_format(Cursor::new(&bytes[..]), format);
    reader.limits(limits);
    reader.decode().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes() -> Vec<u8> {
        png_sized(2, 2)
    }

    fn png_sized(width: u32, height: u32) -> Vec<u8> {
        let image = image::DynamicImage::new_luma8(width, height);
        let mut buffer = Cursor::new(Vec::new());
        image
            .write_to(&mut buffer, image::ImageOutputFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    fn upload(bytes: Vec<u8>) -> UploadedFile {
        UploadedFile {
            file_name: "avatar.png".to_string(),
            bytes: Bytes::from(bytes),
        }
    }

    fn temp_store() -> MediaStore {
        MediaStore::new(std::env::temp_dir().join(format!("portal-media-{}", Uuid::new_v4())))
    }

    #[tokio::test]
    async fn test_inspect_accepts_png() {
        let store = temp_store();
        assert_eq!(
            store.inspect(&upload(png_bytes())).await.unwrap(),
            ImageFormat::Png
        );
    }

    #[tokio::test]
    async fn test_inspect_rejects_text() {
        let store = temp_store();
        let errors = store
            .inspect(&upload(b"definitely not an image".to_vec()))
            .await
            .unwrap_err();
        assert_eq!(
            errors.get("profile_picture"),
            Some(&[MSG_INVALID_IMAGE.to_string()][..])
        );
    }

    #[tokio::test]
    async fn test_inspect_rejects_truncated_png() {
        let store = temp_store();
        let mut bytes = png_bytes();
        bytes.truncate(20);
        assert!(store.inspect(&upload(bytes)).await.is_err());
    }

    #[tokio::test]
    async fn test_inspect_rejects_oversized_dimensions() {
        let store = temp_store();
        let wide = png_sized(MAX_PICTURE_DIMENSION + 1, 1);
        assert!(store.inspect(&upload(wide)).await.is_err());

        let edge = png_sized(MAX_PICTURE_DIMENSION, 1);
        assert!(store.inspect(&upload(edge)).await.is_ok());
    }

    #[tokio::test]
    async fn test_save_writes_under_profile_pictures() {
        let store = temp_store();
        let file = upload(png_bytes());

        let relative = store.save(&file, ImageFormat::Png).await.unwrap();
        assert!(relative.starts_with("profile_pictures/"));
        assert!(relative.ends_with(".png"));
        assert!(store.root().join(&relative).exists());
        assert_eq!(store.url(&relative), format!("/media/{}", relative));

        store.remove(&relative).await;
        assert!(!store.root().join(&relative).exists());

        let _ = std::fs::remove_dir_all(store.root());
    }
}
