//! Filesystem-level image storage with content-hash naming.
//!
//! Uploaded images are written unchanged under `{root}/interiors/` as
//! `{hash}_{stem}.{ext}`, where `hash` is the first 16 hex chars of the
//! SHA-256 of the content. Records keep the path relative to `root`; the
//! public URL is that path under the configured URL prefix.

use std::path::{Path, PathBuf};

use interiors_core::{Error, Result};
use sha2::{Digest, Sha256};

/// Directory under the media root that holds interior images.
const UPLOAD_DIR: &str = "interiors";

/// Longest filename stem kept in a stored filename.
const MAX_STEM_LEN: usize = 64;

/// Message shown when an upload does not decode as an image.
pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// Metadata about a stored image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Content hash (first 16 hex chars of SHA-256).
    pub hash: String,
    /// Width of the image in pixels.
    pub width: u32,
    /// Height of the image in pixels.
    pub height: u32,
    /// Path relative to the media root.
    pub path: String,
    /// Whether this call created the file (false when identical content
    /// was already stored under the same name).
    pub created: bool,
}

/// Filesystem manager for uploaded images.
#[derive(Debug, Clone)]
pub struct ImageStorage {
    root: PathBuf,
    url_prefix: String,
}

impl ImageStorage {
    /// Create a new `ImageStorage` rooted at `root`, served under `url_prefix`.
    pub fn new(root: PathBuf, url_prefix: impl Into<String>) -> Self {
        Self {
            root,
            url_prefix: url_prefix.into(),
        }
    }

    /// The media root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate and store image data.
    ///
    /// The content must decode as an image; the bytes are stored as sent.
    pub fn store(&self, original_filename: &str, data: &[u8]) -> Result<StoredImage> {
        let format =
            image::guess_format(data).map_err(|_| Error::Validation(INVALID_IMAGE.into()))?;
        let img = image::load_from_memory_with_format(data, format)
            .map_err(|_| Error::Validation(INVALID_IMAGE.into()))?;

        let hash = compute_hash(data);
        let extension = format
            .extensions_str()
            .first()
            .copied()
            .unwrap_or("img");
        let filename = format_filename(&hash, original_filename, extension);
        let relative_path = format!("{UPLOAD_DIR}/{filename}");

        let dir = self.root.join(UPLOAD_DIR);
        std::fs::create_dir_all(&dir)
            .map_err(|e| Error::storage(UPLOAD_DIR, format!("Failed to create directory: {e}")))?;

        let file_path = dir.join(&filename);
        let created = !file_path.exists();
        if created {
            std::fs::write(&file_path, data)
                .map_err(|e| Error::storage(&relative_path, format!("Failed to write file: {e}")))?;
        }

        Ok(StoredImage {
            hash,
            width: img.width(),
            height: img.height(),
            path: relative_path,
            created,
        })
    }

    /// Absolute filesystem path of a stored relative path.
    pub fn get_path(&self, relative_path: &str) -> PathBuf {
        self.root.join(relative_path)
    }

    /// Public URL of a stored relative path.
    pub fn url(&self, relative_path: &str) -> String {
        format!("{}/{}", self.url_prefix.trim_end_matches('/'), relative_path)
    }

    /// Delete a stored file. Missing files are not an error.
    pub fn delete(&self, relative_path: &str) -> Result<()> {
        let path = self.get_path(relative_path);
        if path.exists() {
            std::fs::remove_file(&path)
                .map_err(|e| Error::storage(relative_path, format!("Failed to delete file: {e}")))?;
        }
        Ok(())
    }
}

/// Compute the content hash for image data.
///
/// Returns the first 16 hex characters of the SHA-256 digest.
fn compute_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    hex::encode(&digest[..8]) // 8 bytes = 16 hex chars
}

/// Format the stored filename from the hash and a sanitized original stem.
fn format_filename(hash: &str, original_filename: &str, extension: &str) -> String {
    let base = interiors_core::naming::base_filename(original_filename);
    let stem = interiors_core::naming::strip_extension(base);
    let safe: String = stem
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .take(MAX_STEM_LEN)
        .collect::<String>()
        .to_ascii_lowercase();

    if safe.is_empty() {
        format!("{hash}.{extension}")
    } else {
        format!("{hash}_{safe}.{extension}")
    }
}
