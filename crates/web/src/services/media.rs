//! Cover image storage on the local filesystem.
//!
//! Files live below the configured media root and are served at `/media/`.
//! The database only stores the path relative to that root.

use std::path::{Component, Path, PathBuf};

use image::ImageFormat;
use thiserror::Error;
use uuid::Uuid;

/// Largest accepted cover upload.
pub const MAX_COVER_BYTES: usize = 5 * 1024 * 1024;

/// Accepted image types, detected from the file contents, and the extension
/// each is stored with.
const COVER_TYPES: [(ImageFormat, &str); 4] = [
    (ImageFormat::Jpeg, "jpg"),
    (ImageFormat::Png, "png"),
    (ImageFormat::Gif, "gif"),
    (ImageFormat::WebP, "webp"),
];

/// Subdirectory of the media root holding covers.
const COVERS_DIR: &str = "covers";

/// Errors that can occur while storing media.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("unsupported image type: {}", .0.as_deref().unwrap_or("unknown"))]
    UnsupportedType(Option<String>),

    #[error("file is not a readable image: {0}")]
    InvalidImage(#[from] image::ImageError),

    #[error("file is larger than {} MiB", MAX_COVER_BYTES / (1024 * 1024))]
    TooLarge,

    #[error("invalid media path: {0}")]
    InvalidPath(String),

    #[error("media I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes and removes files below the media root.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store an uploaded cover under a fresh name.
    ///
    /// The type is taken from the file contents, never from what the client
    /// claims. Returns the path relative to the media root, e.g.
    /// `covers/<uuid>.png`.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::TooLarge` above 5 MiB, `MediaError::UnsupportedType`
    /// for anything but JPEG, PNG, GIF and WebP, `MediaError::InvalidImage` if
    /// the contents do not decode, and `MediaError::Io` if the file cannot be
    /// written.
    pub async fn save_cover(&self, bytes: &[u8]) -> Result<String, MediaError> {
        if bytes.len() > MAX_COVER_BYTES {
            return Err(MediaError::TooLarge);
        }
        let (format, extension) = cover_format(bytes)?;
        image::load_from_memory_with_format(bytes, format)?;

        let relative = format!("{COVERS_DIR}/{}.{extension}", Uuid::new_v4());
        let dir = self.root.join(COVERS_DIR);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(self.root.join(&relative), bytes).await?;

        tracing::info!(path = %relative, size = bytes.len(), "Stored cover image");
        Ok(relative)
    }

    /// Delete a stored file. A file that is already gone is not an error.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::InvalidPath` for paths escaping the media root and
    /// `MediaError::Io` if removal fails.
    pub async fn remove(&self, relative: &str) -> Result<(), MediaError> {
        let path = Path::new(relative);
        if !path.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(MediaError::InvalidPath(relative.to_owned()));
        }

        match tokio::fs::remove_file(self.root.join(path)).await {
            Ok(()) => {
                tracing::info!(path = %relative, "Removed media file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn cover_format(bytes: &[u8]) -> Result<(ImageFormat, &'static str), MediaError> {
    let kind = infer::get(bytes).ok_or(MediaError::UnsupportedType(None))?;
    let format = ImageFormat::from_mime_type(kind.mime_type())
        .ok_or_else(|| MediaError::UnsupportedType(Some(kind.mime_type().to_owned())))?;

    COVER_TYPES
        .iter()
        .find(|(accepted, _)| *accepted == format)
        .map(|(format, ext)| (*format, *ext))
        .ok_or_else(|| MediaError::UnsupportedType(Some(kind.mime_type().to_owned())))
}
