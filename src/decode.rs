//! Uploaded file decoding.
//!
//! An upload keeps its original encoded bytes (like a data URL of the file); decoding the
//! pixels only proves the file is a readable image and yields its dimensions.

use crate::error::DecodeError;
use crate::model::EncodedImage;
use bytes::Bytes;
use image::ImageFormat;
use std::path::Path;

fn mime_for(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Gif => Some("image/gif"),
        ImageFormat::Bmp => Some("image/bmp"),
        ImageFormat::WebP => Some("image/webp"),
        _ => None,
    }
}

pub(crate) trait FileDecoder {
    async fn decode(&self, path: &Path) -> Result<EncodedImage, DecodeError>;
}

/// Decoder for common still image formats (JPEG, PNG, GIF, BMP, WebP).
pub(crate) struct ImageFileDecoder;

impl FileDecoder for ImageFileDecoder {
    async fn decode(&self, path: &Path) -> Result<EncodedImage, DecodeError> {
        let raw = tokio::fs::read(path).await.map_err(|source| DecodeError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let unsupported = || DecodeError::UnsupportedFormat {
            path: path.to_path_buf(),
        };
        let format = image::guess_format(&raw).map_err(|_| unsupported())?;
        let mime = mime_for(format).ok_or_else(unsupported)?;

        let bytes = Bytes::from(raw);
        let pixels = bytes.clone();
        let decoded = tokio::task::spawn_blocking(move || {
            image::load_from_memory_with_format(&pixels, format)
        })
        .await
        .map_err(|e| DecodeError::Malformed {
            path: path.to_path_buf(),
            reason: format!("decoder task failed: {e}"),
        })?
        .map_err(|e| DecodeError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        tracing::debug!(
            path = %path.display(),
            ?format,
            width = decoded.width(),
            height = decoded.height(),
            "decoded upload"
        );

        Ok(EncodedImage {
            mime,
            bytes,
            width: decoded.width(),
            height: decoded.height(),
        })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::path::PathBuf;

    /// Write a small PNG under the temp dir and return its path.
    pub fn write_png(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("face-scan-{}-{name}", std::process::id()));
        image::RgbImage::from_pixel(5, 4, image::Rgb([90, 60, 30]))
            .save(&path)
            .unwrap();
        path
    }

    pub fn write_bytes(name: &str, bytes: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("face-scan-{}-{name}", std::process::id()));
        std::fs::write(&path, bytes).unwrap();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn decodes_png_and_keeps_original_bytes() {
        let path = fixtures::write_png("decode-ok.png");
        let original = std::fs::read(&path).unwrap();

        let img = ImageFileDecoder.decode(&path).await.unwrap();
        assert_eq!(img.mime, "image/png");
        assert_eq!((img.width, img.height), (5, 4));
        assert_eq!(img.bytes.as_ref(), original.as_slice());
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn text_file_is_unsupported() {
        let path = fixtures::write_bytes("decode-text.txt", b"definitely not an image");
        let err = ImageFileDecoder.decode(&path).await.unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedFormat { .. }));
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn truncated_png_is_malformed() {
        let good = fixtures::write_png("decode-trunc-src.png");
        let raw = std::fs::read(&good).unwrap();
        let path = fixtures::write_bytes("decode-trunc.png", &raw[..raw.len() / 2]);

        let err = ImageFileDecoder.decode(&path).await.unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { .. }));
        let _ = std::fs::remove_file(good);
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let err = ImageFileDecoder
            .decode(Path::new("/nonexistent/face-scan/upload.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, DecodeError::Io { .. }));
    }
}
