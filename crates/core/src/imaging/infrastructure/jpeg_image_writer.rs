use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use thiserror::Error;

use crate::imaging::domain::image_writer::ImageWriter;
use crate::shared::bitmap::Bitmap;
use crate::shared::constants::JPEG_QUALITY;

#[derive(Error, Debug)]
pub enum JpegWriteError {
    #[error("Failed to create output file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to encode JPEG: {0}")]
    Encode(#[from] image::ImageError),
    #[error("Unsupported channel count: {0}")]
    UnsupportedChannels(u8),
}

/// Writes bitmaps as baseline JPEG. Grayscale and RGB inputs are
/// encoded as-is, no colorspace conversion.
pub struct JpegImageWriter;

impl JpegImageWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JpegImageWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageWriter for JpegImageWriter {
    fn write(&self, path: &Path, image: &Bitmap) -> Result<(), Box<dyn std::error::Error>> {
        let color = match image.channels() {
            1 => ExtendedColorType::L8,
            3 => ExtendedColorType::Rgb8,
            other => return Err(JpegWriteError::UnsupportedChannels(other).into()),
        };

        let file = File::create(path).map_err(JpegWriteError::Io)?;
        let mut writer = BufWriter::new(file);
        JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY)
            .encode(image.data(), image.width(), image.height(), color)
            .map_err(JpegWriteError::Encode)?;
        writer.flush().map_err(JpegWriteError::Io)?;
        Ok(())
    }
}

// ─────────────────────────────── Tests ───────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_writes_grayscale_jpeg() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.jpg");

        let bitmap = Bitmap::new(vec![128; 8 * 6], 8, 6, 1);
        let writer = JpegImageWriter::new();
        writer.write(&path, &bitmap).unwrap();

        let reopened = image::open(&path).unwrap();
        assert_eq!(reopened.width(), 8);
        assert_eq!(reopened.height(), 6);
    }

    #[test]
    fn test_writes_rgb_jpeg() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.jpg");

        let bitmap = Bitmap::new(vec![200; 5 * 4 * 3], 5, 4, 3);
        let writer = JpegImageWriter::new();
        writer.write(&path, &bitmap).unwrap();

        let reopened = image::open(&path).unwrap();
        assert_eq!(reopened.width(), 5);
        assert_eq!(reopened.height(), 4);
    }

    #[test]
    fn test_rejects_unsupported_channel_count() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.jpg");

        let bitmap = Bitmap::new(vec![0; 2 * 2 * 4], 2, 2, 4);
        let writer = JpegImageWriter::new();
        assert!(writer.write(&path, &bitmap).is_err());
    }

    #[test]
    fn test_missing_parent_directory_is_an_error() {
        let bitmap = Bitmap::new(vec![0; 4], 2, 2, 1);
        let writer = JpegImageWriter::new();
        assert!(writer
            .write(Path::new("/nonexistent/dir/out.jpg"), &bitmap)
            .is_err());
    }
}
