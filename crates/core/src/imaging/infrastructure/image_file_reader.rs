use std::path::Path;

use crate::imaging::domain::image_reader::ImageReader;
use crate::shared::bitmap::Bitmap;

/// Reader backed by the `image` crate. Any format the crate can decode
/// is accepted; pixels are normalized to interleaved 8-bit RGB.
pub struct ImageFileReader;

impl ImageFileReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageReader for ImageFileReader {
    fn read(&self, path: &Path) -> Result<Bitmap, Box<dyn std::error::Error>> {
        let decoded = image::open(path)?.to_rgb8();
        let (width, height) = decoded.dimensions();
        Ok(Bitmap::new(decoded.into_raw(), width, height, 3))
    }
}

// ─────────────────────────────── Tests ───────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    #[test]
    fn test_reads_png_as_rgb_bitmap() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sample.png");

        let mut img = RgbImage::new(4, 3);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(3, 2, Rgb([0, 0, 255]));
        img.save(&path).unwrap();

        let reader = ImageFileReader::new();
        let bitmap = reader.read(&path).unwrap();

        assert_eq!(bitmap.width(), 4);
        assert_eq!(bitmap.height(), 3);
        assert_eq!(bitmap.channels(), 3);
        assert_eq!(bitmap.pixel(0, 0), &[255, 0, 0]);
        assert_eq!(bitmap.pixel(3, 2), &[0, 0, 255]);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let reader = ImageFileReader::new();
        assert!(reader.read(Path::new("/nonexistent/image.png")).is_err());
    }
}
