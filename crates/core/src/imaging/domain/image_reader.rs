use std::path::Path;

use crate::shared::bitmap::Bitmap;

/// Decodes a still image from disk into an RGB bitmap.
pub trait ImageReader {
    fn read(&self, path: &Path) -> Result<Bitmap, Box<dyn std::error::Error>>;
}
