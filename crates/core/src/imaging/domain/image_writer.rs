use std::path::Path;

use crate::shared::bitmap::Bitmap;

/// Encodes a bitmap to disk. Overwrites existing files silently; the
/// parent directory must already exist.
pub trait ImageWriter {
    fn write(&self, path: &Path, image: &Bitmap) -> Result<(), Box<dyn std::error::Error>>;
}
