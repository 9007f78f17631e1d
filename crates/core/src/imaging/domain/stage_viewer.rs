use crate::shared::bitmap::Bitmap;

/// Displays an intermediate processing stage and blocks until the user
/// dismisses it. Opt-in via the CLI; the pipeline always drives one of
/// these so its flow stays the same with viewing on or off.
pub trait StageViewer {
    fn show(&mut self, title: &str, image: &Bitmap) -> Result<(), Box<dyn std::error::Error>>;
}

/// Viewer that discards every stage. Used when interactive display is
/// switched off and in tests.
pub struct NullStageViewer;

impl NullStageViewer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NullStageViewer {
    fn default() -> Self {
        Self::new()
    }
}

impl StageViewer for NullStageViewer {
    fn show(&mut self, _title: &str, _image: &Bitmap) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }
}
