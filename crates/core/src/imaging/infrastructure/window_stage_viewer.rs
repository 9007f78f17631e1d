use std::time::Duration;

use minifb::{KeyRepeat, Window, WindowOptions};
use thiserror::Error;

use crate::imaging::domain::stage_viewer::StageViewer;
use crate::shared::bitmap::Bitmap;

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Failed to open stage window: {0}")]
    Window(#[from] minifb::Error),
    #[error("Unsupported channel count: {0}")]
    UnsupportedChannels(u8),
}

/// Shows each stage in its own window and waits for any key press (or
/// the window being closed) before returning control to the pipeline.
pub struct WindowStageViewer;

impl WindowStageViewer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WindowStageViewer {
    fn default() -> Self {
        Self::new()
    }
}

fn pack_argb(image: &Bitmap) -> Result<Vec<u32>, ViewerError> {
    let pixels = (image.width() * image.height()) as usize;
    let mut buffer = Vec::with_capacity(pixels);
    match image.channels() {
        1 => {
            for &v in image.data() {
                let v = v as u32;
                buffer.push((v << 16) | (v << 8) | v);
            }
        }
        3 => {
            for px in image.data().chunks_exact(3) {
                buffer.push(((px[0] as u32) << 16) | ((px[1] as u32) << 8) | px[2] as u32);
            }
        }
        other => return Err(ViewerError::UnsupportedChannels(other)),
    }
    Ok(buffer)
}

impl StageViewer for WindowStageViewer {
    fn show(&mut self, title: &str, image: &Bitmap) -> Result<(), Box<dyn std::error::Error>> {
        let buffer = pack_argb(image)?;
        let width = image.width() as usize;
        let height = image.height() as usize;

        let mut window = Window::new(
            title,
            width,
            height,
            WindowOptions {
                resize: true,
                ..WindowOptions::default()
            },
        )
        .map_err(ViewerError::Window)?;
        window.limit_update_rate(Some(Duration::from_micros(16_600)));

        while window.is_open() {
            window
                .update_with_buffer(&buffer, width, height)
                .map_err(ViewerError::Window)?;
            if !window.get_keys_pressed(KeyRepeat::No).is_empty() {
                break;
            }
        }
        Ok(())
    }
}
