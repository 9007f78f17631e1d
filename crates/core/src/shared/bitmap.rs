use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};

/// An owned pixel buffer: contiguous row-major bytes, 3 channels (RGB)
/// or 1 channel (grayscale).
///
/// Format conversion happens at I/O boundaries only; each pipeline
/// stage exclusively owns the bitmap it is working on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
}

impl Bitmap {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Byte slice of the pixel at `(x, y)`, `channels` bytes long.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        debug_assert!(x < self.width && y < self.height);
        let c = self.channels as usize;
        let idx = (y as usize * self.width as usize + x as usize) * c;
        &self.data[idx..idx + c]
    }

    /// Grayscale view of the pixel data (BT.601 luma for RGB input).
    pub fn luma_pixels(&self) -> Vec<u8> {
        if self.channels == 1 {
            return self.data.clone();
        }
        self.data
            .chunks_exact(3)
            .map(|px| {
                let r = px[0] as u32;
                let g = px[1] as u32;
                let b = px[2] as u32;
                ((299 * r + 587 * g + 114 * b + 500) / 1000) as u8
            })
            .collect()
    }

    /// Single-channel 8-bit copy of this bitmap.
    pub fn to_grayscale(&self) -> Bitmap {
        Bitmap::new(self.luma_pixels(), self.width, self.height, 1)
    }

    /// Copy of the sub-region with INCLUSIVE corners, dlib rectangle
    /// semantics: the result is `(right - left + 1)` pixels wide.
    ///
    /// The corners must lie inside the bitmap.
    pub fn crop(&self, left: u32, top: u32, right: u32, bottom: u32) -> Bitmap {
        debug_assert!(left <= right && right < self.width);
        debug_assert!(top <= bottom && bottom < self.height);
        let out_w = (right - left + 1) as usize;
        let out_h = (bottom - top + 1) as usize;
        let c = self.channels as usize;
        let stride = self.width as usize * c;

        let mut data = Vec::with_capacity(out_w * out_h * c);
        for row in top as usize..=bottom as usize {
            let start = row * stride + left as usize * c;
            data.extend_from_slice(&self.data[start..start + out_w * c]);
        }
        Bitmap::new(data, out_w as u32, out_h as u32, self.channels)
    }

    /// Bicubic (Catmull-Rom) resample to the given dimensions.
    pub fn resize(&self, width: u32, height: u32) -> Bitmap {
        if width == self.width && height == self.height {
            return self.clone();
        }
        match self.channels {
            1 => {
                let img = GrayImage::from_raw(self.width, self.height, self.data.clone())
                    .expect("bitmap data length must match dimensions");
                let resized = imageops::resize(&img, width, height, FilterType::CatmullRom);
                Bitmap::new(resized.into_raw(), width, height, 1)
            }
            _ => {
                let img = RgbImage::from_raw(self.width, self.height, self.data.clone())
                    .expect("bitmap data length must match dimensions");
                let resized = imageops::resize(&img, width, height, FilterType::CatmullRom);
                Bitmap::new(resized.into_raw(), width, height, 3)
            }
        }
    }

    /// Paint the four edges of a rectangle (inclusive corners) onto an
    /// RGB bitmap. Edges falling outside the bitmap are clipped.
    pub fn draw_rect_outline(&mut self, left: i32, top: i32, right: i32, bottom: i32, color: [u8; 3]) {
        debug_assert_eq!(self.channels, 3, "outline drawing requires an RGB bitmap");
        for x in left..=right {
            self.set_pixel(x, top, color);
            self.set_pixel(x, bottom, color);
        }
        for y in top..=bottom {
            self.set_pixel(left, y, color);
            self.set_pixel(right, y, color);
        }
    }

    fn set_pixel(&mut self, x: i32, y: i32, color: [u8; 3]) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        self.data[idx..idx + 3].copy_from_slice(&color);
    }
}
