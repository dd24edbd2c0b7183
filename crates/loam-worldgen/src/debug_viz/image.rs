//! Row-major RGBA pixel buffer.

use hashbrown::HashSet;

/// Opaque color.
pub type Rgb = (u8, u8, u8);

/// A debug render, stored as row-major RGBA with row 0 at the top.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DebugImage {
    pub width: u32,
    pub height: u32,
    /// `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}

impl DebugImage {
    /// Fully transparent image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width * height * 4) as usize],
        }
    }

    /// Image filled with one opaque color.
    pub fn filled(width: u32, height: u32, color: Rgb) -> Self {
        let (r, g, b) = color;
        Self {
            width,
            height,
            pixels: [r, g, b, 255].repeat((width * height) as usize),
        }
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        ((y * self.width + x) * 4) as usize
    }

    /// Write an opaque pixel.
    ///
    /// # Panics
    ///
    /// Panics if the pixel is outside the image.
    pub fn set(&mut self, x: u32, y: u32, color: Rgb) {
        let i = self.offset(x, y);
        self.pixels[i..i + 4].copy_from_slice(&[color.0, color.1, color.2, 255]);
    }

    /// Mix `color` into a pixel with weight `alpha` in `[0, 1]`.
    pub fn blend(&mut self, x: u32, y: u32, color: Rgb, alpha: f32) {
        let i = self.offset(x, y);
        let a = alpha.clamp(0.0, 1.0);
        for (channel, target) in self.pixels[i..i + 3].iter_mut().zip([color.0, color.1, color.2]) {
            *channel = (*channel as f32 * (1.0 - a) + target as f32 * a).round() as u8;
        }
        self.pixels[i + 3] = 255;
    }

    /// RGBA of a pixel.
    pub fn get(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.offset(x, y);
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of distinct colors, ignoring alpha.
    pub fn unique_color_count(&self) -> usize {
        self.pixels
            .chunks_exact(4)
            .map(|p| (p[0], p[1], p[2]))
            .collect::<HashSet<_>>()
            .len()
    }

    /// Raw RGBA bytes, for handing to an encoder.
    pub fn into_raw(self) -> Vec<u8> {
        self.pixels
    }
}
