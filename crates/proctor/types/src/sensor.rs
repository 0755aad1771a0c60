//! Raw sensor sample carriers.
//!
//! Plain data read from the acquired camera/microphone handle once per tick.
//! Interpretation (presence, loudness) belongs to the classifiers in
//! `proctor-monitor`.

use serde::{Deserialize, Serialize};

/// One RGB video frame captured from the camera.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VideoFrame {
    /// Frame width in pixels.
    pub width: u32,

    /// Frame height in pixels.
    pub height: u32,

    /// Packed RGB bytes, row-major, three bytes per pixel.
    pub pixels: Vec<u8>,
}

impl VideoFrame {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), (width * height * 3) as usize);
        Self {
            width,
            height,
            pixels,
        }
    }

    /// RGB value at `(x, y)`, or `None` when out of bounds.
    ///
    /// A coordinate past the buffer's actual length is out of bounds too:
    /// the fields are public and deserializable, so the buffer cannot be
    /// trusted to match `width * height * 3`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<(u8, u8, u8)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y * self.width + x) * 3) as usize;
        let rgb = self.pixels.get(idx..idx + 3)?;
        Some((rgb[0], rgb[1], rgb[2]))
    }

    pub fn pixel_count(&self) -> usize {
        (self.width * self.height) as usize
    }
}

/// Frequency-domain magnitudes read from the shared audio analysis node.
///
/// One value per frequency bin on the node's 0-255 scale.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AudioSpectrum {
    /// Magnitude per bin, 0-255.
    pub bins: Vec<u8>,
}

impl AudioSpectrum {
    pub fn new(bins: Vec<u8>) -> Self {
        Self { bins }
    }

    /// Mean magnitude across all bins; 0.0 for an empty spectrum.
    pub fn mean_magnitude(&self) -> f64 {
        if self.bins.is_empty() {
            return 0.0;
        }
        let sum: u64 = self.bins.iter().map(|&b| u64::from(b)).sum();
        sum as f64 / self.bins.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_lookup() {
        let frame = VideoFrame::new(2, 1, vec![10, 20, 30, 40, 50, 60]);
        assert_eq!(frame.pixel(0, 0), Some((10, 20, 30)));
        assert_eq!(frame.pixel(1, 0), Some((40, 50, 60)));
        assert_eq!(frame.pixel(2, 0), None);
        assert_eq!(frame.pixel(0, 1), None);
    }

    #[test]
    fn test_truncated_buffer_is_out_of_bounds() {
        // Dimensions promise 16 pixels but the buffer holds one; lookups
        // past the buffer return None instead of panicking.
        let frame = VideoFrame {
            width: 4,
            height: 4,
            pixels: vec![10, 20, 30],
        };
        assert_eq!(frame.pixel(0, 0), Some((10, 20, 30)));
        assert_eq!(frame.pixel(1, 0), None);
        assert_eq!(frame.pixel(3, 3), None);
    }

    #[test]
    fn test_mean_magnitude() {
        assert_eq!(AudioSpectrum::new(vec![]).mean_magnitude(), 0.0);
        assert_eq!(AudioSpectrum::new(vec![10, 20, 30]).mean_magnitude(), 20.0);
    }
}
