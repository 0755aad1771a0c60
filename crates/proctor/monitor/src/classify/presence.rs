//! Face-presence heuristic.
//!
//! Downsamples the frame and measures the fraction of pixels inside an
//! empirically chosen skin-tone envelope. A fraction inside the configured
//! band means a face-like region is plausibly visible. This is a presence
//! proxy: it cannot count distinct faces or verify identity.

use proctor_types::VideoFrame;
use tracing::trace;

use crate::config::PresenceConfig;

/// Verdict of the presence classifier for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Presence {
    Present,
    Absent,
}

/// Classifies frames by skin-tone pixel fraction.
pub struct PresenceClassifier {
    config: PresenceConfig,
}

impl PresenceClassifier {
    pub fn new(config: PresenceConfig) -> Self {
        Self { config }
    }

    /// Classify one frame.
    ///
    /// The lower band edge rejects frames with no visible face-colored
    /// region; the upper edge rejects frames dominated by a single
    /// skin-toned surface (camera blocked by a hand, miscalibrated light).
    pub fn classify(&self, frame: &VideoFrame) -> Presence {
        let fraction = self.skin_fraction(frame);
        trace!(fraction, "Presence sample");

        if fraction >= self.config.min_skin_fraction && fraction <= self.config.max_skin_fraction {
            Presence::Present
        } else {
            Presence::Absent
        }
    }

    /// Fraction of sampled pixels falling inside the skin-tone envelope.
    fn skin_fraction(&self, frame: &VideoFrame) -> f64 {
        let stride = self.config.sample_stride;
        let mut sampled = 0u64;
        let mut skin = 0u64;

        let mut y = 0;
        while y < frame.height {
            let mut x = 0;
            while x < frame.width {
                if let Some((r, g, b)) = frame.pixel(x, y) {
                    sampled += 1;
                    if is_skin_tone(r, g, b) {
                        skin += 1;
                    }
                }
                x += stride;
            }
            y += stride;
        }

        if sampled == 0 {
            return 0.0;
        }
        skin as f64 / sampled as f64
    }
}

/// Empirical skin-tone envelope: r>95, g>40, b>20, channel spread >15,
/// red dominant over green and blue.
fn is_skin_tone(r: u8, g: u8, b: u8) -> bool {
    let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);

    r > 95 && g > 40 && b > 20 && (max - min) > 15 && r > g && r > b
}
