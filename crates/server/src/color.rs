//! RGB colors for cells.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// RGB color used for cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Shift every channel by `delta`, saturating at 0 and 255.
    #[inline]
    pub fn shifted(self, delta: i16) -> Self {
        Self {
            r: shift_channel(self.r, delta),
            g: shift_channel(self.g, delta),
            b: shift_channel(self.b, delta),
        }
    }

    /// Same color with the blue channel replaced.
    #[inline]
    pub fn with_blue(self, b: u8) -> Self {
        Self { b, ..self }
    }

    /// A bright random color (every channel in 50..=255).
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(
            rng.random_range(50..=255),
            rng.random_range(50..=255),
            rng.random_range(50..=255),
        )
    }
}

#[inline]
fn shift_channel(channel: u8, delta: i16) -> u8 {
    (channel as i16 + delta).clamp(0, 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shifted_saturates() {
        let c = Color::new(250, 5, 128).shifted(10);
        assert_eq!(c, Color::new(255, 15, 138));

        let c = Color::new(250, 5, 128).shifted(-10);
        assert_eq!(c, Color::new(240, 0, 118));
    }

    #[test]
    fn with_blue_keeps_red_and_green() {
        assert_eq!(Color::new(230, 60, 10).with_blue(0), Color::new(230, 60, 0));
    }
}
