use std::fmt;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::lerp_f64;

/// Straight RGB color with channels in `0..=255`.
///
/// Channels are kept as `f64` so interpolated intermediate colors are not quantized.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize)]
pub struct ColorRgb {
    /// Red, `0..=255`.
    pub red: f64,
    /// Green, `0..=255`.
    pub green: f64,
    /// Blue, `0..=255`.
    pub blue: f64,
}

/// Straight RGBA color: channels in `0..=255`, alpha in `0..=1`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ColorRgba {
    /// Red, `0..=255`.
    pub red: f64,
    /// Green, `0..=255`.
    pub green: f64,
    /// Blue, `0..=255`.
    pub blue: f64,
    /// Alpha, `0..=1`.
    pub alpha: f64,
}

impl ColorRgb {
    /// Color from channel values.
    pub fn new(red: f64, green: f64, blue: f64) -> Self {
        Self { red, green, blue }
    }

    /// Parse `#rrggbb` (leading `#` optional).
    pub fn from_hex(s: &str) -> ReelResult<Self> {
        let [r, g, b] = parse_hex_channels::<3>(s)?;
        Ok(Self::new(r, g, b))
    }

    /// Channel-wise linear interpolation.
    pub fn lerp(&self, to: &Self, t: f64) -> Self {
        Self {
            red: lerp_f64(self.red, to.red, t),
            green: lerp_f64(self.green, to.green, t),
            blue: lerp_f64(self.blue, to.blue, t),
        }
    }

    /// Same channels with `alpha` added.
    pub fn with_alpha(self, alpha: f64) -> ColorRgba {
        ColorRgba::new(self.red, self.green, self.blue, alpha)
    }
}

impl ColorRgba {
    /// Color from channel values.
    pub fn new(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Parse `#rrggbb` or `#rrggbbaa`; a missing alpha byte means fully opaque.
    pub fn from_hex(s: &str) -> ReelResult<Self> {
        let digits = s.trim_start_matches('#');
        if digits.len() == 6 {
            return Ok(ColorRgb::from_hex(s)?.with_alpha(1.0));
        }
        let [r, g, b, a] = parse_hex_channels::<4>(s)?;
        Ok(Self::new(r, g, b, a / 255.0))
    }

    /// Channel-wise linear interpolation, alpha included.
    pub fn lerp(&self, to: &Self, t: f64) -> Self {
        Self {
            red: lerp_f64(self.red, to.red, t),
            green: lerp_f64(self.green, to.green, t),
            blue: lerp_f64(self.blue, to.blue, t),
            alpha: lerp_f64(self.alpha, to.alpha, t),
        }
    }

    /// Channels without alpha.
    pub fn rgb(self) -> ColorRgb {
        ColorRgb::new(self.red, self.green, self.blue)
    }

    /// Quantize to straight RGBA8.
    pub fn to_rgba8(self) -> [u8; 4] {
        [
            channel_u8(self.red),
            channel_u8(self.green),
            channel_u8(self.blue),
            (self.alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
        ]
    }
}

impl Default for ColorRgba {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }
}

impl fmt::Display for ColorRgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02x}{:02x}{:02x}",
            channel_u8(self.red),
            channel_u8(self.green),
            channel_u8(self.blue)
        )
    }
}

impl fmt::Display for ColorRgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.to_rgba8();
        write!(f, "#{r:02x}{g:02x}{b:02x}{a:02x}")
    }
}

fn channel_u8(c: f64) -> u8 {
    c.round().clamp(0.0, 255.0) as u8
}

fn parse_hex_channels<const N: usize>(s: &str) -> ReelResult<[f64; N]> {
    let digits = s.trim_start_matches('#');
    if digits.len() != N * 2 || !digits.is_ascii() {
        return Err(ReelError::validation(format!(
            "hex color '{s}' must have {} hex digits",
            N * 2
        )));
    }
    let mut out = [0.0; N];
    for (i, slot) in out.iter_mut().enumerate() {
        let byte = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16)
            .map_err(|e| ReelError::validation(format!("hex color '{s}': {e}")))?;
        *slot = f64::from(byte);
    }
    Ok(out)
}

impl<'de> Deserialize<'de> for ColorRgb {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Hex(String),
            Obj { red: f64, green: f64, blue: f64 },
        }

        match Repr::deserialize(deserializer)? {
            Repr::Hex(s) => Self::from_hex(&s).map_err(serde::de::Error::custom),
            Repr::Obj { red, green, blue } => Ok(Self::new(red, green, blue)),
        }
    }
}

impl<'de> Deserialize<'de> for ColorRgba {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Hex(String),
            Obj {
                red: f64,
                green: f64,
                blue: f64,
                #[serde(default = "one")]
                alpha: f64,
            },
        }

        fn one() -> f64 {
            1.0
        }

        match Repr::deserialize(deserializer)? {
            Repr::Hex(s) => Self::from_hex(&s).map_err(serde::de::Error::custom),
            Repr::Obj {
                red,
                green,
                blue,
                alpha,
            } => Ok(Self::new(red, green, blue, alpha)),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/values/color.rs"]
mod tests;
