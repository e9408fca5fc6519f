use crate::foundation::error::{ReelError, ReelResult};

pub use kurbo::{BezPath, Point, Rect, Vec2};

/// Frame number. Absolute, composition-relative and clip-relative frames all share this type;
/// clip-relative frames may be negative before the clip's placement.
pub type Frame = i64;

/// Half-open range of frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameRange {
    /// First frame.
    pub start: Frame,
    /// One past the last frame.
    pub end: Frame,
}

impl FrameRange {
    /// Range `start..end`; fails when `start > end`.
    pub fn new(start: Frame, end: Frame) -> ReelResult<Self> {
        if start > end {
            return Err(ReelError::validation("FrameRange start must be <= end"));
        }
        Ok(Self { start, end })
    }

    /// Number of frames; `0` for inverted ranges.
    pub fn len_frames(self) -> u64 {
        (i128::from(self.end) - i128::from(self.start)).max(0) as u64
    }

    /// Whether the range holds no frames.
    pub fn is_empty(self) -> bool {
        self.start >= self.end
    }

    /// Whether `f` lies in the range.
    pub fn contains(self, f: Frame) -> bool {
        self.start <= f && f < self.end
    }
}

/// Frame rate as a rational `num / den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator.
    pub num: u32,
    /// Denominator, never zero.
    pub den: u32,
}

impl Fps {
    /// Fails when either part is zero.
    pub fn new(num: u32, den: u32) -> ReelResult<Self> {
        if den == 0 {
            return Err(ReelError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(ReelError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Whole-number frame rate, e.g. `Fps::whole(30)`.
    pub fn whole(num: u32) -> ReelResult<Self> {
        Self::new(num, 1)
    }

    /// Frames per second.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Seconds per frame.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Seconds spanned by `frames`.
    pub fn frames_to_secs(self, frames: Frame) -> f64 {
        (frames as f64) * self.frame_duration_secs()
    }

    /// Whole frames elapsed after `secs`.
    pub fn secs_to_frames_floor(self, secs: f64) -> Frame {
        (secs * self.as_f64()).floor() as Frame
    }

    /// Audio samples covered by one frame at `sampling_rate`, rounded up.
    pub fn samples_per_frame(self, sampling_rate: u32) -> usize {
        let n = u64::from(sampling_rate) * u64::from(self.den);
        n.div_ceil(u64::from(self.num)) as usize
    }
}

/// Pixel dimensions of a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// `width * height`.
    pub fn pixel_count(self) -> usize {
        (self.width as usize) * (self.height as usize)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
