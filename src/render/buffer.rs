use std::sync::{Arc, Mutex};

use kurbo::Rect;

use crate::{
    foundation::{
        core::Canvas,
        error::{ReelError, ReelResult},
        math::mul_div255_u8,
    },
    values::color::ColorRgba,
};

/// One premultiplied RGBA8 pixel.
pub type PremulRgba8 = [u8; 4];

#[derive(Clone, Debug, PartialEq, Eq)]
/// CPU frame buffer, row-major RGBA8.
pub struct FrameRGBA {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes.
    pub data: Vec<u8>,
    /// Whether color channels are premultiplied by alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Fully transparent premultiplied frame.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, [0, 0, 0, 0])
    }

    /// Frame with every pixel set to `px`.
    pub fn filled(width: u32, height: u32, px: PremulRgba8) -> Self {
        let len = Canvas { width, height }.pixel_count();
        Self {
            width,
            height,
            data: px.repeat(len),
            premultiplied: true,
        }
    }

    /// Frame dimensions.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Overwrite every pixel with `px`.
    pub fn clear(&mut self, px: PremulRgba8) {
        for d in self.data.chunks_exact_mut(4) {
            d.copy_from_slice(&px);
        }
    }

    /// Pixel at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<PremulRgba8> {
        let i = self.index(x, y)?;
        let p = self.data.get(i..i + 4)?;
        Some([p[0], p[1], p[2], p[3]])
    }

    /// Write `px` at `(x, y)`; out-of-bounds writes are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, px: PremulRgba8) {
        if let Some(i) = self.index(x, y) {
            self.data[i..i + 4].copy_from_slice(&px);
        }
    }

    /// Source-over fill of the pixels whose centers lie inside `rect`.
    pub fn fill_rect(&mut self, rect: Rect, color: ColorRgba) {
        let px = premultiply(color.to_rgba8());
        let rect = rect.abs();
        let x0 = (rect.x0 - 0.5).ceil().max(0.0) as u32;
        let y0 = (rect.y0 - 0.5).ceil().max(0.0) as u32;
        let x1 = ((rect.x1 - 0.5).ceil().max(0.0) as u32).min(self.width);
        let y1 = ((rect.y1 - 0.5).ceil().max(0.0) as u32).min(self.height);
        for y in y0..y1 {
            for x in x0..x1 {
                if let Some(dst) = self.pixel(x, y) {
                    self.set_pixel(x, y, over(dst, px, 1.0));
                }
            }
        }
    }

    /// Composite `src` over this frame with source-over.
    pub fn draw_over(&mut self, src: &FrameRGBA, opacity: f32) -> ReelResult<()> {
        if self.canvas() != src.canvas() {
            return Err(ReelError::render(format!(
                "cannot composite {}x{} frame over {}x{} frame",
                src.width, src.height, self.width, self.height
            )));
        }
        over_in_place(&mut self.data, &src.data, opacity)
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 4)
    }
}

/// Premultiply a straight-alpha RGBA8 pixel.
pub fn premultiply(rgba: [u8; 4]) -> PremulRgba8 {
    let a = u16::from(rgba[3]);
    [
        mul_div255_u8(u16::from(rgba[0]), a),
        mul_div255_u8(u16::from(rgba[1]), a),
        mul_div255_u8(u16::from(rgba[2]), a),
        rgba[3],
    ]
}

/// Premultiplied source-over.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }
    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));
    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// [`over`] applied pixel-wise to equal-length RGBA8 buffers.
pub fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> ReelResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ReelError::render(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq)]
/// Planar f32 audio, one vector per channel.
pub struct AudioBuffer {
    /// Samples per second.
    pub sampling_rate: u32,
    /// Sample data, one vector per channel.
    pub channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    /// Silent buffer of `samples` per channel.
    pub fn silent(channels: u32, samples: usize, sampling_rate: u32) -> Self {
        Self {
            sampling_rate,
            channels: vec![vec![0.0; samples]; channels as usize],
        }
    }

    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Whether the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add `other` sample-wise into this buffer.
    pub fn mix_in(&mut self, other: &AudioBuffer) -> ReelResult<()> {
        if self.channel_count() != other.channel_count() || self.len() != other.len() {
            return Err(ReelError::render(format!(
                "cannot mix {}ch/{} samples into {}ch/{} samples",
                other.channel_count(),
                other.len(),
                self.channel_count(),
                self.len()
            )));
        }
        for (dst, src) in self.channels.iter_mut().zip(&other.channels) {
            for (d, s) in dst.iter_mut().zip(src) {
                *d += s;
            }
        }
        Ok(())
    }
}

/// Destination buffer shared between a render request and its clones.
///
/// Cloning the handle shares the buffer; requests derived with `clone_with` keep writing into
/// the same allocation unless the patch supplies a new handle.
#[derive(Debug)]
pub struct Shared<T>(Arc<Mutex<T>>);

/// Shared destination canvas.
pub type CanvasHandle = Shared<FrameRGBA>;
/// Shared destination audio buffer.
pub type AudioHandle = Shared<AudioBuffer>;

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> Shared<T> {
    /// Wrap `value` in a new shared buffer.
    pub fn new(value: T) -> Self {
        Self(Arc::new(Mutex::new(value)))
    }

    /// Run `f` with exclusive access to the buffer.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> ReelResult<R> {
        let mut guard = self
            .0
            .lock()
            .map_err(|_| ReelError::render("destination buffer lock poisoned"))?;
        Ok(f(&mut guard))
    }

    /// Whether both handles point at the same buffer.
    pub fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: Clone> Shared<T> {
    /// Copy of the current contents.
    pub fn snapshot(&self) -> ReelResult<T> {
        self.with(|v| v.clone())
    }

    /// Take the buffer out, copying only when other handles are still alive.
    pub fn into_inner(self) -> ReelResult<T> {
        match Arc::try_unwrap(self.0) {
            Ok(m) => m
                .into_inner()
                .map_err(|_| ReelError::render("destination buffer lock poisoned")),
            Err(shared) => Self(shared).snapshot(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/buffer.rs"]
mod tests;
