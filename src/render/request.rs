//! Per-frame render context threaded down the composition hierarchy.
//!
//! Requests are immutable once built. A stage that hands work to a child derives a new request
//! with [`RenderRequest::clone_with`]; the patch type has no slot for the identity fields
//! (`root_composition`, `resolver`), so they are fixed for the whole descent.

use std::sync::Arc;

use crate::{
    composition::{model::Composition, resolver::EntityResolver},
    foundation::core::Frame,
    render::buffer::{AudioHandle, CanvasHandle},
    values::value::{ParamValues, TypedValue},
};

/// Every field a [`RenderRequest`] can be constructed with.
#[derive(Clone, Debug, Default)]
pub struct RenderRequestInit {
    /// Seconds from the start of the root composition.
    pub time: f64,
    /// Seconds from the start of the parent composition.
    pub time_on_composition: f64,
    /// Seconds from the start of the clip.
    pub time_on_clip: f64,

    /// Frame of the root composition.
    pub frame: Frame,
    /// Frame of the parent composition.
    pub frame_on_composition: Frame,
    /// Frame relative to the clip start.
    pub frame_on_clip: Frame,

    /// Canvas the receiving stage draws into.
    pub dest_canvas: Option<CanvasHandle>,
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Frames per second.
    pub framerate: f64,
    /// Length of the parent composition in frames.
    pub duration_frames: Frame,

    /// Audio buffer the receiving stage writes into.
    pub dest_audio_buffer: Option<AudioHandle>,
    /// Audio samples per second.
    pub sampling_rate: u32,
    /// Samples per channel to produce for this frame.
    pub needed_samples: usize,
    /// Audio channel count.
    pub audio_channels: u32,
    /// Whether stages should produce audio at all.
    pub is_audio_buffering_needed: bool,

    /// Composition the render started from.
    pub root_composition: Option<Arc<Composition>>,
    /// Composition directly containing the receiving stage.
    pub parent_composition: Option<Arc<Composition>>,

    /// Resolved parameters of the receiving stage.
    pub parameters: ParamValues,

    /// Lookup for assets, compositions and clips.
    pub resolver: Option<Arc<dyn EntityResolver>>,
}

/// Fields a derived request may override. `None` keeps the parent's value.
///
/// A patch can only replace values, never remove them: a derived request keeps the parent's
/// `dest_canvas`, `dest_audio_buffer` and `parent_composition` when the patch leaves them
/// `None`. Build a fresh request with [`RenderRequest::new`] to drop them.
#[derive(Clone, Debug, Default)]
pub struct RenderRequestPatch {
    /// Seconds from the start of the root composition.
    pub time: Option<f64>,
    /// Seconds from the start of the parent composition.
    pub time_on_composition: Option<f64>,
    /// Seconds from the start of the clip.
    pub time_on_clip: Option<f64>,

    /// Frame of the root composition.
    pub frame: Option<Frame>,
    /// Frame of the parent composition.
    pub frame_on_composition: Option<Frame>,
    /// Frame relative to the clip start.
    pub frame_on_clip: Option<Frame>,

    /// Canvas the receiving stage draws into.
    pub dest_canvas: Option<CanvasHandle>,
    /// Canvas width in pixels.
    pub width: Option<u32>,
    /// Canvas height in pixels.
    pub height: Option<u32>,
    /// Frames per second.
    pub framerate: Option<f64>,
    /// Length of the parent composition in frames.
    pub duration_frames: Option<Frame>,

    /// Audio buffer the receiving stage writes into.
    pub dest_audio_buffer: Option<AudioHandle>,
    /// Audio samples per second.
    pub sampling_rate: Option<u32>,
    /// Samples per channel to produce for this frame.
    pub needed_samples: Option<usize>,
    /// Audio channel count.
    pub audio_channels: Option<u32>,
    /// Whether stages should produce audio at all.
    pub is_audio_buffering_needed: Option<bool>,

    /// Composition directly containing the receiving stage.
    pub parent_composition: Option<Arc<Composition>>,

    /// Resolved parameters of the receiving stage.
    pub parameters: Option<ParamValues>,
}

impl From<RenderRequestInit> for RenderRequestPatch {
    /// Every patchable field of `init`; `root_composition` and `resolver` are dropped.
    fn from(init: RenderRequestInit) -> Self {
        Self {
            time: Some(init.time),
            time_on_composition: Some(init.time_on_composition),
            time_on_clip: Some(init.time_on_clip),
            frame: Some(init.frame),
            frame_on_composition: Some(init.frame_on_composition),
            frame_on_clip: Some(init.frame_on_clip),
            dest_canvas: init.dest_canvas,
            width: Some(init.width),
            height: Some(init.height),
            framerate: Some(init.framerate),
            duration_frames: Some(init.duration_frames),
            dest_audio_buffer: init.dest_audio_buffer,
            sampling_rate: Some(init.sampling_rate),
            needed_samples: Some(init.needed_samples),
            audio_channels: Some(init.audio_channels),
            is_audio_buffering_needed: Some(init.is_audio_buffering_needed),
            parent_composition: init.parent_composition,
            parameters: Some(init.parameters),
        }
    }
}

/// Immutable per-frame render context.
///
/// Cloning is shallow: buffers, compositions, parameters and the resolver are shared.
#[derive(Clone, Debug)]
pub struct RenderRequest {
    time: f64,
    time_on_composition: f64,
    time_on_clip: f64,

    frame: Frame,
    frame_on_composition: Frame,
    frame_on_clip: Frame,

    dest_canvas: Option<CanvasHandle>,
    width: u32,
    height: u32,
    framerate: f64,
    duration_frames: Frame,

    dest_audio_buffer: Option<AudioHandle>,
    sampling_rate: u32,
    needed_samples: usize,
    audio_channels: u32,
    is_audio_buffering_needed: bool,

    root_composition: Option<Arc<Composition>>,
    parent_composition: Option<Arc<Composition>>,

    parameters: Arc<ParamValues>,

    resolver: Option<Arc<dyn EntityResolver>>,
}

impl RenderRequest {
    /// Request from every field of `init`.
    pub fn new(init: RenderRequestInit) -> Self {
        Self {
            time: init.time,
            time_on_composition: init.time_on_composition,
            time_on_clip: init.time_on_clip,
            frame: init.frame,
            frame_on_composition: init.frame_on_composition,
            frame_on_clip: init.frame_on_clip,
            dest_canvas: init.dest_canvas,
            width: init.width,
            height: init.height,
            framerate: init.framerate,
            duration_frames: init.duration_frames,
            dest_audio_buffer: init.dest_audio_buffer,
            sampling_rate: init.sampling_rate,
            needed_samples: init.needed_samples,
            audio_channels: init.audio_channels,
            is_audio_buffering_needed: init.is_audio_buffering_needed,
            root_composition: init.root_composition,
            parent_composition: init.parent_composition,
            parameters: Arc::new(init.parameters),
            resolver: init.resolver,
        }
    }

    /// New request with `patch` applied over a shallow copy of `self`.
    pub fn clone_with(&self, patch: RenderRequestPatch) -> Self {
        let mut next = self.clone();
        let RenderRequestPatch {
            time,
            time_on_composition,
            time_on_clip,
            frame,
            frame_on_composition,
            frame_on_clip,
            dest_canvas,
            width,
            height,
            framerate,
            duration_frames,
            dest_audio_buffer,
            sampling_rate,
            needed_samples,
            audio_channels,
            is_audio_buffering_needed,
            parent_composition,
            parameters,
        } = patch;

        patch_field(&mut next.time, time);
        patch_field(&mut next.time_on_composition, time_on_composition);
        patch_field(&mut next.time_on_clip, time_on_clip);
        patch_field(&mut next.frame, frame);
        patch_field(&mut next.frame_on_composition, frame_on_composition);
        patch_field(&mut next.frame_on_clip, frame_on_clip);
        if dest_canvas.is_some() {
            next.dest_canvas = dest_canvas;
        }
        patch_field(&mut next.width, width);
        patch_field(&mut next.height, height);
        patch_field(&mut next.framerate, framerate);
        patch_field(&mut next.duration_frames, duration_frames);
        if dest_audio_buffer.is_some() {
            next.dest_audio_buffer = dest_audio_buffer;
        }
        patch_field(&mut next.sampling_rate, sampling_rate);
        patch_field(&mut next.needed_samples, needed_samples);
        patch_field(&mut next.audio_channels, audio_channels);
        patch_field(&mut next.is_audio_buffering_needed, is_audio_buffering_needed);
        if parent_composition.is_some() {
            next.parent_composition = parent_composition;
        }
        if let Some(parameters) = parameters {
            next.parameters = Arc::new(parameters);
        }
        next
    }

    /// Project onto the frame-independent subset used before rendering starts.
    pub fn to_pre_rendering_request(&self) -> PreRenderRequest {
        PreRenderRequest {
            width: self.width,
            height: self.height,
            framerate: self.framerate,
            duration_frames: self.duration_frames,
            sampling_rate: self.sampling_rate,
            audio_buffer_size: self.needed_samples,
            audio_channels: self.audio_channels,
            root_composition: self.root_composition.clone(),
            parent_composition: self.parent_composition.clone(),
            parameters: Arc::clone(&self.parameters),
            resolver: self.resolver.clone(),
        }
    }

    /// Seconds from the start of the root composition.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Alias of [`Self::time`].
    pub fn seconds(&self) -> f64 {
        self.time
    }

    /// Seconds from the start of the parent composition.
    pub fn time_on_composition(&self) -> f64 {
        self.time_on_composition
    }

    /// Seconds from the start of the clip.
    pub fn time_on_clip(&self) -> f64 {
        self.time_on_clip
    }

    /// Frame of the root composition.
    pub fn frame(&self) -> Frame {
        self.frame
    }

    /// Frame of the parent composition.
    pub fn frame_on_composition(&self) -> Frame {
        self.frame_on_composition
    }

    /// Frame relative to the clip start.
    pub fn frame_on_clip(&self) -> Frame {
        self.frame_on_clip
    }

    /// Canvas to draw into.
    pub fn dest_canvas(&self) -> Option<&CanvasHandle> {
        self.dest_canvas.as_ref()
    }

    /// Canvas width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Canvas height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Frames per second.
    pub fn framerate(&self) -> f64 {
        self.framerate
    }

    /// Length of the parent composition in frames.
    pub fn duration_frames(&self) -> Frame {
        self.duration_frames
    }

    /// Audio buffer to write into.
    pub fn dest_audio_buffer(&self) -> Option<&AudioHandle> {
        self.dest_audio_buffer.as_ref()
    }

    /// Audio samples per second.
    pub fn sampling_rate(&self) -> u32 {
        self.sampling_rate
    }

    /// Samples per channel a stage must write for this frame.
    pub fn needed_samples(&self) -> usize {
        self.needed_samples
    }

    /// Audio channel count.
    pub fn audio_channels(&self) -> u32 {
        self.audio_channels
    }

    /// Whether audio should be produced.
    pub fn is_audio_buffering_needed(&self) -> bool {
        self.is_audio_buffering_needed
    }

    /// Composition the render started from.
    pub fn root_composition(&self) -> Option<&Arc<Composition>> {
        self.root_composition.as_ref()
    }

    /// Composition directly containing the receiving stage.
    pub fn parent_composition(&self) -> Option<&Arc<Composition>> {
        self.parent_composition.as_ref()
    }

    /// Resolved parameter values of the stage receiving this request.
    pub fn parameters(&self) -> &ParamValues {
        &self.parameters
    }

    /// Resolved value of parameter `name`.
    pub fn param(&self, name: &str) -> Option<&TypedValue> {
        self.parameters.get(name)
    }

    /// Entity lookup shared by the whole render.
    pub fn resolver(&self) -> Option<&Arc<dyn EntityResolver>> {
        self.resolver.as_ref()
    }
}

/// Every field a [`PreRenderRequest`] can be constructed with.
#[derive(Clone, Debug, Default)]
pub struct PreRenderRequestInit {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Frames per second.
    pub framerate: f64,
    /// Length of the parent composition in frames.
    pub duration_frames: Frame,

    /// Audio samples per second.
    pub sampling_rate: u32,
    /// Samples per channel of one frame's audio buffer.
    pub audio_buffer_size: usize,
    /// Audio channel count.
    pub audio_channels: u32,

    /// Composition the render started from.
    pub root_composition: Option<Arc<Composition>>,
    /// Composition directly containing the receiving stage.
    pub parent_composition: Option<Arc<Composition>>,

    /// Resolved parameters of the receiving stage.
    pub parameters: ParamValues,

    /// Lookup for assets, compositions and clips.
    pub resolver: Option<Arc<dyn EntityResolver>>,
}

/// Fields a derived pre-render request may override. `None` keeps the parent's value, so
/// `parent_composition` cannot be cleared through a patch.
#[derive(Clone, Debug, Default)]
pub struct PreRenderRequestPatch {
    /// Canvas width in pixels.
    pub width: Option<u32>,
    /// Canvas height in pixels.
    pub height: Option<u32>,
    /// Frames per second.
    pub framerate: Option<f64>,
    /// Length of the parent composition in frames.
    pub duration_frames: Option<Frame>,

    /// Audio samples per second.
    pub sampling_rate: Option<u32>,
    /// Samples per channel of one frame's audio buffer.
    pub audio_buffer_size: Option<usize>,
    /// Audio channel count.
    pub audio_channels: Option<u32>,

    /// Composition directly containing the receiving stage.
    pub parent_composition: Option<Arc<Composition>>,

    /// Resolved parameters of the receiving stage.
    pub parameters: Option<ParamValues>,
}

/// Immutable context for setup work that happens before per-frame timing exists, such as
/// bounding-box negotiation.
#[derive(Clone, Debug)]
pub struct PreRenderRequest {
    width: u32,
    height: u32,
    framerate: f64,
    duration_frames: Frame,

    sampling_rate: u32,
    audio_buffer_size: usize,
    audio_channels: u32,

    root_composition: Option<Arc<Composition>>,
    parent_composition: Option<Arc<Composition>>,

    parameters: Arc<ParamValues>,

    resolver: Option<Arc<dyn EntityResolver>>,
}

impl PreRenderRequest {
    /// Request from every field of `init`.
    pub fn new(init: PreRenderRequestInit) -> Self {
        Self {
            width: init.width,
            height: init.height,
            framerate: init.framerate,
            duration_frames: init.duration_frames,
            sampling_rate: init.sampling_rate,
            audio_buffer_size: init.audio_buffer_size,
            audio_channels: init.audio_channels,
            root_composition: init.root_composition,
            parent_composition: init.parent_composition,
            parameters: Arc::new(init.parameters),
            resolver: init.resolver,
        }
    }

    /// New request with `patch` applied over a shallow copy of `self`.
    pub fn clone_with(&self, patch: PreRenderRequestPatch) -> Self {
        let mut next = self.clone();
        patch_field(&mut next.width, patch.width);
        patch_field(&mut next.height, patch.height);
        patch_field(&mut next.framerate, patch.framerate);
        patch_field(&mut next.duration_frames, patch.duration_frames);
        patch_field(&mut next.sampling_rate, patch.sampling_rate);
        patch_field(&mut next.audio_buffer_size, patch.audio_buffer_size);
        patch_field(&mut next.audio_channels, patch.audio_channels);
        if patch.parent_composition.is_some() {
            next.parent_composition = patch.parent_composition;
        }
        if let Some(parameters) = patch.parameters {
            next.parameters = Arc::new(parameters);
        }
        next
    }

    /// Canvas width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Canvas height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Frames per second.
    pub fn framerate(&self) -> f64 {
        self.framerate
    }

    /// Length of the parent composition in frames.
    pub fn duration_frames(&self) -> Frame {
        self.duration_frames
    }

    /// Audio samples per second.
    pub fn sampling_rate(&self) -> u32 {
        self.sampling_rate
    }

    /// Samples per channel of one frame's audio buffer.
    pub fn audio_buffer_size(&self) -> usize {
        self.audio_buffer_size
    }

    /// Audio channel count.
    pub fn audio_channels(&self) -> u32 {
        self.audio_channels
    }

    /// Composition the render started from.
    pub fn root_composition(&self) -> Option<&Arc<Composition>> {
        self.root_composition.as_ref()
    }

    /// Composition directly containing the receiving stage.
    pub fn parent_composition(&self) -> Option<&Arc<Composition>> {
        self.parent_composition.as_ref()
    }

    /// Resolved parameters of the receiving stage.
    pub fn parameters(&self) -> &ParamValues {
        &self.parameters
    }

    /// Resolved value of parameter `name`.
    pub fn param(&self, name: &str) -> Option<&TypedValue> {
        self.parameters.get(name)
    }

    /// Entity lookup shared by the whole render.
    pub fn resolver(&self) -> Option<&Arc<dyn EntityResolver>> {
        self.resolver.as_ref()
    }
}

fn patch_field<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
/// Screen-space bounds a renderer reports for its clip.
pub struct BBox2D {
    /// `false` when the clip draws nothing.
    pub visible: bool,
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
    /// Rotation around the box origin, radians.
    #[serde(default)]
    pub angle_rad: f64,
}

impl BBox2D {
    /// Unrotated bounds as a rectangle.
    pub fn rect(&self) -> kurbo::Rect {
        kurbo::Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/request.rs"]
mod tests;
