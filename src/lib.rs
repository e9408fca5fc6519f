//! Reel is the keyframe evaluation and render-request core of a non-linear video compositor.
//!
//! A project holds compositions; a composition stacks layers of clips; each clip names a
//! renderer plugin and carries keyframes for the parameters that renderer declares.
//!
//! # Pipeline overview
//!
//! 1. **Declare**: plugins describe their parameters with a [`TypeDescriptor`].
//! 2. **Evaluate**: keyframes resolve to one [`TypedValue`] per parameter per frame
//!    ([`values_at`], [`values_over_range`]), eased by [`CubicBezierEasing`].
//! 3. **Request**: a [`RenderRequest`] carries timing, canvas and audio destinations and the
//!    resolved parameters to a [`ClipRenderer`] and then to each [`EffectProcessor`].
//! 4. **Composite**: [`render_frame`] draws clip canvases bottom layer first and sums audio.
//!
//! `unsafe` is forbidden in this crate. Pixels are premultiplied RGBA8 end-to-end.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod animation;
mod composition;
mod eval;
mod foundation;
mod plugin;
mod render;
mod values;

pub use animation::ease::{
    CubicBezierEasing, DEFAULT_EASE_IN, DEFAULT_EASE_OUT, EaseParam, TERMINAL_EASE_IN,
};
pub use animation::interp::{Interpolator, ensure_supported};
pub use animation::keyframe::{Keyframe, KeyframeLink, LinkedKeyframes};
pub use animation::shape::{PolylineMorpher, ShapeInterpolator, ShapeMorph};
pub use composition::model::{Asset, Clip, Composition, Effect, Layer, Project};
pub use composition::resolver::{EntityResolver, ProjectResolver};
pub use eval::keyframes::{
    KeyframeMap, ParamEvaluator, ParamTable, value_at, value_at_with, values_at, values_at_with,
    values_over_range, values_over_range_with,
};
pub use foundation::core::{BezPath, Canvas, Fps, Frame, FrameRange, Point, Rect, Vec2};
pub use foundation::error::{ReelError, ReelResult};
pub use plugin::builtin::{OpacityEffect, SolidRenderer};
pub use plugin::descriptor::{ParamOpts, ParamType, ParameterTypeDescriptor, TypeDescriptor};
pub use plugin::registry::{ClipRenderer, EffectProcessor, PluginRegistry, Registered};
pub use render::buffer::{
    AudioBuffer, AudioHandle, CanvasHandle, FrameRGBA, PremulRgba8, Shared, over, over_in_place,
    premultiply,
};
pub use render::pipeline::{
    CancelToken, RenderOpts, RenderedFrame, negotiate_bboxes, render_frame, render_frames,
};
pub use render::request::{
    BBox2D, PreRenderRequest, PreRenderRequestInit, PreRenderRequestPatch, RenderRequest,
    RenderRequestInit, RenderRequestPatch,
};
pub use values::color::{ColorRgb, ColorRgba};
pub use values::geometry::{Lerp, Point2D, Point3D, Size2D, Size3D};
pub use values::value::{AssetPointer, ParamValues, TypedValue};
