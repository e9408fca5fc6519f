//! Plugins shipped with the engine.

use std::sync::Arc;

use kurbo::Rect;

use crate::{
    foundation::error::{ReelError, ReelResult},
    plugin::{
        descriptor::{ParamOpts, TypeDescriptor},
        registry::{ClipRenderer, EffectProcessor, PluginRegistry},
    },
    render::request::{BBox2D, PreRenderRequest, RenderRequest},
    values::{
        color::ColorRgba,
        geometry::{Point2D, Size2D},
        value::{ParamValues, TypedValue},
    },
};

pub(crate) fn register_all(registry: &mut PluginRegistry) -> ReelResult<()> {
    registry.register_renderer(Arc::new(SolidRenderer))?;
    registry.register_processor(Arc::new(OpacityEffect))?;
    Ok(())
}

/// Fills a rectangle (the whole canvas when `size` is zero) with a color.
#[derive(Clone, Copy, Debug, Default)]
pub struct SolidRenderer;

impl SolidRenderer {
    fn rect(params: &ParamValues, width: u32, height: u32) -> Rect {
        let pos = params
            .get("position")
            .and_then(TypedValue::as_point_2d)
            .unwrap_or_default();
        let size = params
            .get("size")
            .and_then(TypedValue::as_size_2d)
            .unwrap_or_default();
        if size.width <= 0.0 || size.height <= 0.0 {
            return Rect::new(0.0, 0.0, f64::from(width), f64::from(height));
        }
        Rect::new(pos.x, pos.y, pos.x + size.width, pos.y + size.height)
    }
}

impl ClipRenderer for SolidRenderer {
    fn renderer_id(&self) -> &str {
        "solid"
    }

    fn provide_parameters(&self) -> TypeDescriptor {
        TypeDescriptor::new()
            .color_rgba(
                "color",
                ParamOpts::new("Color").default_value(TypedValue::ColorRgba(ColorRgba::new(
                    255.0, 255.0, 255.0, 1.0,
                ))),
            )
            .point_2d(
                "position",
                ParamOpts::new("Position").default_value(TypedValue::Point2D(Point2D::default())),
            )
            .size_2d(
                "size",
                ParamOpts::new("Size").default_value(TypedValue::Size2D(Size2D::default())),
            )
    }

    fn bbox(&self, req: &PreRenderRequest) -> ReelResult<BBox2D> {
        let r = Self::rect(req.parameters(), req.width(), req.height());
        Ok(BBox2D {
            visible: true,
            x: r.x0,
            y: r.y0,
            width: r.width(),
            height: r.height(),
            angle_rad: 0.0,
        })
    }

    fn render(&self, req: &RenderRequest) -> ReelResult<()> {
        let color = req
            .param("color")
            .and_then(TypedValue::as_color_rgba)
            .ok_or_else(|| ReelError::render("solid: missing color parameter"))?;
        let rect = Self::rect(req.parameters(), req.width(), req.height());
        let canvas = req
            .dest_canvas()
            .ok_or_else(|| ReelError::render("solid: request has no destination canvas"))?;
        canvas.with(|frame| frame.fill_rect(rect, color))
    }
}

/// Scales the canvas by `opacity` percent.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpacityEffect;

impl EffectProcessor for OpacityEffect {
    fn processor_id(&self) -> &str {
        "opacity"
    }

    fn provide_parameters(&self) -> TypeDescriptor {
        TypeDescriptor::new().float(
            "opacity",
            ParamOpts::new("Opacity").default_value(TypedValue::Float(100.0)),
        )
    }

    fn render(&self, req: &RenderRequest) -> ReelResult<()> {
        let opacity = req
            .param("opacity")
            .and_then(TypedValue::as_f64)
            .unwrap_or(100.0);
        let factor = (opacity / 100.0).clamp(0.0, 1.0);
        let canvas = req
            .dest_canvas()
            .ok_or_else(|| ReelError::render("opacity: request has no destination canvas"))?;
        canvas.with(|frame| {
            // Premultiplied, so every channel scales together.
            for c in &mut frame.data {
                *c = (f64::from(*c) * factor).round() as u8;
            }
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/plugin/builtin.rs"]
mod tests;
