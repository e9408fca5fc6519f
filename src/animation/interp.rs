use crate::{
    animation::{
        keyframe::KeyframeLink,
        shape::{ShapeInterpolator, ShapeMorph},
    },
    foundation::{
        core::Frame,
        error::{ReelError, ReelResult},
        math::{lerp_f64, round_half_up},
    },
    plugin::descriptor::ParamType,
    values::{geometry::Lerp, value::TypedValue},
};

/// Fail with [`ReelError::UnsupportedType`] for tags without an interpolation policy.
pub fn ensure_supported(ty: ParamType) -> ReelResult<()> {
    match ty {
        ParamType::Clip | ParamType::Pulse | ParamType::Array => {
            Err(ReelError::unsupported_type(ty.tag()))
        }
        _ => Ok(()),
    }
}

/// Per-type interpolation for one parameter.
///
/// Holds the shape morph of the segment it last evaluated, so walking frames of one segment
/// matches the two outlines only once.
pub struct Interpolator<'a> {
    param_name: &'a str,
    ty: ParamType,
    shapes: &'a dyn ShapeInterpolator,
    morph: Option<(usize, ShapeMorph)>,
}

impl<'a> Interpolator<'a> {
    /// Interpolator for parameter `param_name` of type `ty`.
    pub fn new(param_name: &'a str, ty: ParamType, shapes: &'a dyn ShapeInterpolator) -> Self {
        Self {
            param_name,
            ty,
            shapes,
            morph: None,
        }
    }

    /// Value inside the segment governed by `link` at eased progress `rate`.
    pub fn apply(&mut self, rate: f64, frame: Frame, link: &KeyframeLink<'_>) -> ReelResult<TypedValue> {
        tracing::trace!(param = self.param_name, frame, rate, "interpolate");

        let from = &link.active.value;
        let to = link.next.map_or(from, |k| &k.value);
        // Step types hold the previous keyframe's value.
        let held = link.previous.map_or(from, |k| &k.value);

        match self.ty {
            ParamType::Number => {
                let (a, b) = (self.number(from)?, self.number(to)?);
                Ok(TypedValue::Number(round_half_up(lerp_f64(a, b, rate))))
            }
            ParamType::Float => match (from, to) {
                (TypedValue::Float(a), TypedValue::Float(b)) => {
                    Ok(TypedValue::Float(lerp_f64(*a, *b, rate)))
                }
                _ => Err(self.mismatch(from, to)),
            },
            ParamType::ColorRgb => match (from, to) {
                (TypedValue::ColorRgb(a), TypedValue::ColorRgb(b)) => {
                    Ok(TypedValue::ColorRgb(a.lerp(b, rate)))
                }
                _ => Err(self.mismatch(from, to)),
            },
            ParamType::ColorRgba => match (from, to) {
                (TypedValue::ColorRgba(a), TypedValue::ColorRgba(b)) => {
                    Ok(TypedValue::ColorRgba(a.lerp(b, rate)))
                }
                _ => Err(self.mismatch(from, to)),
            },
            ParamType::Point2D => match (from, to) {
                (TypedValue::Point2D(a), TypedValue::Point2D(b)) => {
                    Ok(TypedValue::Point2D(Lerp::lerp(a, b, rate)))
                }
                _ => Err(self.mismatch(from, to)),
            },
            ParamType::Point3D => match (from, to) {
                (TypedValue::Point3D(a), TypedValue::Point3D(b)) => {
                    Ok(TypedValue::Point3D(Lerp::lerp(a, b, rate)))
                }
                _ => Err(self.mismatch(from, to)),
            },
            ParamType::Size2D => match (from, to) {
                (TypedValue::Size2D(a), TypedValue::Size2D(b)) => {
                    Ok(TypedValue::Size2D(Lerp::lerp(a, b, rate)))
                }
                _ => Err(self.mismatch(from, to)),
            },
            ParamType::Size3D => match (from, to) {
                (TypedValue::Size3D(a), TypedValue::Size3D(b)) => {
                    Ok(TypedValue::Size3D(Lerp::lerp(a, b, rate)))
                }
                _ => Err(self.mismatch(from, to)),
            },
            ParamType::Bool
            | ParamType::String
            | ParamType::Enum
            | ParamType::Code
            | ParamType::Asset => {
                if held.fits(self.ty) {
                    Ok(held.clone())
                } else {
                    Err(self.mismatch(held, held))
                }
            }
            ParamType::Shape => {
                // The morph starts at the previous outline when there is one.
                let start = link.previous.map_or(from, |k| &k.value);
                let end = link.next.map_or(start, |k| &k.value);
                let (TypedValue::Shape(a), TypedValue::Shape(b)) = (start, end) else {
                    return Err(self.mismatch(start, end));
                };
                let morph = self.morph_for(link.index, a, b)?;
                Ok(TypedValue::Shape(morph(rate)))
            }
            ParamType::Clip | ParamType::Pulse | ParamType::Array => {
                Err(ReelError::unsupported_type(self.ty.tag()))
            }
        }
    }

    fn number(&self, v: &TypedValue) -> ReelResult<f64> {
        match v {
            TypedValue::Number(n) => Ok(*n),
            other => Err(self.mismatch(other, other)),
        }
    }

    fn morph_for(&mut self, index: usize, from: &str, to: &str) -> ReelResult<&ShapeMorph> {
        let stale = !matches!(&self.morph, Some((cached, _)) if *cached == index);
        if stale {
            self.morph = Some((index, self.shapes.interpolate(from, to)?));
        }
        match &self.morph {
            Some((_, morph)) => Ok(morph),
            None => Err(ReelError::shape("shape morph unavailable")),
        }
    }

    fn mismatch(&self, a: &TypedValue, b: &TypedValue) -> ReelError {
        let found = if a.fits(self.ty) { b } else { a };
        ReelError::type_mismatch(self.param_name, self.ty.tag(), found.type_tag())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/interp.rs"]
mod tests;
