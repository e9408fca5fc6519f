//! Parameter resolution over sparse keyframe sequences.
//!
//! Both entry points share [`ParamEvaluator`]: the link sequence is built once per parameter,
//! and easing curves and shape morphs are built once per segment traversed.

use std::collections::BTreeMap;

use crate::{
    animation::{
        ease::{CubicBezierEasing, DEFAULT_EASE_IN, DEFAULT_EASE_OUT, TERMINAL_EASE_IN},
        interp::{Interpolator, ensure_supported},
        keyframe::{Keyframe, KeyframeLink, LinkedKeyframes},
        shape::{PolylineMorpher, ShapeInterpolator},
    },
    foundation::{
        core::Frame,
        error::{ReelError, ReelResult},
    },
    plugin::descriptor::{ParameterTypeDescriptor, TypeDescriptor},
    values::value::{ParamValues, TypedValue},
};

/// Keyframe collections keyed by parameter name.
pub type KeyframeMap = BTreeMap<String, Vec<Keyframe>>;

/// Values of one parameter keyed by absolute frame.
pub type ParamTable = BTreeMap<Frame, TypedValue>;

/// Value of one parameter at absolute `frame`.
///
/// `clip_placed_frame` offsets every keyframe's `frame_on_clip`. Empty `keyframes` yield the
/// descriptor's default value.
pub fn value_at(
    frame: Frame,
    clip_placed_frame: Frame,
    desc: &ParameterTypeDescriptor,
    keyframes: &[Keyframe],
) -> ReelResult<TypedValue> {
    value_at_with(
        frame,
        clip_placed_frame,
        desc,
        keyframes,
        &PolylineMorpher::default(),
    )
}

/// [`value_at`] with a caller-provided shape morpher.
#[tracing::instrument(skip(desc, keyframes, shapes), fields(param = %desc.param_name))]
pub fn value_at_with(
    frame: Frame,
    clip_placed_frame: Frame,
    desc: &ParameterTypeDescriptor,
    keyframes: &[Keyframe],
    shapes: &dyn ShapeInterpolator,
) -> ReelResult<TypedValue> {
    ParamEvaluator::new(desc, keyframes, clip_placed_frame, shapes)?.eval(frame)
}

/// Values of every parameter in `descriptor` at absolute `frame`.
///
/// Parameters missing from `keyframes` resolve to their default value.
pub fn values_at(
    frame: Frame,
    clip_placed_frame: Frame,
    descriptor: &TypeDescriptor,
    keyframes: &KeyframeMap,
) -> ReelResult<ParamValues> {
    values_at_with(
        frame,
        clip_placed_frame,
        descriptor,
        keyframes,
        &PolylineMorpher::default(),
    )
}

/// [`values_at`] with a caller-provided shape morpher.
#[tracing::instrument(skip(descriptor, keyframes, shapes))]
pub fn values_at_with(
    frame: Frame,
    clip_placed_frame: Frame,
    descriptor: &TypeDescriptor,
    keyframes: &KeyframeMap,
    shapes: &dyn ShapeInterpolator,
) -> ReelResult<ParamValues> {
    descriptor
        .properties()
        .iter()
        .map(|desc| {
            let keys = keyframes
                .get(&desc.param_name)
                .map_or(&[][..], Vec::as_slice);
            let value = ParamEvaluator::new(desc, keys, clip_placed_frame, shapes)?.eval(frame)?;
            Ok((desc.param_name.clone(), value))
        })
        .collect()
}

/// Per-frame values of every parameter for frames `begin_frame..=begin_frame + frame_count`.
///
/// Every table holds `frame_count + 1` entries, each equal to what [`value_at`] returns for
/// that frame.
pub fn values_over_range(
    descriptor: &TypeDescriptor,
    keyframes: &KeyframeMap,
    clip_placed_frame: Frame,
    begin_frame: Frame,
    frame_count: u32,
) -> ReelResult<BTreeMap<String, ParamTable>> {
    values_over_range_with(
        descriptor,
        keyframes,
        clip_placed_frame,
        begin_frame,
        frame_count,
        &PolylineMorpher::default(),
    )
}

/// [`values_over_range`] with a caller-provided shape morpher.
#[tracing::instrument(skip(descriptor, keyframes, shapes))]
pub fn values_over_range_with(
    descriptor: &TypeDescriptor,
    keyframes: &KeyframeMap,
    clip_placed_frame: Frame,
    begin_frame: Frame,
    frame_count: u32,
    shapes: &dyn ShapeInterpolator,
) -> ReelResult<BTreeMap<String, ParamTable>> {
    let end_frame = begin_frame
        .checked_add(Frame::from(frame_count))
        .ok_or_else(|| ReelError::validation("frame range overflows"))?;

    let mut tables = BTreeMap::new();
    for desc in descriptor.properties() {
        let keys = keyframes
            .get(&desc.param_name)
            .map_or(&[][..], Vec::as_slice);
        let mut evaluator = ParamEvaluator::new(desc, keys, clip_placed_frame, shapes)?;

        let mut table = ParamTable::new();
        for frame in begin_frame..=end_frame {
            table.insert(frame, evaluator.eval(frame)?);
        }
        tables.insert(desc.param_name.clone(), table);
    }
    Ok(tables)
}

/// Evaluates one parameter for frames in ascending order.
pub struct ParamEvaluator<'a> {
    desc: &'a ParameterTypeDescriptor,
    keys: LinkedKeyframes,
    clip_placed_frame: Frame,
    // Non-animatable and keyless parameters resolve to a single value.
    constant: Option<TypedValue>,
    interp: Interpolator<'a>,
    easing: Option<(usize, CubicBezierEasing)>,
    cursor: usize,
    last_frame: Option<Frame>,
}

impl<'a> ParamEvaluator<'a> {
    /// Check the descriptor's type and every keyframe value, then link the keyframes.
    pub fn new(
        desc: &'a ParameterTypeDescriptor,
        keyframes: &[Keyframe],
        clip_placed_frame: Frame,
        shapes: &'a dyn ShapeInterpolator,
    ) -> ReelResult<Self> {
        ensure_supported(desc.ty)?;
        if let Some(bad) = keyframes.iter().find(|k| !k.value.fits(desc.ty)) {
            return Err(ReelError::type_mismatch(
                &desc.param_name,
                desc.ty.tag(),
                bad.value.type_tag(),
            ));
        }

        let keys = LinkedKeyframes::build(keyframes);
        let constant = if keys.is_empty() {
            tracing::debug!(param = %desc.param_name, "no keyframes, using default value");
            Some(desc.default_value.clone())
        } else if !desc.animatable {
            tracing::debug!(param = %desc.param_name, "not animatable, holding first keyframe");
            keys.first().map(|k| k.value.clone())
        } else {
            keys.check_placement(clip_placed_frame)?;
            None
        };

        Ok(Self {
            desc,
            keys,
            clip_placed_frame,
            constant,
            interp: Interpolator::new(&desc.param_name, desc.ty, shapes),
            easing: None,
            cursor: 0,
            last_frame: None,
        })
    }

    /// Value at absolute `frame`. Ascending frames reuse the previous segment lookup.
    pub fn eval(&mut self, frame: Frame) -> ReelResult<TypedValue> {
        if let Some(value) = &self.constant {
            return Ok(value.clone());
        }

        // The cursor is only valid while frames ascend.
        if self.last_frame.is_some_and(|last| frame < last) {
            self.cursor = 0;
        }
        self.last_frame = Some(frame);

        let placed = self.clip_placed_frame;
        let Some(link) = self.keys.active_link_from(self.cursor, placed, frame) else {
            return Ok(self.desc.default_value.clone());
        };
        self.cursor = link.index;

        let active_at = link.active_frame(placed);
        if link.previous.is_none() && frame < active_at {
            return Ok(link.active.value.clone());
        }
        let Some(next_at) = link.next_frame(placed) else {
            return Ok(link.active.value.clone());
        };

        // Widened so keys spanning most of the `Frame` range cannot overflow.
        let span = i128::from(next_at) - i128::from(active_at);
        let rate = (i128::from(frame) - i128::from(active_at)) as f64 / span as f64;
        let eased = segment_easing(&mut self.easing, &link)?.evaluate(rate);
        self.interp.apply(eased, frame, &link)
    }
}

fn segment_easing<'c>(
    cache: &'c mut Option<(usize, CubicBezierEasing)>,
    link: &KeyframeLink<'_>,
) -> ReelResult<&'c CubicBezierEasing> {
    let fresh = !matches!(cache, Some((index, _)) if *index == link.index);
    if fresh {
        let ease_out = link.active.ease_out_param.unwrap_or(DEFAULT_EASE_OUT);
        let ease_in = link
            .next
            .map_or(TERMINAL_EASE_IN, |k| k.ease_in_param.unwrap_or(DEFAULT_EASE_IN));
        let easing = CubicBezierEasing::for_segment(ease_out, ease_in)?;
        return Ok(&cache.insert((link.index, easing)).1);
    }
    match cache {
        Some((_, easing)) => Ok(easing),
        None => Err(ReelError::animation("segment easing missing")),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/eval/keyframes.rs"]
mod tests;
