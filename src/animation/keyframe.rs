use serde::{Deserialize, Serialize};

use crate::{
    animation::ease::EaseParam,
    foundation::{
        core::Frame,
        error::{ReelError, ReelResult},
    },
    values::value::TypedValue,
};

/// One animation control point of a parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Frame relative to the owning clip's placement.
    pub frame_on_clip: Frame,
    /// Value at `frame_on_clip`.
    pub value: TypedValue,
    /// Incoming easing handle, used by the segment ending at this key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ease_in_param: Option<EaseParam>,
    /// Outgoing easing handle, used by the segment starting at this key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ease_out_param: Option<EaseParam>,
}

impl Keyframe {
    /// Keyframe with default easing on both sides.
    pub fn new(frame_on_clip: Frame, value: TypedValue) -> Self {
        Self {
            frame_on_clip,
            value,
            ease_in_param: None,
            ease_out_param: None,
        }
    }

    /// Set the incoming easing handle.
    pub fn with_ease_in(mut self, param: EaseParam) -> Self {
        self.ease_in_param = Some(param);
        self
    }

    /// Set the outgoing easing handle.
    pub fn with_ease_out(mut self, param: EaseParam) -> Self {
        self.ease_out_param = Some(param);
        self
    }
}

/// Adjacency view of one keyframe inside an ordered sequence.
#[derive(Clone, Copy, Debug)]
pub struct KeyframeLink<'a> {
    /// Position of `active` in the ordered sequence.
    pub index: usize,
    /// Keyframe before `active`, if any.
    pub previous: Option<&'a Keyframe>,
    /// Keyframe this link starts at.
    pub active: &'a Keyframe,
    /// Keyframe after `active`; `None` for the last one.
    pub next: Option<&'a Keyframe>,
}

impl KeyframeLink<'_> {
    /// Absolute frame of the active keyframe.
    ///
    /// Saturates at the `Frame` bounds; [`LinkedKeyframes::check_placement`] rejects
    /// placements where that would happen.
    pub fn active_frame(&self, clip_placed_frame: Frame) -> Frame {
        clip_placed_frame.saturating_add(self.active.frame_on_clip)
    }

    /// Absolute frame of the next keyframe, if any.
    pub fn next_frame(&self, clip_placed_frame: Frame) -> Option<Frame> {
        self.next
            .map(|k| clip_placed_frame.saturating_add(k.frame_on_clip))
    }

    /// Whether this link governs `frame`.
    fn governs(&self, clip_placed_frame: Frame, frame: Frame) -> bool {
        let active_at = self.active_frame(clip_placed_frame);
        match self.next_frame(clip_placed_frame) {
            // Last segment extends to +inf.
            None => true,
            Some(next_at) if active_at <= frame && frame < next_at => true,
            // Frames before the first keyframe belong to the first link.
            Some(_) => self.previous.is_none() && frame < active_at,
        }
    }
}

/// Keyframes of one parameter sorted by `frame_on_clip`, addressed by index.
///
/// Links are derived on demand from the owned, sorted array; nothing here holds pointers
/// between keyframes.
#[derive(Clone, Debug, Default)]
pub struct LinkedKeyframes {
    keys: Vec<Keyframe>,
}

impl LinkedKeyframes {
    /// Stable-sort a copy of `keyframes` by `frame_on_clip`.
    pub fn build(keyframes: &[Keyframe]) -> Self {
        let mut keys = keyframes.to_vec();
        keys.sort_by_key(|k| k.frame_on_clip);
        Self { keys }
    }

    /// Keyframes in ascending `frame_on_clip` order.
    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    /// Number of keyframes.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether there are no keyframes.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Earliest keyframe after sorting.
    pub fn first(&self) -> Option<&Keyframe> {
        self.keys.first()
    }

    /// Fail when offsetting the keyframes by `clip_placed_frame` leaves the `Frame` range.
    ///
    /// Keys are sorted, so checking the first and last covers every key.
    pub fn check_placement(&self, clip_placed_frame: Frame) -> ReelResult<()> {
        for key in self.keys.first().into_iter().chain(self.keys.last()) {
            if clip_placed_frame.checked_add(key.frame_on_clip).is_none() {
                return Err(ReelError::validation(format!(
                    "keyframe at {} overflows when placed at frame {clip_placed_frame}",
                    key.frame_on_clip
                )));
            }
        }
        Ok(())
    }

    /// Link of the keyframe at `index` with its neighbours.
    pub fn link(&self, index: usize) -> Option<KeyframeLink<'_>> {
        let active = self.keys.get(index)?;
        Some(KeyframeLink {
            index,
            previous: index.checked_sub(1).and_then(|i| self.keys.get(i)),
            active,
            next: self.keys.get(index + 1),
        })
    }

    /// Links of every keyframe in order.
    pub fn links(&self) -> impl Iterator<Item = KeyframeLink<'_>> + '_ {
        (0..self.keys.len()).filter_map(|i| self.link(i))
    }

    /// Link governing absolute `frame`, or `None` when there are no keyframes.
    pub fn active_link(&self, clip_placed_frame: Frame, frame: Frame) -> Option<KeyframeLink<'_>> {
        self.active_link_from(0, clip_placed_frame, frame)
    }

    /// Like [`Self::active_link`] but starts scanning at `from`.
    ///
    /// The governing index never decreases as `frame` grows, so callers walking frames in
    /// ascending order may pass the previous result's index.
    pub fn active_link_from(
        &self,
        from: usize,
        clip_placed_frame: Frame,
        frame: Frame,
    ) -> Option<KeyframeLink<'_>> {
        if self.keys.len() == 1 {
            return self.link(0);
        }
        (from..self.keys.len())
            .filter_map(|i| self.link(i))
            .find(|link| link.governs(clip_placed_frame, frame))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/keyframe.rs"]
mod tests;
