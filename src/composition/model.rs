use std::collections::BTreeSet;

use crate::{
    eval::keyframes::KeyframeMap,
    foundation::{
        core::{Canvas, Fps, Frame, FrameRange},
        error::{ReelError, ReelResult},
    },
    values::color::ColorRgba,
};

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
/// Root of the entity hierarchy: assets and compositions.
///
/// Projects are edited elsewhere; rendering only reads them.
pub struct Project {
    /// Media files referenced by ASSET parameters.
    #[serde(default)]
    pub assets: Vec<Asset>,
    /// Compositions, any of which may be rendered as a root.
    #[serde(default)]
    pub compositions: Vec<Composition>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// An external media file.
pub struct Asset {
    /// Stable identifier referenced by [`crate::AssetPointer`].
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// File extension or media kind, e.g. `png`.
    #[serde(default)]
    pub file_type: String,
    /// Location of the file.
    pub path: String,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// A timeline with its own canvas, frame rate and audio format.
pub struct Composition {
    /// Unique id within the project.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Frames per second.
    pub framerate: Fps,
    /// Length in frames.
    pub duration_frames: Frame,
    /// Audio samples per second.
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate: u32,
    /// Audio channel count; `0` disables audio.
    #[serde(default = "default_audio_channels")]
    pub audio_channels: u32,
    /// Fill drawn under all layers.
    #[serde(default = "transparent")]
    pub background_color: ColorRgba,
    /// Bottom-most layer first.
    #[serde(default)]
    pub layers: Vec<Layer>,
}

fn default_sampling_rate() -> u32 {
    48_000
}

fn default_audio_channels() -> u32 {
    2
}

fn transparent() -> ColorRgba {
    ColorRgba::new(0.0, 0.0, 0.0, 0.0)
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// Ordered clips stacked at one depth.
pub struct Layer {
    /// Unique id within the project.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Clips on this layer.
    #[serde(default)]
    pub clips: Vec<Clip>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// A renderer placed on the timeline with keyframed parameters and an effect stack.
pub struct Clip {
    /// Unique id within the project.
    pub id: String,
    /// Id of the [`crate::ClipRenderer`] that draws this clip.
    pub renderer_id: String,
    /// Composition frame at which the clip starts.
    pub placed_frame: Frame,
    /// Length in frames.
    pub duration_frames: Frame,
    /// Keyframes keyed by parameter name.
    #[serde(default)]
    pub keyframes: KeyframeMap,
    /// Applied in order after the renderer.
    #[serde(default)]
    pub effects: Vec<Effect>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// A post-processing stage attached to a clip.
pub struct Effect {
    /// Unique id within the project.
    pub id: String,
    /// Id of the [`crate::EffectProcessor`] applied by this effect.
    pub processor_id: String,
    /// Keyframes keyed by parameter name.
    #[serde(default)]
    pub keyframes: KeyframeMap,
}

impl Project {
    /// Asset with `id`.
    pub fn asset(&self, id: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    /// Composition with `id`.
    pub fn composition(&self, id: &str) -> Option<&Composition> {
        self.compositions.iter().find(|c| c.id == id)
    }

    /// Find a clip in any composition.
    pub fn clip(&self, id: &str) -> Option<&Clip> {
        self.compositions.iter().find_map(|c| c.clip(id))
    }

    /// Parse and validate a project from JSON.
    pub fn from_json(json: &str) -> ReelResult<Self> {
        let project: Self = serde_json::from_str(json)?;
        project.validate()?;
        Ok(project)
    }

    /// Check that ids are unique and every composition and clip has a positive duration.
    pub fn validate(&self) -> ReelResult<()> {
        let mut ids = BTreeSet::new();
        let mut unique = |kind: &str, id: &str| -> ReelResult<()> {
            if id.trim().is_empty() {
                return Err(ReelError::validation(format!("{kind} id must be non-empty")));
            }
            if !ids.insert(id.to_owned()) {
                return Err(ReelError::validation(format!("duplicate id '{id}'")));
            }
            Ok(())
        };

        for asset in &self.assets {
            unique("asset", &asset.id)?;
        }
        for comp in &self.compositions {
            unique("composition", &comp.id)?;
            comp.validate()?;
            for layer in &comp.layers {
                unique("layer", &layer.id)?;
                for clip in &layer.clips {
                    unique("clip", &clip.id)?;
                    for effect in &clip.effects {
                        unique("effect", &effect.id)?;
                    }
                }
            }
        }
        Ok(())
    }
}

impl Composition {
    /// Canvas size.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Seconds at `frame`.
    pub fn frame_to_seconds(&self, frame: Frame) -> f64 {
        self.framerate.frames_to_secs(frame)
    }

    /// Audio samples per channel covering one frame.
    pub fn samples_per_frame(&self) -> usize {
        self.framerate.samples_per_frame(self.sampling_rate)
    }

    /// Clip with `id` on any layer.
    pub fn clip(&self, id: &str) -> Option<&Clip> {
        self.clips().find(|c| c.id == id)
    }

    /// Clips of every layer, bottom layer first.
    pub fn clips(&self) -> impl Iterator<Item = &Clip> + '_ {
        self.layers.iter().flat_map(|l| l.clips.iter())
    }

    /// Checks dimensions, timing and clip placement.
    pub fn validate(&self) -> ReelResult<()> {
        if self.framerate.num == 0 || self.framerate.den == 0 {
            return Err(ReelError::validation(format!(
                "composition '{}' framerate must have num>0 and den>0",
                self.id
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ReelError::validation(format!(
                "composition '{}' width/height must be > 0",
                self.id
            )));
        }
        if self.duration_frames <= 0 {
            return Err(ReelError::validation(format!(
                "composition '{}' duration must be > 0 frames",
                self.id
            )));
        }
        if self.audio_channels > 0 && self.sampling_rate == 0 {
            return Err(ReelError::validation(format!(
                "composition '{}' sampling_rate must be > 0 when audio channels are present",
                self.id
            )));
        }
        for clip in self.clips() {
            if clip.renderer_id.trim().is_empty() {
                return Err(ReelError::validation(format!(
                    "clip '{}' renderer_id must be non-empty",
                    clip.id
                )));
            }
            if clip.duration_frames <= 0 {
                return Err(ReelError::validation(format!(
                    "clip '{}' duration must be > 0 frames",
                    clip.id
                )));
            }
            if clip.placed_frame.checked_add(clip.duration_frames).is_none() {
                return Err(ReelError::validation(format!(
                    "clip '{}' ends past the last representable frame",
                    clip.id
                )));
            }
        }
        Ok(())
    }
}

impl Clip {
    /// Composition frames covered by the clip, end exclusive.
    pub fn range(&self) -> FrameRange {
        FrameRange {
            start: self.placed_frame,
            end: self.placed_frame.saturating_add(self.duration_frames),
        }
    }

    /// Whether composition `frame` falls inside the clip.
    pub fn is_active_at(&self, frame: Frame) -> bool {
        self.range().contains(frame)
    }

    /// Composition `frame` relative to the clip start.
    pub fn frame_on_clip(&self, frame: Frame) -> Frame {
        frame - self.placed_frame
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composition/model.rs"]
mod tests;
