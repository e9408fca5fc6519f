use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use rayon::prelude::*;

use crate::{
    composition::{
        model::{Clip, Composition},
        resolver::EntityResolver,
    },
    eval::keyframes::values_at,
    foundation::{
        core::{Frame, FrameRange},
        error::{ReelError, ReelResult},
    },
    plugin::registry::PluginRegistry,
    render::{
        buffer::{AudioBuffer, AudioHandle, CanvasHandle, FrameRGBA, Shared, premultiply},
        request::{BBox2D, PreRenderRequestPatch, RenderRequest, RenderRequestInit, RenderRequestPatch},
    },
    values::value::ParamValues,
};

/// Knobs for [`render_frame`] and [`render_frames`].
#[derive(Clone, Debug)]
pub struct RenderOpts {
    /// Render the active clips of a frame on a rayon pool.
    pub parallel: bool,
    /// Pool size when `parallel` is set; `None` uses rayon's default. `Some(0)` is rejected.
    pub threads: Option<usize>,
    /// Log and drop clips whose renderer or effects fail instead of failing the frame.
    pub skip_failed_clips: bool,
    /// Frame clear color (premultiplied). Defaults to the composition background.
    pub clear_rgba: Option<[u8; 4]>,
    /// Collect clip audio when the composition has audio channels.
    pub audio: bool,
}

impl Default for RenderOpts {
    fn default() -> Self {
        Self {
            parallel: false,
            threads: None,
            skip_failed_clips: false,
            clear_rgba: None,
            audio: true,
        }
    }
}

/// Cooperative cancellation flag shared between a scheduler and running renders.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Renders observe it at the next clip or effect boundary.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether [`Self::cancel`] has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// `Err(Cancelled)` once [`Self::cancel`] has been called.
    pub fn check(&self) -> ReelResult<()> {
        if self.is_cancelled() {
            Err(ReelError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Output of one composition frame.
#[derive(Clone, Debug)]
pub struct RenderedFrame {
    /// Composition frame that was rendered.
    pub frame: Frame,
    /// Premultiplied RGBA8.
    pub video: FrameRGBA,
    /// Mixed clip audio; `None` when audio is disabled or the composition has no channels.
    pub audio: Option<AudioBuffer>,
}

/// Render one frame of a composition.
///
/// Every clip active at `frame` gets its own canvas and a request carrying its resolved
/// parameters; its effects then run in declared order on that canvas. Clip canvases are
/// composited bottom layer first, in clip order within a layer, and clip audio is summed.
#[tracing::instrument(skip(resolver, registry, opts, cancel))]
pub fn render_frame(
    resolver: &Arc<dyn EntityResolver>,
    composition_id: &str,
    frame: Frame,
    registry: &PluginRegistry,
    opts: &RenderOpts,
    cancel: &CancelToken,
) -> ReelResult<RenderedFrame> {
    let pool = opts
        .parallel
        .then(|| build_thread_pool(opts.threads))
        .transpose()?;
    let comp = root_composition(resolver.as_ref(), composition_id)?;
    render_frame_in(resolver, &comp, frame, registry, opts, cancel, pool.as_ref())
}

/// Render frames `range.start..range.end`.
#[tracing::instrument(skip(resolver, registry, opts, cancel))]
pub fn render_frames(
    resolver: &Arc<dyn EntityResolver>,
    composition_id: &str,
    range: FrameRange,
    registry: &PluginRegistry,
    opts: &RenderOpts,
    cancel: &CancelToken,
) -> ReelResult<Vec<RenderedFrame>> {
    if range.is_empty() {
        return Err(ReelError::validation("render range must be non-empty"));
    }
    let pool = opts
        .parallel
        .then(|| build_thread_pool(opts.threads))
        .transpose()?;
    let comp = root_composition(resolver.as_ref(), composition_id)?;

    let mut out = Vec::with_capacity(range.len_frames().min(4096) as usize);
    for f in range.start..range.end {
        out.push(render_frame_in(
            resolver,
            &comp,
            f,
            registry,
            opts,
            cancel,
            pool.as_ref(),
        )?);
    }
    Ok(out)
}

/// Ask each clip's renderer for its bounds, keyed by clip id.
///
/// Parameters are evaluated at the clip's first frame and passed through a
/// [`crate::PreRenderRequest`].
#[tracing::instrument(skip(resolver, registry))]
pub fn negotiate_bboxes(
    resolver: &Arc<dyn EntityResolver>,
    composition_id: &str,
    registry: &PluginRegistry,
) -> ReelResult<BTreeMap<String, BBox2D>> {
    let comp = root_composition(resolver.as_ref(), composition_id)?;
    let base = root_request(resolver, &comp, 0, None, None).to_pre_rendering_request();

    let mut out = BTreeMap::new();
    for clip in comp.clips() {
        let renderer = registry.renderer(&clip.renderer_id)?;
        let parameters = values_at(
            clip.placed_frame,
            clip.placed_frame,
            &renderer.descriptor,
            &clip.keyframes,
        )?;
        let pre = base.clone_with(PreRenderRequestPatch {
            parameters: Some(parameters),
            ..Default::default()
        });
        out.insert(clip.id.clone(), renderer.plugin.bbox(&pre)?);
    }
    Ok(out)
}

fn root_composition(resolver: &dyn EntityResolver, id: &str) -> ReelResult<Arc<Composition>> {
    let comp = resolver
        .resolve_composition(id)
        .ok_or_else(|| ReelError::validation(format!("unknown composition '{id}'")))?;
    comp.validate()?;
    Ok(Arc::new(comp.clone()))
}

fn root_request(
    resolver: &Arc<dyn EntityResolver>,
    comp: &Arc<Composition>,
    frame: Frame,
    canvas: Option<CanvasHandle>,
    audio: Option<AudioHandle>,
) -> RenderRequest {
    let time = comp.frame_to_seconds(frame);
    RenderRequest::new(RenderRequestInit {
        time,
        time_on_composition: time,
        time_on_clip: 0.0,
        frame,
        frame_on_composition: frame,
        frame_on_clip: 0,
        dest_canvas: canvas,
        width: comp.width,
        height: comp.height,
        framerate: comp.framerate.as_f64(),
        duration_frames: comp.duration_frames,
        is_audio_buffering_needed: audio.is_some(),
        dest_audio_buffer: audio,
        sampling_rate: comp.sampling_rate,
        needed_samples: comp.samples_per_frame(),
        audio_channels: comp.audio_channels,
        root_composition: Some(Arc::clone(comp)),
        parent_composition: Some(Arc::clone(comp)),
        parameters: ParamValues::new(),
        resolver: Some(Arc::clone(resolver)),
    })
}

struct ClipOutput {
    video: FrameRGBA,
    audio: Option<AudioBuffer>,
}

fn render_frame_in(
    resolver: &Arc<dyn EntityResolver>,
    comp: &Arc<Composition>,
    frame: Frame,
    registry: &PluginRegistry,
    opts: &RenderOpts,
    cancel: &CancelToken,
    pool: Option<&rayon::ThreadPool>,
) -> ReelResult<RenderedFrame> {
    if frame < 0 || frame >= comp.duration_frames {
        return Err(ReelError::validation(format!(
            "frame {frame} is outside composition '{}' (0..{})",
            comp.id, comp.duration_frames
        )));
    }
    cancel.check()?;

    let clear = opts
        .clear_rgba
        .unwrap_or_else(|| premultiply(comp.background_color.to_rgba8()));
    let canvas = CanvasHandle::new(FrameRGBA::filled(comp.width, comp.height, clear));
    let audio = (opts.audio && comp.audio_channels > 0).then(|| {
        AudioHandle::new(AudioBuffer::silent(
            comp.audio_channels,
            comp.samples_per_frame(),
            comp.sampling_rate,
        ))
    });

    let jobs: Vec<&Clip> = comp.clips().filter(|c| c.is_active_at(frame)).collect();
    tracing::debug!(frame, clips = jobs.len(), "rendering frame");

    {
        let root = root_request(resolver, comp, frame, Some(canvas.clone()), audio.clone());
        let render = |clip: &Clip| render_clip(clip, &root, registry, cancel);

        match pool {
            Some(pool) => {
                let outputs: Vec<_> = pool.install(|| jobs.par_iter().map(|c| render(*c)).collect());
                for (clip, out) in jobs.iter().zip(outputs) {
                    composite(clip, out, &canvas, audio.as_ref(), opts)?;
                }
            }
            None => {
                for clip in &jobs {
                    composite(clip, render(*clip), &canvas, audio.as_ref(), opts)?;
                }
            }
        }
    }

    Ok(RenderedFrame {
        frame,
        video: canvas.into_inner()?,
        audio: audio.map(Shared::into_inner).transpose()?,
    })
}

fn render_clip(
    clip: &Clip,
    root: &RenderRequest,
    registry: &PluginRegistry,
    cancel: &CancelToken,
) -> ReelResult<ClipOutput> {
    cancel.check()?;
    let renderer = registry.renderer(&clip.renderer_id)?;
    let frame = root.frame();
    let parameters = values_at(
        frame,
        clip.placed_frame,
        &renderer.descriptor,
        &clip.keyframes,
    )?;

    let canvas = CanvasHandle::new(FrameRGBA::new(root.width(), root.height()));
    let audio = root.is_audio_buffering_needed().then(|| {
        AudioHandle::new(AudioBuffer::silent(
            root.audio_channels(),
            root.needed_samples(),
            root.sampling_rate(),
        ))
    });

    {
        let frame_on_clip = clip.frame_on_clip(frame);
        let req = root.clone_with(RenderRequestPatch {
            frame_on_clip: Some(frame_on_clip),
            time_on_clip: Some(frame_on_clip as f64 / root.framerate()),
            dest_canvas: Some(canvas.clone()),
            dest_audio_buffer: audio.clone(),
            parameters: Some(parameters),
            ..Default::default()
        });
        renderer.plugin.render(&req)?;

        for effect in &clip.effects {
            cancel.check()?;
            let processor = registry.processor(&effect.processor_id)?;
            let parameters = values_at(
                frame,
                clip.placed_frame,
                &processor.descriptor,
                &effect.keyframes,
            )?;
            let effect_req = req.clone_with(RenderRequestPatch {
                parameters: Some(parameters),
                ..Default::default()
            });
            processor.plugin.render(&effect_req)?;
        }
    }

    Ok(ClipOutput {
        video: canvas.into_inner()?,
        audio: audio.map(Shared::into_inner).transpose()?,
    })
}

fn composite(
    clip: &Clip,
    out: ReelResult<ClipOutput>,
    canvas: &CanvasHandle,
    audio: Option<&AudioHandle>,
    opts: &RenderOpts,
) -> ReelResult<()> {
    let out = match out {
        Ok(out) => out,
        Err(ReelError::Cancelled) => return Err(ReelError::Cancelled),
        Err(e) if opts.skip_failed_clips => {
            tracing::warn!(clip = %clip.id, error = %e, "skipping failed clip");
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    canvas.with(|frame| frame.draw_over(&out.video, 1.0))??;
    if let (Some(dst), Some(src)) = (audio, out.audio.as_ref()) {
        dst.with(|buf| buf.mix_in(src))??;
    }
    Ok(())
}

fn build_thread_pool(threads: Option<usize>) -> ReelResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(ReelError::validation(
            "render option 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| ReelError::render(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
