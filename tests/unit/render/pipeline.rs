use std::sync::Mutex;

use super::*;
use crate::{
    animation::keyframe::Keyframe,
    composition::{
        model::{Effect, Layer, Project},
        resolver::ProjectResolver,
    },
    eval::keyframes::KeyframeMap,
    foundation::core::Fps,
    plugin::{
        descriptor::{ParamOpts, TypeDescriptor},
        registry::{ClipRenderer, EffectProcessor},
    },
    values::{
        color::ColorRgba,
        geometry::{Point2D, Size2D},
        value::TypedValue,
    },
};

const RED: [u8; 4] = [255, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];
const CLEAR: [u8; 4] = [0, 0, 0, 0];

fn solid(id: &str, placed: Frame, duration: Frame, color: ColorRgba) -> Clip {
    Clip {
        id: id.to_owned(),
        renderer_id: "solid".to_owned(),
        placed_frame: placed,
        duration_frames: duration,
        keyframes: KeyframeMap::from([(
            "color".to_owned(),
            vec![Keyframe::new(0, TypedValue::ColorRgba(color))],
        )]),
        effects: Vec::new(),
    }
}

fn layer(id: &str, clips: Vec<Clip>) -> Layer {
    Layer {
        id: id.to_owned(),
        name: String::new(),
        clips,
    }
}

fn composition(layers: Vec<Layer>) -> Composition {
    Composition {
        id: "main".to_owned(),
        name: String::new(),
        width: 4,
        height: 4,
        framerate: Fps::whole(30).unwrap(),
        duration_frames: 30,
        sampling_rate: 48_000,
        audio_channels: 2,
        background_color: ColorRgba::new(0.0, 0.0, 0.0, 0.0),
        layers,
    }
}

fn resolver_for(comp: Composition) -> Arc<dyn EntityResolver> {
    Arc::new(ProjectResolver::new(Arc::new(Project {
        assets: Vec::new(),
        compositions: vec![comp],
    })))
}

fn red_under_green() -> Arc<dyn EntityResolver> {
    let mut top = solid("top", 0, 30, ColorRgba::new(0.0, 255.0, 0.0, 1.0));
    top.keyframes.insert(
        "size".to_owned(),
        vec![Keyframe::new(
            0,
            TypedValue::Size2D(Size2D {
                width: 2.0,
                height: 2.0,
            }),
        )],
    );
    resolver_for(composition(vec![
        layer("bg", vec![solid("bottom", 0, 30, ColorRgba::new(255.0, 0.0, 0.0, 1.0))]),
        layer("fg", vec![top]),
    ]))
}

fn builtins() -> PluginRegistry {
    PluginRegistry::with_builtins().unwrap()
}

#[derive(Debug, Default)]
struct Seen {
    frame_on_clip: Frame,
    time_on_clip: f64,
    label: Option<TypedValue>,
    composition_resolved: bool,
    audio_samples: usize,
}

/// Records what it was asked to render and writes one sample into its audio buffer.
#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<Seen>>,
}

impl ClipRenderer for Recorder {
    fn renderer_id(&self) -> &str {
        "recorder"
    }

    fn provide_parameters(&self) -> TypeDescriptor {
        TypeDescriptor::new().string(
            "label",
            ParamOpts::new("Label").default_value(TypedValue::String("none".into())),
        )
    }

    fn render(&self, req: &RenderRequest) -> ReelResult<()> {
        let composition_resolved = req
            .resolver()
            .and_then(|r| r.resolve_composition("main"))
            .is_some();
        let audio_samples = match req.dest_audio_buffer() {
            Some(buf) => buf.with(|b| {
                b.channels[0][0] = 0.25;
                b.len()
            })?,
            None => 0,
        };
        self.seen
            .lock()
            .map_err(|_| ReelError::render("poisoned"))?
            .push(Seen {
                frame_on_clip: req.frame_on_clip(),
                time_on_clip: req.time_on_clip(),
                label: req.param("label").cloned(),
                composition_resolved,
                audio_samples,
            });
        Ok(())
    }
}

struct Logger {
    id: &'static str,
    log: Arc<Mutex<Vec<String>>>,
}

impl EffectProcessor for Logger {
    fn processor_id(&self) -> &str {
        self.id
    }

    fn provide_parameters(&self) -> TypeDescriptor {
        TypeDescriptor::new()
    }

    fn render(&self, req: &RenderRequest) -> ReelResult<()> {
        assert!(req.dest_canvas().is_some());
        self.log
            .lock()
            .map_err(|_| ReelError::render("poisoned"))?
            .push(self.id.to_owned());
        Ok(())
    }
}

#[test]
fn layers_composite_bottom_first() {
    let out = render_frame(
        &red_under_green(),
        "main",
        0,
        &builtins(),
        &RenderOpts::default(),
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(out.frame, 0);
    assert_eq!(out.video.pixel(0, 0), Some(GREEN));
    assert_eq!(out.video.pixel(1, 1), Some(GREEN));
    assert_eq!(out.video.pixel(3, 3), Some(RED));
}

#[test]
fn inactive_clips_are_not_drawn() {
    let resolver = resolver_for(composition(vec![layer(
        "l",
        vec![solid("late", 10, 5, ColorRgba::new(255.0, 0.0, 0.0, 1.0))],
    )]));
    let reg = builtins();
    let opts = RenderOpts::default();
    let cancel = CancelToken::new();

    let before = render_frame(&resolver, "main", 9, &reg, &opts, &cancel).unwrap();
    assert_eq!(before.video.pixel(0, 0), Some(CLEAR));
    let during = render_frame(&resolver, "main", 14, &reg, &opts, &cancel).unwrap();
    assert_eq!(during.video.pixel(0, 0), Some(RED));
    let after = render_frame(&resolver, "main", 15, &reg, &opts, &cancel).unwrap();
    assert_eq!(after.video.pixel(0, 0), Some(CLEAR));
}

#[test]
fn clear_color_overrides_background() {
    let resolver = resolver_for(composition(Vec::new()));
    let opts = RenderOpts {
        clear_rgba: Some([0, 0, 255, 255]),
        ..RenderOpts::default()
    };
    let out = render_frame(&resolver, "main", 0, &builtins(), &opts, &CancelToken::new()).unwrap();
    assert_eq!(out.video.pixel(2, 2), Some([0, 0, 255, 255]));

    let mut comp = composition(Vec::new());
    comp.background_color = ColorRgba::new(255.0, 255.0, 255.0, 0.5);
    let out = render_frame(
        &resolver_for(comp),
        "main",
        0,
        &builtins(),
        &RenderOpts::default(),
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(out.video.pixel(0, 0), Some([128, 128, 128, 128]));
}

#[test]
fn effect_parameters_are_evaluated_on_the_clip_timeline() {
    let mut clip = solid("fade", 10, 20, ColorRgba::new(255.0, 0.0, 0.0, 1.0));
    clip.effects.push(Effect {
        id: "fx".to_owned(),
        processor_id: "opacity".to_owned(),
        keyframes: KeyframeMap::from([(
            "opacity".to_owned(),
            vec![
                Keyframe::new(0, TypedValue::Float(0.0)),
                Keyframe::new(10, TypedValue::Float(100.0)),
            ],
        )]),
    });
    let resolver = resolver_for(composition(vec![layer("l", vec![clip])]));
    let reg = builtins();
    let opts = RenderOpts::default();
    let cancel = CancelToken::new();

    let start = render_frame(&resolver, "main", 10, &reg, &opts, &cancel).unwrap();
    assert_eq!(start.video.pixel(0, 0), Some(CLEAR));

    let mid = render_frame(&resolver, "main", 15, &reg, &opts, &cancel).unwrap();
    let [r, _, _, a] = mid.video.pixel(0, 0).unwrap();
    assert!((120..=135).contains(&a), "alpha {a}");
    assert_eq!(r, a);

    let end = render_frame(&resolver, "main", 25, &reg, &opts, &cancel).unwrap();
    assert_eq!(end.video.pixel(0, 0), Some(RED));
}

#[test]
fn renderer_sees_clip_relative_request() {
    let recorder = Arc::new(Recorder::default());
    let mut reg = PluginRegistry::new();
    reg.register_renderer(recorder.clone()).unwrap();

    let clip = Clip {
        id: "rec".to_owned(),
        renderer_id: "recorder".to_owned(),
        placed_frame: 6,
        duration_frames: 10,
        keyframes: KeyframeMap::from([(
            "label".to_owned(),
            vec![Keyframe::new(0, TypedValue::String("hello".into()))],
        )]),
        effects: Vec::new(),
    };
    let resolver = resolver_for(composition(vec![layer("l", vec![clip])]));
    let out = render_frame(
        &resolver,
        "main",
        9,
        &reg,
        &RenderOpts::default(),
        &CancelToken::new(),
    )
    .unwrap();

    let seen = recorder.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].frame_on_clip, 3);
    assert!((seen[0].time_on_clip - 0.1).abs() < 1e-12);
    assert_eq!(seen[0].label, Some(TypedValue::String("hello".into())));
    assert!(seen[0].composition_resolved);
    assert_eq!(seen[0].audio_samples, 1600);

    let audio = out.audio.unwrap();
    assert_eq!(audio.channel_count(), 2);
    assert_eq!(audio.len(), 1600);
    assert_eq!(audio.channels[0][0], 0.25);
    assert_eq!(audio.channels[1][0], 0.0);
}

#[test]
fn audio_can_be_disabled() {
    let recorder = Arc::new(Recorder::default());
    let mut reg = PluginRegistry::new();
    reg.register_renderer(recorder.clone()).unwrap();
    let clip = Clip {
        id: "rec".to_owned(),
        renderer_id: "recorder".to_owned(),
        placed_frame: 0,
        duration_frames: 30,
        keyframes: KeyframeMap::new(),
        effects: Vec::new(),
    };
    let opts = RenderOpts {
        audio: false,
        ..RenderOpts::default()
    };
    let out = render_frame(
        &resolver_for(composition(vec![layer("l", vec![clip])])),
        "main",
        0,
        &reg,
        &opts,
        &CancelToken::new(),
    )
    .unwrap();
    assert!(out.audio.is_none());

    let seen = recorder.seen.lock().unwrap();
    assert_eq!(seen[0].audio_samples, 0);
    assert_eq!(seen[0].label, Some(TypedValue::String("none".into())));
}

#[test]
fn effects_run_in_declared_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut reg = builtins();
    for id in ["first", "second"] {
        reg.register_processor(Arc::new(Logger {
            id,
            log: Arc::clone(&log),
        }))
        .unwrap();
    }
    let mut clip = solid("c", 0, 30, ColorRgba::new(255.0, 0.0, 0.0, 1.0));
    for id in ["second", "first", "second"] {
        clip.effects.push(Effect {
            id: format!("fx-{id}"),
            processor_id: id.to_owned(),
            keyframes: KeyframeMap::new(),
        });
    }

    render_frame(
        &resolver_for(composition(vec![layer("l", vec![clip])])),
        "main",
        0,
        &reg,
        &RenderOpts::default(),
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(*log.lock().unwrap(), ["second", "first", "second"]);
}

#[test]
fn failing_clips_fail_the_frame_unless_skipped() {
    let mut broken = solid("broken", 0, 30, ColorRgba::new(0.0, 0.0, 255.0, 1.0));
    broken.renderer_id = "missing".to_owned();
    let resolver = resolver_for(composition(vec![
        layer("bg", vec![solid("ok", 0, 30, ColorRgba::new(255.0, 0.0, 0.0, 1.0))]),
        layer("fg", vec![broken]),
    ]));
    let reg = builtins();
    let cancel = CancelToken::new();

    let err = render_frame(&resolver, "main", 0, &reg, &RenderOpts::default(), &cancel).unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));

    let opts = RenderOpts {
        skip_failed_clips: true,
        ..RenderOpts::default()
    };
    let out = render_frame(&resolver, "main", 0, &reg, &opts, &cancel).unwrap();
    assert_eq!(out.video.pixel(0, 0), Some(RED));
}

#[test]
fn cancelled_renders_stop_even_when_skipping_failures() {
    let cancel = CancelToken::new();
    cancel.cancel();
    assert!(cancel.is_cancelled());
    let opts = RenderOpts {
        skip_failed_clips: true,
        ..RenderOpts::default()
    };
    let err = render_frame(&red_under_green(), "main", 0, &builtins(), &opts, &cancel).unwrap_err();
    assert!(matches!(err, ReelError::Cancelled));
}

#[test]
fn parallel_matches_sequential() {
    let resolver = red_under_green();
    let reg = builtins();
    let cancel = CancelToken::new();
    let seq = render_frame(&resolver, "main", 3, &reg, &RenderOpts::default(), &cancel).unwrap();
    let par = render_frame(
        &resolver,
        "main",
        3,
        &reg,
        &RenderOpts {
            parallel: true,
            threads: Some(2),
            ..RenderOpts::default()
        },
        &cancel,
    )
    .unwrap();
    assert_eq!(seq.video, par.video);
}

#[test]
fn zero_threads_is_rejected() {
    let opts = RenderOpts {
        parallel: true,
        threads: Some(0),
        ..RenderOpts::default()
    };
    let err = render_frame(&red_under_green(), "main", 0, &builtins(), &opts, &CancelToken::new())
        .unwrap_err();
    assert!(err.to_string().contains("threads"));
}

#[test]
fn bad_frames_and_ids_are_rejected() {
    let resolver = red_under_green();
    let reg = builtins();
    let opts = RenderOpts::default();
    let cancel = CancelToken::new();
    for f in [-1, 30] {
        let err = render_frame(&resolver, "main", f, &reg, &opts, &cancel).unwrap_err();
        assert!(matches!(err, ReelError::Validation(_)));
    }
    let err = render_frame(&resolver, "nope", 0, &reg, &opts, &cancel).unwrap_err();
    assert!(err.to_string().contains("unknown composition"));
}

#[test]
fn render_frames_covers_the_range() {
    let frames = render_frames(
        &red_under_green(),
        "main",
        FrameRange { start: 2, end: 5 },
        &builtins(),
        &RenderOpts::default(),
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(frames.iter().map(|f| f.frame).collect::<Vec<_>>(), [2, 3, 4]);

    for range in [FrameRange { start: 3, end: 3 }, FrameRange { start: 5, end: 2 }] {
        let err = render_frames(
            &red_under_green(),
            "main",
            range,
            &builtins(),
            &RenderOpts::default(),
            &CancelToken::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ReelError::Validation(_)));
    }
}

#[test]
fn bboxes_come_from_renderers() {
    let mut top = solid("top", 5, 10, ColorRgba::new(0.0, 255.0, 0.0, 1.0));
    top.keyframes.insert(
        "position".to_owned(),
        vec![Keyframe::new(0, TypedValue::Point2D(Point2D { x: 1.0, y: 2.0 }))],
    );
    top.keyframes.insert(
        "size".to_owned(),
        vec![Keyframe::new(
            0,
            TypedValue::Size2D(Size2D {
                width: 3.0,
                height: 1.0,
            }),
        )],
    );
    let resolver = resolver_for(composition(vec![
        layer("bg", vec![solid("bg", 0, 30, ColorRgba::default())]),
        layer("fg", vec![top]),
    ]));

    let boxes = negotiate_bboxes(&resolver, "main", &builtins()).unwrap();
    assert_eq!(boxes.len(), 2);
    let bg = &boxes["bg"];
    assert_eq!((bg.x, bg.y, bg.width, bg.height), (0.0, 0.0, 4.0, 4.0));
    let top = &boxes["top"];
    assert!(top.visible);
    assert_eq!((top.x, top.y, top.width, top.height), (1.0, 2.0, 3.0, 1.0));
}
