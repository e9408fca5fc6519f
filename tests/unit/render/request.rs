use super::*;
use crate::{
    composition::{model::Project, resolver::ProjectResolver},
    foundation::core::Fps,
    render::buffer::{AudioBuffer, FrameRGBA},
};

fn comp(id: &str) -> Arc<Composition> {
    Arc::new(Composition {
        id: id.into(),
        name: String::new(),
        width: 640,
        height: 360,
        framerate: Fps::whole(30).unwrap(),
        duration_frames: 300,
        sampling_rate: 48_000,
        audio_channels: 2,
        background_color: Default::default(),
        layers: Vec::new(),
    })
}

fn resolver() -> Arc<dyn EntityResolver> {
    Arc::new(ProjectResolver::new(Arc::new(Project::default())))
}

fn root_init() -> RenderRequestInit {
    let root = comp("root");
    RenderRequestInit {
        time: 1.0,
        time_on_composition: 1.0,
        frame: 30,
        frame_on_composition: 30,
        dest_canvas: Some(CanvasHandle::new(FrameRGBA::new(4, 4))),
        width: 640,
        height: 360,
        framerate: 30.0,
        duration_frames: 300,
        sampling_rate: 48_000,
        needed_samples: 1_600,
        audio_channels: 2,
        root_composition: Some(Arc::clone(&root)),
        parent_composition: Some(root),
        parameters: ParamValues::from([("opacity".to_owned(), TypedValue::Float(1.0))]),
        resolver: Some(resolver()),
        ..Default::default()
    }
}

#[test]
fn clone_with_overrides_patched_fields_only() {
    let parent = RenderRequest::new(root_init());
    let child = parent.clone_with(RenderRequestPatch {
        frame_on_clip: Some(5),
        time_on_clip: Some(5.0 / 30.0),
        parameters: Some(ParamValues::from([(
            "text".to_owned(),
            TypedValue::String("hi".into()),
        )])),
        ..Default::default()
    });

    assert_eq!(child.frame_on_clip(), 5);
    assert_eq!(child.frame(), 30);
    assert_eq!(child.width(), 640);
    assert_eq!(child.param("text"), Some(&TypedValue::String("hi".into())));
    assert!(child.param("opacity").is_none());
    assert!(child.dest_canvas().unwrap().same(parent.dest_canvas().unwrap()));

    // The parent is untouched.
    assert_eq!(parent.frame_on_clip(), 0);
    assert_eq!(parent.param("opacity"), Some(&TypedValue::Float(1.0)));
    assert!(parent.param("text").is_none());
}

#[test]
fn identity_fields_survive_full_patches() {
    let parent = RenderRequest::new(root_init());

    let mut other = root_init();
    other.root_composition = Some(comp("intruder"));
    other.resolver = Some(resolver());
    other.parent_composition = Some(comp("nested"));
    other.width = 100;
    let child = parent.clone_with(RenderRequestPatch::from(other));

    assert_eq!(child.root_composition().unwrap().id, "root");
    assert!(Arc::ptr_eq(
        child.resolver().unwrap(),
        parent.resolver().unwrap()
    ));
    assert_eq!(child.parent_composition().unwrap().id, "nested");
    assert_eq!(child.width(), 100);
    assert_eq!(parent.width(), 640);
    assert_eq!(parent.parent_composition().unwrap().id, "root");
}

#[test]
fn patched_buffers_replace_shared_ones() {
    let parent = RenderRequest::new(root_init());
    let own = CanvasHandle::new(FrameRGBA::new(4, 4));
    let audio = AudioHandle::new(AudioBuffer::silent(2, 1_600, 48_000));
    let child = parent.clone_with(RenderRequestPatch {
        dest_canvas: Some(own.clone()),
        dest_audio_buffer: Some(audio.clone()),
        is_audio_buffering_needed: Some(true),
        ..Default::default()
    });
    assert!(child.dest_canvas().unwrap().same(&own));
    assert!(child.dest_audio_buffer().unwrap().same(&audio));
    assert!(child.is_audio_buffering_needed());
    assert!(parent.dest_audio_buffer().is_none());
}

#[test]
fn seconds_aliases_time() {
    let req = RenderRequest::new(root_init());
    assert_eq!(req.seconds(), req.time());
}

#[test]
fn pre_rendering_projection_carries_setup_fields() {
    let req = RenderRequest::new(root_init());
    let pre = req.to_pre_rendering_request();
    assert_eq!(pre.width(), 640);
    assert_eq!(pre.height(), 360);
    assert_eq!(pre.framerate(), 30.0);
    assert_eq!(pre.duration_frames(), 300);
    assert_eq!(pre.sampling_rate(), 48_000);
    assert_eq!(pre.audio_buffer_size(), 1_600);
    assert_eq!(pre.audio_channels(), 2);
    assert_eq!(pre.root_composition().unwrap().id, "root");
    assert_eq!(pre.param("opacity"), Some(&TypedValue::Float(1.0)));
    assert!(Arc::ptr_eq(pre.resolver().unwrap(), req.resolver().unwrap()));
}

#[test]
fn pre_render_clone_with_keeps_identity() {
    let pre = PreRenderRequest::new(PreRenderRequestInit {
        width: 10,
        root_composition: Some(comp("root")),
        resolver: Some(resolver()),
        ..Default::default()
    });
    let child = pre.clone_with(PreRenderRequestPatch {
        width: Some(20),
        parent_composition: Some(comp("inner")),
        ..Default::default()
    });
    assert_eq!(child.width(), 20);
    assert_eq!(pre.width(), 10);
    assert_eq!(child.root_composition().unwrap().id, "root");
    assert_eq!(child.parent_composition().unwrap().id, "inner");
    assert!(pre.parent_composition().is_none());
    assert!(Arc::ptr_eq(child.resolver().unwrap(), pre.resolver().unwrap()));
}

#[test]
fn bbox_serde_and_rect() {
    let b: BBox2D =
        serde_json::from_str(r#"{"visible":true,"x":1,"y":2,"width":3,"height":4}"#).unwrap();
    assert_eq!(b.angle_rad, 0.0);
    assert_eq!(b.rect(), kurbo::Rect::new(1.0, 2.0, 4.0, 6.0));
}

#[test]
fn patches_cannot_clear_optional_fields() {
    let parent = RenderRequest::new(RenderRequestInit {
        dest_audio_buffer: Some(AudioHandle::new(AudioBuffer::silent(2, 4, 48_000))),
        ..root_init()
    });
    let child = parent.clone_with(RenderRequestPatch {
        dest_canvas: None,
        dest_audio_buffer: None,
        parent_composition: None,
        ..Default::default()
    });
    assert!(child.dest_canvas().unwrap().same(parent.dest_canvas().unwrap()));
    assert!(
        child
            .dest_audio_buffer()
            .unwrap()
            .same(parent.dest_audio_buffer().unwrap())
    );
    assert_eq!(child.parent_composition().unwrap().id, "root");
}
