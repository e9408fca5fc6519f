use super::*;
use crate::{plugin::descriptor::ParamOpts, values::value::TypedValue};

struct Noop(&'static str);

impl ClipRenderer for Noop {
    fn renderer_id(&self) -> &str {
        self.0
    }

    fn provide_parameters(&self) -> TypeDescriptor {
        TypeDescriptor::new().number("n", ParamOpts::new("N"))
    }

    fn render(&self, _req: &RenderRequest) -> ReelResult<()> {
        Ok(())
    }
}

struct BadDefaults;

impl EffectProcessor for BadDefaults {
    fn processor_id(&self) -> &str {
        "bad"
    }

    fn provide_parameters(&self) -> TypeDescriptor {
        TypeDescriptor::new().number(
            "n",
            ParamOpts::new("N").default_value(TypedValue::String("x".into())),
        )
    }

    fn render(&self, _req: &RenderRequest) -> ReelResult<()> {
        Ok(())
    }
}

#[test]
fn registers_and_looks_up_renderers() {
    let mut reg = PluginRegistry::new();
    reg.register_renderer(Arc::new(Noop("a"))).unwrap();
    reg.register_renderer(Arc::new(Noop("b"))).unwrap();

    let a = reg.renderer("a").unwrap();
    assert_eq!(a.plugin.renderer_id(), "a");
    assert_eq!(a.descriptor.len(), 1);
    assert_eq!(reg.renderer_ids().collect::<Vec<_>>(), ["a", "b"]);
    assert!(matches!(reg.renderer("zzz"), Err(ReelError::Validation(_))));
}

#[test]
fn duplicate_ids_are_rejected() {
    let mut reg = PluginRegistry::new();
    reg.register_renderer(Arc::new(Noop("a"))).unwrap();
    let err = reg.register_renderer(Arc::new(Noop("a"))).unwrap_err();
    assert!(err.to_string().contains("already registered"));
}

#[test]
fn invalid_declarations_are_rejected() {
    let mut reg = PluginRegistry::new();
    let err = reg.register_processor(Arc::new(BadDefaults)).unwrap_err();
    assert!(matches!(err, ReelError::TypeMismatch { .. }));
    assert!(reg.processor("bad").is_err());
}

#[test]
fn builtins_are_available() {
    let reg = PluginRegistry::with_builtins().unwrap();
    assert!(reg.renderer("solid").is_ok());
    assert!(reg.processor("opacity").is_ok());
    assert_eq!(reg.processor_ids().collect::<Vec<_>>(), ["opacity"]);
}
