use std::{collections::BTreeMap, sync::Arc};

use crate::{
    foundation::error::{ReelError, ReelResult},
    plugin::descriptor::TypeDescriptor,
    render::request::{BBox2D, PreRenderRequest, RenderRequest},
};

/// Draws one clip into the request's destination canvas (and audio buffer, when asked).
pub trait ClipRenderer: Send + Sync {
    /// Id clips reference through `renderer_id`.
    fn renderer_id(&self) -> &str;

    /// Parameters the renderer consumes. Called once at registration.
    fn provide_parameters(&self) -> TypeDescriptor;

    /// Bounds of the clip's output. Defaults to the whole canvas.
    fn bbox(&self, req: &PreRenderRequest) -> ReelResult<BBox2D> {
        Ok(BBox2D {
            visible: true,
            x: 0.0,
            y: 0.0,
            width: f64::from(req.width()),
            height: f64::from(req.height()),
            angle_rad: 0.0,
        })
    }

    /// Draw into the request's destination canvas and audio buffer.
    fn render(&self, req: &RenderRequest) -> ReelResult<()>;
}

/// Post-processes a clip's canvas in place.
pub trait EffectProcessor: Send + Sync {
    /// Id effects reference through `processor_id`.
    fn processor_id(&self) -> &str;

    /// Parameters the processor consumes. Called once at registration.
    fn provide_parameters(&self) -> TypeDescriptor;

    /// Rewrite the request's destination canvas in place.
    fn render(&self, req: &RenderRequest) -> ReelResult<()>;
}

/// A registered plugin with the parameter declarations it provided.
pub struct Registered<P: ?Sized> {
    /// The plugin.
    pub plugin: Arc<P>,
    /// Its validated parameter declarations.
    pub descriptor: TypeDescriptor,
}

/// Renderers and effect processors keyed by id.
#[derive(Default)]
pub struct PluginRegistry {
    renderers: BTreeMap<String, Registered<dyn ClipRenderer>>,
    processors: BTreeMap<String, Registered<dyn EffectProcessor>>,
}

impl PluginRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in plugins.
    pub fn with_builtins() -> ReelResult<Self> {
        let mut registry = Self::new();
        crate::plugin::builtin::register_all(&mut registry)?;
        Ok(registry)
    }

    /// Register a renderer. Its parameter declarations are validated here.
    pub fn register_renderer(&mut self, plugin: Arc<dyn ClipRenderer>) -> ReelResult<()> {
        let id = plugin.renderer_id().to_owned();
        if self.renderers.contains_key(&id) {
            return Err(ReelError::validation(format!(
                "renderer '{id}' is already registered"
            )));
        }
        let descriptor = plugin.provide_parameters();
        descriptor.validate()?;
        tracing::debug!(renderer = %id, params = descriptor.len(), "registered renderer");
        self.renderers.insert(id, Registered { plugin, descriptor });
        Ok(())
    }

    /// Register an effect processor; duplicate ids are rejected.
    pub fn register_processor(&mut self, plugin: Arc<dyn EffectProcessor>) -> ReelResult<()> {
        let id = plugin.processor_id().to_owned();
        if self.processors.contains_key(&id) {
            return Err(ReelError::validation(format!(
                "effect processor '{id}' is already registered"
            )));
        }
        let descriptor = plugin.provide_parameters();
        descriptor.validate()?;
        tracing::debug!(processor = %id, params = descriptor.len(), "registered effect processor");
        self.processors.insert(id, Registered { plugin, descriptor });
        Ok(())
    }

    /// Renderer with `id`.
    pub fn renderer(&self, id: &str) -> ReelResult<&Registered<dyn ClipRenderer>> {
        self.renderers
            .get(id)
            .ok_or_else(|| ReelError::validation(format!("unknown renderer '{id}'")))
    }

    /// Effect processor with `id`.
    pub fn processor(&self, id: &str) -> ReelResult<&Registered<dyn EffectProcessor>> {
        self.processors
            .get(id)
            .ok_or_else(|| ReelError::validation(format!("unknown effect processor '{id}'")))
    }

    /// Registered renderer ids in sorted order.
    pub fn renderer_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.renderers.keys().map(String::as_str)
    }

    /// Registered processor ids in sorted order.
    pub fn processor_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.processors.keys().map(String::as_str)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/plugin/registry.rs"]
mod tests;
