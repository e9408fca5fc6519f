use std::{fmt, sync::Arc};

use crate::{
    composition::model::{Asset, Clip, Composition, Project},
    values::value::AssetPointer,
};

/// Lookup of project entities by id, handed to plugins through render requests.
pub trait EntityResolver: Send + Sync + fmt::Debug {
    /// Asset with `asset_id`.
    fn resolve_asset(&self, asset_id: &str) -> Option<&Asset>;
    /// Composition with `composition_id`.
    fn resolve_composition(&self, composition_id: &str) -> Option<&Composition>;
    /// Clip with `clip_id` in any composition.
    fn resolve_clip(&self, clip_id: &str) -> Option<&Clip>;

    /// Follow an ASSET parameter value to its asset.
    fn resolve_pointer(&self, pointer: &AssetPointer) -> Option<&Asset> {
        self.resolve_asset(&pointer.asset_id)
    }
}

/// [`EntityResolver`] over a shared [`Project`].
#[derive(Clone, Debug)]
pub struct ProjectResolver {
    project: Arc<Project>,
}

impl ProjectResolver {
    /// Resolver over `project`.
    pub fn new(project: Arc<Project>) -> Self {
        Self { project }
    }

    /// The underlying project.
    pub fn project(&self) -> &Project {
        &self.project
    }
}

impl EntityResolver for ProjectResolver {
    fn resolve_asset(&self, asset_id: &str) -> Option<&Asset> {
        self.project.asset(asset_id)
    }

    fn resolve_composition(&self, composition_id: &str) -> Option<&Composition> {
        self.project.composition(composition_id)
    }

    fn resolve_clip(&self, clip_id: &str) -> Option<&Clip> {
        self.project.clip(clip_id)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composition/resolver.rs"]
mod tests;
