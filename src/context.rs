//! Import context: the set of schemas discovered in one archive.
//!
//! The context owns the configuration and one schema per imported object.
//! `update(time)` cooks every schema for the requested time; schemas share
//! no state, so they cook in parallel while the call itself stays
//! synchronous. Multiple contexts coexist freely; each owns its providers.

use rayon::prelude::*;

use crate::core::{ImportConfig, Schema};
use crate::geom::{CameraSchema, PointsSchema, PolyMeshSchema, XformSchema};
use crate::util::{Chrono, Result};

/// A schema of any supported kind.
pub enum SchemaKind {
    PolyMesh(PolyMeshSchema),
    Xform(XformSchema),
    Camera(CameraSchema),
    Points(PointsSchema),
}

impl SchemaKind {
    fn as_schema_mut(&mut self) -> &mut dyn Schema {
        match self {
            Self::PolyMesh(s) => s,
            Self::Xform(s) => s,
            Self::Camera(s) => s,
            Self::Points(s) => s,
        }
    }

    fn as_schema(&self) -> &dyn Schema {
        match self {
            Self::PolyMesh(s) => s,
            Self::Xform(s) => s,
            Self::Camera(s) => s,
            Self::Points(s) => s,
        }
    }

    pub fn as_polymesh(&self) -> Option<&PolyMeshSchema> {
        match self {
            Self::PolyMesh(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_xform(&self) -> Option<&XformSchema> {
        match self {
            Self::Xform(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_camera(&self) -> Option<&CameraSchema> {
        match self {
            Self::Camera(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_points(&self) -> Option<&PointsSchema> {
        match self {
            Self::Points(s) => Some(s),
            _ => None,
        }
    }
}

/// One imported object: a name (its archive path) plus its schema.
pub struct SceneObject {
    pub name: String,
    pub schema: SchemaKind,
}

/// Import context over one archive.
pub struct ImportContext {
    config: ImportConfig,
    objects: Vec<SceneObject>,
}

impl ImportContext {
    pub fn new(config: ImportConfig) -> Self {
        Self {
            config,
            objects: Vec::new(),
        }
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Register an object; returns its index.
    pub fn add_object(&mut self, name: impl Into<String>, schema: SchemaKind) -> usize {
        self.objects.push(SceneObject {
            name: name.into(),
            schema,
        });
        self.objects.len() - 1
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn object(&self, index: usize) -> Option<&SceneObject> {
        self.objects.get(index)
    }

    pub fn object_mut(&mut self, index: usize) -> Option<&mut SceneObject> {
        self.objects.get_mut(index)
    }

    /// Cook every schema for `time`. Schemas cook in parallel; a failing
    /// schema keeps its previous sample and is logged, the rest proceed.
    pub fn update(&mut self, time: Chrono) {
        self.objects.par_iter_mut().for_each(|obj| {
            if let Err(e) = obj.schema.as_schema_mut().update_sample(time) {
                log::warn!("update of '{}' failed: {e}", obj.name);
            }
        });
    }

    /// Like `update`, but surfaces the first failure after all schemas ran.
    pub fn try_update(&mut self, time: Chrono) -> Result<()> {
        let errors: Vec<_> = self
            .objects
            .par_iter_mut()
            .filter_map(|obj| obj.schema.as_schema_mut().update_sample(time).err())
            .collect();
        match errors.into_iter().next() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Request a full rebuild of every schema on the next update.
    pub fn mark_force_update(&mut self) {
        for obj in &mut self.objects {
            obj.schema.as_schema_mut().mark_force_update();
        }
    }

    /// Earliest sample time across all schemas.
    pub fn start_time(&self) -> Option<Chrono> {
        self.objects
            .iter()
            .filter_map(|o| o.schema.as_schema().time_range())
            .map(|(start, _)| start)
            .min_by(Chrono::total_cmp)
    }

    /// Latest sample time across all schemas.
    pub fn end_time(&self) -> Option<Chrono> {
        self.objects
            .iter()
            .filter_map(|o| o.schema.as_schema().time_range())
            .map(|(_, end)| end)
            .max_by(Chrono::total_cmp)
    }
}
