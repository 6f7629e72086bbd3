//! # abc-stream
//!
//! Streaming importer for time-sampled 3D scene archives. The archive
//! container is abstracted behind provider traits; this crate resolves
//! requested times against the sample index, refines face-varying mesh data
//! into per-vertex arrays with capacity-bounded splits and per-material
//! submeshes, interpolates between adjacent samples, synthesizes normals,
//! tangents and velocities, and copies the result into caller-owned vertex
//! buffers.
//!
//! ## Modules
//!
//! - [`util`] - Basic types (math, errors)
//! - [`core`] - Configuration, time sampling, provider traits, schema
//!   lifecycle
//! - [`geom`] - Refinement, geometry operations and the schema
//!   implementations
//! - [`context`] - The per-archive schema set and its update entry point
//!
//! ## Example
//!
//! ```ignore
//! use abc_stream::prelude::*;
//!
//! let mut schema = PolyMeshSchema::new(provider, ImportConfig::default());
//! schema.update_sample(1.25)?;
//!
//! let summary = schema.sample_summary();
//! let mut vbs: Vec<PolyMeshData> = make_buffers(&schema.split_summaries());
//! let mut ibs: Vec<SubmeshData> = make_index_buffers(&schema.submesh_summaries());
//! schema.fill_vertex_buffers(&mut vbs, &mut ibs);
//! ```

pub mod context;
pub mod core;
pub mod geom;
pub mod util;

// Re-export commonly used types
pub use context::{ImportContext, SceneObject, SchemaKind};
pub use core::{ImportConfig, MeshProvider, Schema};
pub use util::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::context::{ImportContext, SceneObject, SchemaKind};
    pub use crate::core::{
        ChannelInfo, ImportConfig, IndexedSample, MeshChannel, MeshProvider, NormalsMode,
        PropertyValue, Schema, TangentsMode, TimeSampling, TopologyVariance,
    };
    pub use crate::geom::{
        CameraData, CameraProvider, CameraSchema, MeshSampleSummary, MeshSplitSummary,
        ObjectVisibility, PointsProvider, PointsSchema, PolyMeshData, PolyMeshSchema,
        SubmeshData, SubmeshSummary, SubmeshTopology, XformData, XformProvider, XformSchema,
    };
    pub use crate::util::{BBox3f, Chrono, Error, Result};
}
