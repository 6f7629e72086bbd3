//! Geometry layer: refinement, element-wise operations and the schema
//! implementations (polymesh, xform, camera, points).

pub mod camera;
pub mod ops;
pub mod points;
pub mod polymesh;
pub mod refiner;
pub mod summary;
pub mod visibility;
pub mod xform;

// Re-export refiner types
pub use refiner::{AttributeHandle, MeshRefiner, Split, Submesh, SubmeshTopology};

// Re-export summary types
pub use summary::{ChannelPlan, CookPlan, FrameChange, MeshSummary};

// Re-export polymesh types
pub use polymesh::{
    MeshSampleSummary, MeshSplitSummary, MeshTopology, PolyMeshData, PolyMeshSchema,
    SubmeshData, SubmeshSummary,
};

// Re-export xform types
pub use xform::{XformData, XformProvider, XformSchema};

// Re-export camera types
pub use camera::{CameraData, CameraProvider, CameraSchema};

// Re-export points types
pub use points::{PointsProvider, PointsSchema, PointsSummary};

// Re-export visibility types
pub use visibility::ObjectVisibility;
