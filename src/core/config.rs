//! Import configuration.
//!
//! All options are recognized here; unknown options are the host boundary's
//! problem and never reach the core. The config is immutable for the
//! duration of an update.

/// How normals are obtained for imported meshes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NormalsMode {
    /// Use normals stored in the archive, fail soft if absent.
    ReadFromFile,
    /// Use stored normals, compute them when the archive has none.
    #[default]
    ComputeIfMissing,
    /// Always compute normals from positions, ignoring stored data.
    AlwaysCompute,
    /// Do not import or compute normals.
    Ignore,
}

/// How tangents are obtained for imported meshes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TangentsMode {
    /// No tangents.
    #[default]
    None,
    /// Compute tangents from positions, UVs and normals.
    Compute,
}

/// Import configuration shared by every schema of a context.
#[derive(Clone, Debug)]
pub struct ImportConfig {
    pub normals_mode: NormalsMode,
    pub tangents_mode: TangentsMode,
    /// Uniform scale applied to positions and velocities.
    pub scale_factor: f32,
    /// Camera aspect ratio override; values <= 0 keep the stored ratio.
    pub aspect_ratio: f32,
    /// Scales synthesized velocities.
    pub vertex_motion_scale: f32,
    /// Maximum vertices per split. Soft bound: a single face never straddles
    /// two splits even when its vertex count exceeds the unit.
    pub split_unit: usize,
    /// Negate the x component of positions, velocities and normals.
    pub swap_handedness: bool,
    /// Reverse triangle winding.
    pub swap_face_winding: bool,
    /// Interpolate between adjacent samples for intermediate times.
    pub interpolate_samples: bool,
    /// Rotate the quad triangulation diagonal.
    pub turn_quad_edges: bool,
    /// Emit single-vertex faces as point primitives.
    pub import_point_polygon: bool,
    /// Emit two-vertex faces as line primitives.
    pub import_line_polygon: bool,
    /// Emit faces with three or more vertices as triangles.
    pub import_triangle_polygon: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            normals_mode: NormalsMode::ComputeIfMissing,
            tangents_mode: TangentsMode::None,
            scale_factor: 1.0,
            aspect_ratio: -1.0,
            vertex_motion_scale: 1.0,
            split_unit: i32::MAX as usize,
            swap_handedness: true,
            swap_face_winding: false,
            interpolate_samples: true,
            turn_quad_edges: false,
            import_point_polygon: false,
            import_line_polygon: false,
            import_triangle_polygon: true,
        }
    }
}
