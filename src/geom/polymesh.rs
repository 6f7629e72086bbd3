//! Polygon-mesh schema: sample store, cooker and vertex buffer filler.
//!
//! The cooker resolves a requested time to a sample index plus weight,
//! pulls raw samples through the per-schema store, refines topology when it
//! changes, remaps attributes through the refiner's tables, interpolates or
//! synthesizes derived channels, and publishes the result as the current
//! read view. Per-frame buffers are owned here and reused across frames
//! when topology is non-varying; constant channels are cooked once and kept
//! on the schema.

use std::sync::Arc;

use crate::core::{
    ImportConfig, IndexedSample, MeshProvider, Schema, TopologyVariance,
};
use crate::geom::ops;
use crate::geom::refiner::{AttributeHandle, MeshRefiner, Split, SubmeshTopology};
use crate::geom::summary::{CookPlan, FrameChange, MeshSummary};
use crate::geom::visibility::ObjectVisibility;
use crate::util::math::{Vec2, Vec3, Vec4};
use crate::util::{BBox3f, Chrono, Error, Result};

// ============================================================================
// Sample store
// ============================================================================

/// Lazy per-channel cache slot keyed by sample index.
struct Slot<T> {
    index: Option<usize>,
    data: Option<T>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            index: None,
            data: None,
        }
    }
}

impl<T> Slot<T> {
    fn is_empty(&self) -> bool {
        self.data.is_none()
    }

    fn get(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// Return the cached sample for `index`, fetching it when the slot is
    /// empty or holds a different index.
    fn fetch(&mut self, index: usize, f: impl FnOnce(usize) -> Result<T>) -> Result<&T> {
        if self.index != Some(index) || self.data.is_none() {
            let data = f(index)?;
            self.data = Some(data);
            self.index = Some(index);
        }
        match self.data.as_ref() {
            Some(d) => Ok(d),
            None => Err(Error::internal("sample slot empty after fetch")),
        }
    }
}

/// Raw samples for the current cook: floor index plus, for interpolated
/// channels, the next index.
#[derive(Default)]
struct SampleStore {
    counts: Slot<Arc<Vec<i32>>>,
    indices: Slot<Arc<Vec<i32>>>,
    face_sets: Slot<Vec<Arc<Vec<i32>>>>,
    points: Slot<Arc<Vec<Vec3>>>,
    points_next: Slot<Arc<Vec<Vec3>>>,
    velocities: Slot<Arc<Vec<Vec3>>>,
    normals: Slot<IndexedSample<Vec3>>,
    normals_next: Slot<IndexedSample<Vec3>>,
    uv0: Slot<IndexedSample<Vec2>>,
    uv0_next: Slot<IndexedSample<Vec2>>,
    uv1: Slot<IndexedSample<Vec2>>,
    uv1_next: Slot<IndexedSample<Vec2>>,
    rgba: Slot<IndexedSample<Vec4>>,
    rgba_next: Slot<IndexedSample<Vec4>>,
    rgb: Slot<IndexedSample<Vec3>>,
    rgb_next: Slot<IndexedSample<Vec3>>,
    bounds: Slot<Option<BBox3f>>,
}

// ============================================================================
// Topology state
// ============================================================================

/// Refined topology shared by the cooked samples of a schema. Rebuilt when
/// the archive topology varies or a force update is requested.
#[derive(Default)]
pub struct MeshTopology {
    pub(crate) refiner: MeshRefiner,
    material_ids: Vec<i32>,
    remap_points: Vec<i32>,
    remap_normals: Vec<i32>,
    remap_uv0: Vec<i32>,
    remap_uv1: Vec<i32>,
    remap_rgba: Vec<i32>,
    remap_rgb: Vec<i32>,
    vertex_count: usize,
    index_count: usize,
}

impl MeshTopology {
    pub fn split_count(&self) -> usize {
        self.refiner.splits.len()
    }

    pub fn submesh_count(&self) -> usize {
        self.refiner.submeshes.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn index_count(&self) -> usize {
        self.index_count
    }

    pub fn split_vertex_count(&self, split_index: usize) -> usize {
        self.refiner
            .splits
            .get(split_index)
            .map(|s| s.vertex_count)
            .unwrap_or(0)
    }
}

// ============================================================================
// Cooked sample
// ============================================================================

/// Where a cooked channel's current array lives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Binding {
    /// Channel absent for this topology.
    #[default]
    None,
    /// Schema-owned constant storage.
    Constant,
    /// The sample's per-frame buffer.
    Sample,
    /// The sample's interpolation buffer.
    Interpolated,
}

/// Per-frame cooked buffers. Reused in place across frames when topology is
/// non-varying.
#[derive(Default)]
struct MeshSample {
    points: Vec<Vec3>,
    points_next: Vec<Vec3>,
    points_int: Vec<Vec3>,
    points_prev: Vec<Vec3>,
    velocities: Vec<Vec3>,
    normals: Vec<Vec3>,
    normals_next: Vec<Vec3>,
    normals_int: Vec<Vec3>,
    tangents: Vec<Vec4>,
    uv0: Vec<Vec2>,
    uv0_next: Vec<Vec2>,
    uv0_int: Vec<Vec2>,
    uv1: Vec<Vec2>,
    uv1_next: Vec<Vec2>,
    uv1_int: Vec<Vec2>,
    rgba: Vec<Vec4>,
    rgba_next: Vec<Vec4>,
    rgba_int: Vec<Vec4>,
    rgb: Vec<Vec3>,
    rgb_next: Vec<Vec3>,
    rgb_int: Vec<Vec3>,

    bind_points: Binding,
    bind_velocities: Binding,
    bind_normals: Binding,
    bind_tangents: Binding,
    bind_uv0: Binding,
    bind_uv1: Binding,
    bind_rgba: Binding,
    bind_rgb: Binding,

    bounds: Option<BBox3f>,
    visibility: ObjectVisibility,
    topology_changed: bool,
}

/// Constant channels, cooked once and shared by every frame.
#[derive(Default)]
struct ConstantStore {
    points: Vec<Vec3>,
    velocities: Vec<Vec3>,
    normals: Vec<Vec3>,
    tangents: Vec<Vec4>,
    uv0: Vec<Vec2>,
    uv1: Vec<Vec2>,
    rgba: Vec<Vec4>,
    rgb: Vec<Vec3>,
}

/// Aggregate counts of the current cooked sample.
#[derive(Clone, Copy, Debug, Default)]
pub struct MeshSampleSummary {
    pub split_count: usize,
    pub submesh_count: usize,
    pub vertex_count: usize,
    pub index_count: usize,
    pub topology_changed: bool,
    pub visibility: ObjectVisibility,
}

/// Per-split descriptor of the current cooked sample.
#[derive(Clone, Copy, Debug, Default)]
pub struct MeshSplitSummary {
    pub submesh_count: usize,
    pub submesh_offset: usize,
    pub vertex_count: usize,
    pub vertex_offset: usize,
    pub index_count: usize,
    pub index_offset: usize,
}

/// Per-submesh descriptor of the current cooked sample.
#[derive(Clone, Copy, Debug)]
pub struct SubmeshSummary {
    pub split_index: usize,
    pub submesh_index: usize,
    pub index_count: usize,
    pub index_offset: usize,
    pub topology: SubmeshTopology,
}

// ============================================================================
// Filler output structs
// ============================================================================

/// Caller-owned per-split output buffers. Absent channels in the cooked
/// sample zero-fill the corresponding buffer; RGB promotes to RGBA with
/// w = 1. `center`/`extents` are written from the split's points.
#[derive(Default)]
pub struct PolyMeshData<'a> {
    pub points: Option<&'a mut [Vec3]>,
    pub velocities: Option<&'a mut [Vec3]>,
    pub normals: Option<&'a mut [Vec3]>,
    pub tangents: Option<&'a mut [Vec4]>,
    pub uv0: Option<&'a mut [Vec2]>,
    pub uv1: Option<&'a mut [Vec2]>,
    pub rgba: Option<&'a mut [Vec4]>,
    pub rgb: Option<&'a mut [Vec4]>,
    pub center: Vec3,
    pub extents: Vec3,
}

/// Caller-owned per-submesh index buffer.
#[derive(Default)]
pub struct SubmeshData<'a> {
    pub indices: Option<&'a mut [i32]>,
}

fn copy_or_clear<T: Copy + Default>(dst: Option<&mut [T]>, src: &[T], split: &Split) {
    let Some(dst) = dst else { return };
    let n = split.vertex_count.min(dst.len());
    let start = split.vertex_offset;
    if src.len() >= start + n {
        dst[..n].copy_from_slice(&src[start..start + n]);
    } else {
        dst[..n].fill(T::default());
    }
}

fn copy_or_clear_3_to_4(dst: Option<&mut [Vec4]>, src: &[Vec3], split: &Split) {
    let Some(dst) = dst else { return };
    let n = split.vertex_count.min(dst.len());
    let start = split.vertex_offset;
    if src.len() >= start + n {
        for (d, s) in dst[..n].iter_mut().zip(&src[start..start + n]) {
            *d = Vec4::new(s.x, s.y, s.z, 1.0);
        }
    } else {
        dst[..n].fill(Vec4::ZERO);
    }
}

// ============================================================================
// Schema
// ============================================================================

/// Cook state of a mesh schema.
#[derive(Clone, Copy, Debug, PartialEq)]
enum CookState {
    /// No sample cooked yet.
    Fresh,
    /// Cooked for the given (index, weight) pair.
    Ready { index: usize, weight: f32 },
    /// Caller requested a full rebuild on the next update.
    ForceUpdate,
}

/// Polygon-mesh schema, one per mesh object discovered in the archive.
pub struct PolyMeshSchema {
    provider: Box<dyn MeshProvider>,
    config: ImportConfig,
    summary: MeshSummary,
    varying_topology: bool,
    topology: MeshTopology,
    store: SampleStore,
    constant: ConstantStore,
    sample: MeshSample,
    state: CookState,
    data_updated: bool,
}

/// Register a face-varying attribute against the refiner, choosing the
/// indexing form by length. Sources matching neither the corner count nor
/// the point count are dropped for this topology.
fn register_attr<T: bytemuck::Pod>(
    refiner: &mut MeshRefiner,
    name: &'static str,
    sp: &IndexedSample<T>,
    n_corners: usize,
    n_points: usize,
) -> Option<AttributeHandle> {
    if let Some(idx) = &sp.indices {
        if idx.len() == n_corners {
            return Some(refiner.add_indexed_attribute(idx));
        }
    }
    if sp.values.len() == n_corners {
        Some(refiner.add_expanded_attribute(&sp.values))
    } else if sp.values.len() == n_points {
        Some(refiner.add_vertex_attribute())
    } else {
        log::warn!(
            "{}",
            Error::InvalidAttribute {
                name,
                values: sp.values.len(),
                corners: n_corners,
                points: n_points,
            }
        );
        None
    }
}

impl PolyMeshSchema {
    /// Create a schema over a provider. The summary is planned immediately;
    /// topology state is built lazily on the first update.
    pub fn new(provider: Box<dyn MeshProvider>, config: ImportConfig) -> Self {
        let summary = MeshSummary::plan(provider.as_ref(), &config);
        let varying_topology = summary.topology_variance == TopologyVariance::Heterogeneous;
        Self {
            provider,
            config,
            summary,
            varying_topology,
            topology: MeshTopology::default(),
            store: SampleStore::default(),
            constant: ConstantStore::default(),
            sample: MeshSample::default(),
            state: CookState::Fresh,
            data_updated: false,
        }
    }

    pub fn summary(&self) -> &MeshSummary {
        &self.summary
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    pub fn topology(&self) -> &MeshTopology {
        &self.topology
    }

    // ------------------------------------------------------------------
    // Cooked-sample surface
    // ------------------------------------------------------------------

    pub fn sample_summary(&self) -> MeshSampleSummary {
        MeshSampleSummary {
            split_count: self.topology.split_count(),
            submesh_count: self.topology.submesh_count(),
            vertex_count: self.topology.vertex_count(),
            index_count: self.topology.index_count(),
            topology_changed: self.sample.topology_changed,
            visibility: self.sample.visibility,
        }
    }

    pub fn split_summaries(&self) -> Vec<MeshSplitSummary> {
        self.topology
            .refiner
            .splits
            .iter()
            .map(|s| MeshSplitSummary {
                submesh_count: s.submesh_count,
                submesh_offset: s.submesh_offset,
                vertex_count: s.vertex_count,
                vertex_offset: s.vertex_offset,
                index_count: s.index_count,
                index_offset: s.index_offset,
            })
            .collect()
    }

    pub fn submesh_summaries(&self) -> Vec<SubmeshSummary> {
        self.topology
            .refiner
            .submeshes
            .iter()
            .map(|s| SubmeshSummary {
                split_index: s.split_index,
                submesh_index: s.submesh_index,
                index_count: s.index_count,
                index_offset: s.index_offset,
                topology: s.topology,
            })
            .collect()
    }

    pub fn points(&self) -> &[Vec3] {
        match self.sample.bind_points {
            Binding::None => &[],
            Binding::Constant => &self.constant.points,
            Binding::Sample => &self.sample.points,
            Binding::Interpolated => &self.sample.points_int,
        }
    }

    pub fn velocities(&self) -> &[Vec3] {
        match self.sample.bind_velocities {
            Binding::Constant => &self.constant.velocities,
            Binding::Sample | Binding::Interpolated => &self.sample.velocities,
            Binding::None => &[],
        }
    }

    pub fn normals(&self) -> &[Vec3] {
        match self.sample.bind_normals {
            Binding::None => &[],
            Binding::Constant => &self.constant.normals,
            Binding::Sample => &self.sample.normals,
            Binding::Interpolated => &self.sample.normals_int,
        }
    }

    pub fn tangents(&self) -> &[Vec4] {
        match self.sample.bind_tangents {
            Binding::Constant => &self.constant.tangents,
            Binding::Sample | Binding::Interpolated => &self.sample.tangents,
            Binding::None => &[],
        }
    }

    pub fn uv0(&self) -> &[Vec2] {
        match self.sample.bind_uv0 {
            Binding::None => &[],
            Binding::Constant => &self.constant.uv0,
            Binding::Sample => &self.sample.uv0,
            Binding::Interpolated => &self.sample.uv0_int,
        }
    }

    pub fn uv1(&self) -> &[Vec2] {
        match self.sample.bind_uv1 {
            Binding::None => &[],
            Binding::Constant => &self.constant.uv1,
            Binding::Sample => &self.sample.uv1,
            Binding::Interpolated => &self.sample.uv1_int,
        }
    }

    pub fn rgba(&self) -> &[Vec4] {
        match self.sample.bind_rgba {
            Binding::None => &[],
            Binding::Constant => &self.constant.rgba,
            Binding::Sample => &self.sample.rgba,
            Binding::Interpolated => &self.sample.rgba_int,
        }
    }

    pub fn rgb(&self) -> &[Vec3] {
        match self.sample.bind_rgb {
            Binding::None => &[],
            Binding::Constant => &self.constant.rgb,
            Binding::Sample => &self.sample.rgb,
            Binding::Interpolated => &self.sample.rgb_int,
        }
    }

    /// Triangulated indices, rebased per split.
    pub fn indices(&self) -> &[i32] {
        &self.topology.refiner.new_indices_tri
    }

    pub fn bounds(&self) -> Option<BBox3f> {
        self.sample.bounds
    }

    /// Names of user-defined properties on this schema.
    pub fn property_names(&self) -> Vec<String> {
        self.provider.property_names()
    }

    /// Read a user property at the currently cooked sample index.
    pub fn property(&self, name: &str) -> Result<crate::core::PropertyValue> {
        let index = match self.state {
            CookState::Ready { index, .. } => index,
            _ => 0,
        };
        self.provider.property(name, index)
    }

    // ------------------------------------------------------------------
    // Vertex buffer filler
    // ------------------------------------------------------------------

    /// Copy every split's vertex data and every submesh's indices into the
    /// caller's buffers. Performs no allocation.
    pub fn fill_vertex_buffers(&self, vbs: &mut [PolyMeshData], ibs: &mut [SubmeshData]) {
        for (spi, vb) in vbs.iter_mut().enumerate().take(self.topology.split_count()) {
            self.fill_split_vertices(spi, vb);
        }
        for (smi, ib) in ibs.iter_mut().enumerate().take(self.topology.submesh_count()) {
            self.fill_submesh_indices(smi, ib);
        }
    }

    /// Copy one split's slice of every channel into `data`.
    pub fn fill_split_vertices(&self, split_index: usize, data: &mut PolyMeshData) {
        let Some(split) = self.topology.refiner.splits.get(split_index).copied() else {
            return;
        };
        if split.vertex_count == 0 {
            return;
        }

        let src = self.points();
        copy_or_clear(data.points.as_deref_mut(), src, &split);
        if data.points.is_some() && src.len() >= split.vertex_offset + split.vertex_count {
            let slice = &src[split.vertex_offset..split.vertex_offset + split.vertex_count];
            if let Some((bbmin, bbmax)) = ops::min_max(slice) {
                data.center = (bbmin + bbmax) * 0.5;
                data.extents = bbmax - bbmin;
            }
        }

        // Velocities can be empty even when the summary reports them
        // (synthesis enabled, first frame): they zero-fill like any other
        // absent channel.
        copy_or_clear(data.velocities.as_deref_mut(), self.velocities(), &split);
        copy_or_clear(data.normals.as_deref_mut(), self.normals(), &split);
        copy_or_clear(data.tangents.as_deref_mut(), self.tangents(), &split);
        copy_or_clear(data.uv0.as_deref_mut(), self.uv0(), &split);
        copy_or_clear(data.uv1.as_deref_mut(), self.uv1(), &split);
        copy_or_clear(data.rgba.as_deref_mut(), self.rgba(), &split);
        copy_or_clear_3_to_4(data.rgb.as_deref_mut(), self.rgb(), &split);
    }

    /// Copy one submesh's indices into `data`.
    pub fn fill_submesh_indices(&self, submesh_index: usize, data: &mut SubmeshData) {
        let Some(dst) = data.indices.as_deref_mut() else {
            return;
        };
        let Some(sm) = self.topology.refiner.submeshes.get(submesh_index) else {
            return;
        };
        let n = sm.index_count.min(dst.len());
        let src = &self.topology.refiner.new_indices_submeshes[sm.index_offset..sm.index_offset + n];
        dst[..n].copy_from_slice(src);
    }

    // ------------------------------------------------------------------
    // Cooking
    // ------------------------------------------------------------------

    fn read_raw(&mut self, plan: &CookPlan, index: usize, num_samples: usize) -> Result<()> {
        let next_index = (index + 1).min(num_samples.saturating_sub(1));
        let provider = self.provider.as_ref();

        if plan.fetch_topology || self.store.counts.is_empty() {
            if self.summary.has_counts {
                self.store.counts.fetch(index, |i| provider.counts(i))?;
            }
            if self.summary.has_indices {
                self.store.indices.fetch(index, |i| provider.face_indices(i))?;
            }
            if provider.num_face_sets() > 0 {
                self.store.face_sets.fetch(index, |i| {
                    (0..provider.num_face_sets())
                        .map(|fsi| provider.face_set(fsi, i))
                        .collect()
                })?;
            }
        }

        if plan.points.fetch && (!self.summary.constant_points || self.constant.points.is_empty()) {
            self.store.points.fetch(index, |i| provider.points(i))?;
            if plan.points.fetch_next {
                self.store.points_next.fetch(next_index, |i| provider.points(i))?;
            }
        }

        if plan.velocities.fetch && self.constant.velocities.is_empty() {
            self.store.velocities.fetch(index, |i| provider.velocities(i))?;
        }

        if plan.normals.fetch && (!self.summary.constant_normals || self.constant.normals.is_empty() || plan.refine) {
            self.store.normals.fetch(index, |i| provider.normals(i))?;
            if plan.normals.fetch_next {
                self.store.normals_next.fetch(next_index, |i| provider.normals(i))?;
            }
        }

        if plan.uv0.fetch && (!self.summary.constant_uv0 || self.constant.uv0.is_empty() || plan.refine) {
            self.store.uv0.fetch(index, |i| provider.uv0(i))?;
            if plan.uv0.fetch_next {
                self.store.uv0_next.fetch(next_index, |i| provider.uv0(i))?;
            }
        }

        if plan.uv1.fetch && (!self.summary.constant_uv1 || self.constant.uv1.is_empty() || plan.refine) {
            self.store.uv1.fetch(index, |i| provider.uv1(i))?;
            if plan.uv1.fetch_next {
                self.store.uv1_next.fetch(next_index, |i| provider.uv1(i))?;
            }
        }

        if plan.rgba.fetch && (!self.summary.constant_rgba || self.constant.rgba.is_empty() || plan.refine) {
            self.store.rgba.fetch(index, |i| provider.rgba(i))?;
            if plan.rgba.fetch_next {
                self.store.rgba_next.fetch(next_index, |i| provider.rgba(i))?;
            }
        }

        if plan.rgb.fetch && (!self.summary.constant_rgb || self.constant.rgb.is_empty() || plan.refine) {
            self.store.rgb.fetch(index, |i| provider.rgb(i))?;
            if plan.rgb.fetch_next {
                self.store.rgb_next.fetch(next_index, |i| provider.rgb(i))?;
            }
        }

        self.store.bounds.fetch(index, |i| Ok(provider.self_bounds(i)))?;
        Ok(())
    }

    /// Rebuild the refined topology and every remap table, then cook each
    /// channel through its new table.
    fn on_topology_change(&mut self) {
        let (Some(counts), Some(indices), Some(points)) = (
            self.store.counts.get().cloned(),
            self.store.indices.get().cloned(),
            self.store.points.get().cloned(),
        ) else {
            return;
        };

        let n_corners = indices.len();
        let n_points = points.len();

        {
            let refiner = &mut self.topology.refiner;
            refiner.prepare(counts.clone(), indices.clone(), points.clone());
            refiner.split_unit = self.config.split_unit;
            refiner.gen_points = self.config.import_point_polygon;
            refiner.gen_lines = self.config.import_line_polygon;
            refiner.gen_triangles = self.config.import_triangle_polygon;
            refiner.turn_quad_edges = self.config.turn_quad_edges;
            refiner.swap_face_winding = self.config.swap_face_winding;
        }

        let normals_sp = self.store.normals.get().cloned();
        let uv0_sp = self.store.uv0.get().cloned();
        let uv1_sp = self.store.uv1.get().cloned();
        let rgba_sp = self.store.rgba.get().cloned();
        let rgb_sp = self.store.rgb.get().cloned();

        let read_normals = !self.summary.compute_normals;
        let h_normals = normals_sp.as_ref().filter(|_| read_normals).and_then(|sp| {
            register_attr(&mut self.topology.refiner, "normals", sp, n_corners, n_points)
        });
        let h_uv0 = uv0_sp
            .as_ref()
            .and_then(|sp| register_attr(&mut self.topology.refiner, "uv0", sp, n_corners, n_points));
        let h_uv1 = uv1_sp
            .as_ref()
            .and_then(|sp| register_attr(&mut self.topology.refiner, "uv1", sp, n_corners, n_points));
        let h_rgba = rgba_sp
            .as_ref()
            .and_then(|sp| register_attr(&mut self.topology.refiner, "rgba", sp, n_corners, n_points));
        let h_rgb = rgb_sp
            .as_ref()
            .and_then(|sp| register_attr(&mut self.topology.refiner, "rgb", sp, n_corners, n_points));

        self.topology.refiner.refine();

        // Face sets assign a material id per face; without them one split is
        // one submesh.
        let face_sets = self.store.face_sets.get().cloned().unwrap_or_default();
        if !face_sets.is_empty() {
            self.topology.material_ids.clear();
            self.topology.material_ids.resize(counts.len(), -1);
            for (fsi, faces) in face_sets.iter().enumerate() {
                for &f in faces.iter() {
                    if f < 0 {
                        continue;
                    }
                    if let Some(slot) = self.topology.material_ids.get_mut(f as usize) {
                        *slot = fsi as i32;
                    }
                }
            }
            let material_ids = std::mem::take(&mut self.topology.material_ids);
            self.topology.refiner.gen_submeshes(Some(&material_ids));
            self.topology.material_ids = material_ids;
        } else {
            self.topology.refiner.gen_submeshes(None);
        }

        self.topology.vertex_count = self.topology.refiner.vertex_count();
        self.topology.index_count = self.topology.refiner.index_count();
        self.topology.remap_points = std::mem::take(&mut self.topology.refiner.new2old_points);

        // Points come straight out of the refiner in output order.
        {
            let new_points = std::mem::take(&mut self.topology.refiner.new_points);
            let dst = if self.summary.constant_points {
                &mut self.constant.points
            } else {
                &mut self.sample.points
            };
            *dst = new_points;
            if self.config.swap_handedness {
                ops::swap_handedness(dst);
            }
            if self.config.scale_factor != 1.0 {
                ops::apply_scale(dst, self.config.scale_factor);
            }
            self.sample.bind_points = if self.summary.constant_points {
                Binding::Constant
            } else {
                Binding::Sample
            };
        }

        match (h_normals, normals_sp) {
            (Some(h), Some(sp)) => {
                self.topology.remap_normals = self.topology.refiner.take_remap(h);
                let dst = if self.summary.constant_normals {
                    &mut self.constant.normals
                } else {
                    &mut self.sample.normals
                };
                ops::remap(dst, &sp.values, &self.topology.remap_normals);
                if self.config.swap_handedness {
                    ops::swap_handedness(dst);
                }
                self.sample.bind_normals = if self.summary.constant_normals {
                    Binding::Constant
                } else {
                    Binding::Sample
                };
            }
            _ => {
                self.topology.remap_normals.clear();
                self.sample.bind_normals = Binding::None;
            }
        }

        match (h_uv0, uv0_sp) {
            (Some(h), Some(sp)) => {
                self.topology.remap_uv0 = self.topology.refiner.take_remap(h);
                let dst = if self.summary.constant_uv0 {
                    &mut self.constant.uv0
                } else {
                    &mut self.sample.uv0
                };
                ops::remap(dst, &sp.values, &self.topology.remap_uv0);
                self.sample.bind_uv0 = if self.summary.constant_uv0 {
                    Binding::Constant
                } else {
                    Binding::Sample
                };
            }
            _ => {
                self.topology.remap_uv0.clear();
                self.sample.bind_uv0 = Binding::None;
            }
        }

        match (h_uv1, uv1_sp) {
            (Some(h), Some(sp)) => {
                self.topology.remap_uv1 = self.topology.refiner.take_remap(h);
                let dst = if self.summary.constant_uv1 {
                    &mut self.constant.uv1
                } else {
                    &mut self.sample.uv1
                };
                ops::remap(dst, &sp.values, &self.topology.remap_uv1);
                self.sample.bind_uv1 = if self.summary.constant_uv1 {
                    Binding::Constant
                } else {
                    Binding::Sample
                };
            }
            _ => {
                self.topology.remap_uv1.clear();
                self.sample.bind_uv1 = Binding::None;
            }
        }

        match (h_rgba, rgba_sp) {
            (Some(h), Some(sp)) => {
                self.topology.remap_rgba = self.topology.refiner.take_remap(h);
                let dst = if self.summary.constant_rgba {
                    &mut self.constant.rgba
                } else {
                    &mut self.sample.rgba
                };
                ops::remap(dst, &sp.values, &self.topology.remap_rgba);
                self.sample.bind_rgba = if self.summary.constant_rgba {
                    Binding::Constant
                } else {
                    Binding::Sample
                };
            }
            _ => {
                self.topology.remap_rgba.clear();
                self.sample.bind_rgba = Binding::None;
            }
        }

        match (h_rgb, rgb_sp) {
            (Some(h), Some(sp)) => {
                self.topology.remap_rgb = self.topology.refiner.take_remap(h);
                let dst = if self.summary.constant_rgb {
                    &mut self.constant.rgb
                } else {
                    &mut self.sample.rgb
                };
                ops::remap(dst, &sp.values, &self.topology.remap_rgb);
                self.sample.bind_rgb = if self.summary.constant_rgb {
                    Binding::Constant
                } else {
                    Binding::Sample
                };
            }
            _ => {
                self.topology.remap_rgb.clear();
                self.sample.bind_rgb = Binding::None;
            }
        }

        // Constant derived channels are synthesized once, here.
        if self.summary.constant_normals && self.summary.compute_normals {
            let mut out = std::mem::take(&mut self.constant.normals);
            ops::generate_point_normals(
                &counts,
                &indices,
                &points,
                &self.topology.remap_points,
                &mut out,
            );
            self.constant.normals = out;
            self.sample.bind_normals = Binding::Constant;
        }
        if self.summary.constant_tangents && self.summary.compute_tangents {
            let mut out = std::mem::take(&mut self.constant.tangents);
            out.clear();
            out.resize(self.topology.vertex_count, Vec4::ZERO);
            Self::tangents_per_split(
                &self.topology.refiner,
                &mut out,
                &self.constant.points,
                &self.constant.uv0,
                &self.constant.normals,
            );
            self.constant.tangents = out;
            self.sample.bind_tangents = Binding::Constant;
        }
    }

    /// Remap every non-constant, non-computed channel through the existing
    /// tables (sample index changed, topology unchanged).
    fn remap_frame(&mut self) {
        if !self.constant.points.is_empty() {
            self.sample.bind_points = Binding::Constant;
        } else if let Some(sp) = self.store.points.get() {
            ops::remap(&mut self.sample.points, sp, &self.topology.remap_points);
            if self.config.swap_handedness {
                ops::swap_handedness(&mut self.sample.points);
            }
            if self.config.scale_factor != 1.0 {
                ops::apply_scale(&mut self.sample.points, self.config.scale_factor);
            }
            self.sample.bind_points = Binding::Sample;
        }

        if !self.constant.normals.is_empty() {
            self.sample.bind_normals = Binding::Constant;
        } else if !self.summary.compute_normals && self.summary.has_normals_prop {
            if let Some(sp) = self.store.normals.get() {
                ops::remap(&mut self.sample.normals, &sp.values, &self.topology.remap_normals);
                if self.config.swap_handedness {
                    ops::swap_handedness(&mut self.sample.normals);
                }
                self.sample.bind_normals = Binding::Sample;
            }
        }

        if !self.constant.tangents.is_empty() {
            self.sample.bind_tangents = Binding::Constant;
        }

        if !self.constant.uv0.is_empty() {
            self.sample.bind_uv0 = Binding::Constant;
        } else if self.summary.has_uv0_prop {
            if let Some(sp) = self.store.uv0.get() {
                ops::remap(&mut self.sample.uv0, &sp.values, &self.topology.remap_uv0);
                self.sample.bind_uv0 = Binding::Sample;
            }
        }

        if !self.constant.uv1.is_empty() {
            self.sample.bind_uv1 = Binding::Constant;
        } else if self.summary.has_uv1_prop {
            if let Some(sp) = self.store.uv1.get() {
                ops::remap(&mut self.sample.uv1, &sp.values, &self.topology.remap_uv1);
                self.sample.bind_uv1 = Binding::Sample;
            }
        }

        if !self.constant.rgba.is_empty() {
            self.sample.bind_rgba = Binding::Constant;
        } else if self.summary.has_rgba_prop {
            if let Some(sp) = self.store.rgba.get() {
                ops::remap(&mut self.sample.rgba, &sp.values, &self.topology.remap_rgba);
                self.sample.bind_rgba = Binding::Sample;
            }
        }

        if !self.constant.rgb.is_empty() {
            self.sample.bind_rgb = Binding::Constant;
        } else if self.summary.has_rgb_prop {
            if let Some(sp) = self.store.rgb.get() {
                ops::remap(&mut self.sample.rgb, &sp.values, &self.topology.remap_rgb);
                self.sample.bind_rgb = Binding::Sample;
            }
        }
    }

    /// Remap next-index samples into the interpolation inputs, and cook
    /// stored velocities. Runs whenever the sample index changed (with or
    /// without a topology change).
    fn remap_next(&mut self, plan: &CookPlan) {
        if plan.points.lerp {
            if let Some(sp) = self.store.points_next.get() {
                ops::remap(&mut self.sample.points_next, sp, &self.topology.remap_points);
                if self.config.swap_handedness {
                    ops::swap_handedness(&mut self.sample.points_next);
                }
                if self.config.scale_factor != 1.0 {
                    ops::apply_scale(&mut self.sample.points_next, self.config.scale_factor);
                }
            }
        }

        if plan.normals.lerp {
            if let Some(sp) = self.store.normals_next.get() {
                ops::remap(&mut self.sample.normals_next, &sp.values, &self.topology.remap_normals);
                if self.config.swap_handedness {
                    ops::swap_handedness(&mut self.sample.normals_next);
                }
            }
        }

        if plan.uv0.lerp {
            if let Some(sp) = self.store.uv0_next.get() {
                ops::remap(&mut self.sample.uv0_next, &sp.values, &self.topology.remap_uv0);
            }
        }

        if plan.uv1.lerp {
            if let Some(sp) = self.store.uv1_next.get() {
                ops::remap(&mut self.sample.uv1_next, &sp.values, &self.topology.remap_uv1);
            }
        }

        if plan.rgba.lerp {
            if let Some(sp) = self.store.rgba_next.get() {
                ops::remap(&mut self.sample.rgba_next, &sp.values, &self.topology.remap_rgba);
            }
        }

        if plan.rgb.lerp {
            if let Some(sp) = self.store.rgb_next.get() {
                ops::remap(&mut self.sample.rgb_next, &sp.values, &self.topology.remap_rgb);
            }
        }

        if plan.velocities.remap {
            if !self.constant.velocities.is_empty() {
                self.sample.bind_velocities = Binding::Constant;
            } else if let Some(sp) = self.store.velocities.get() {
                let constant = self.summary.constant_velocities;
                let dst = if constant {
                    &mut self.constant.velocities
                } else {
                    &mut self.sample.velocities
                };
                ops::remap(dst, sp, &self.topology.remap_points);
                if self.config.swap_handedness {
                    ops::swap_handedness(dst);
                }
                if self.config.scale_factor != 1.0 {
                    ops::apply_scale(dst, self.config.scale_factor);
                }
                self.sample.bind_velocities = if constant {
                    Binding::Constant
                } else {
                    Binding::Sample
                };
            }
        }
    }

    /// Blend interpolated channels and synthesize derived ones.
    fn interpolate_and_synthesize(&mut self, plan: &CookPlan, weight: f32) {
        // Points first: velocities derive from consecutive interpolated
        // positions, so the previous buffer is swapped out before the blend.
        if plan.points.lerp {
            if plan.compute_velocities {
                std::mem::swap(&mut self.sample.points_int, &mut self.sample.points_prev);
            }
            ops::lerp_slices(
                &mut self.sample.points_int,
                &self.sample.points,
                &self.sample.points_next,
                weight,
            );
            self.sample.bind_points = Binding::Interpolated;

            if plan.compute_velocities {
                ops::generate_velocities(
                    &mut self.sample.velocities,
                    &self.sample.points_int,
                    &self.sample.points_prev,
                    self.config.vertex_motion_scale,
                );
                self.sample.bind_velocities = Binding::Sample;
            }
        }

        if !self.constant.normals.is_empty() {
            // Cooked once on the schema.
        } else if plan.normals.lerp {
            ops::lerp_slices(
                &mut self.sample.normals_int,
                &self.sample.normals,
                &self.sample.normals_next,
                weight,
            );
            ops::normalize(&mut self.sample.normals_int);
            self.sample.bind_normals = Binding::Interpolated;
        } else if plan.compute_normals {
            match (
                self.store.counts.get(),
                self.store.indices.get(),
                self.store.points.get(),
            ) {
                (Some(counts), Some(indices), Some(points)) => {
                    ops::generate_point_normals(
                        counts,
                        indices,
                        points,
                        &self.topology.remap_points,
                        &mut self.sample.normals,
                    );
                    self.sample.bind_normals = Binding::Sample;
                }
                _ => {
                    log::warn!("normal synthesis requested without raw inputs");
                    self.sample.bind_normals = Binding::None;
                }
            }
        }

        if !self.constant.tangents.is_empty() {
            // Cooked once on the schema.
        } else if plan.compute_tangents {
            let mut tangents = std::mem::take(&mut self.sample.tangents);
            let points = self.points();
            let uv0 = self.uv0();
            let normals = self.normals();
            if points.is_empty() || uv0.is_empty() || normals.is_empty() {
                log::warn!("tangent synthesis requested with empty inputs, channel cleared");
                tangents.clear();
                self.sample.tangents = tangents;
                self.sample.bind_tangents = Binding::None;
            } else {
                tangents.clear();
                tangents.resize(self.topology.vertex_count, Vec4::ZERO);
                Self::tangents_per_split(&self.topology.refiner, &mut tangents, points, uv0, normals);
                self.sample.tangents = tangents;
                self.sample.bind_tangents = Binding::Sample;
            }
        }

        if plan.uv0.lerp {
            ops::lerp_slices(
                &mut self.sample.uv0_int,
                &self.sample.uv0,
                &self.sample.uv0_next,
                weight,
            );
            self.sample.bind_uv0 = Binding::Interpolated;
        }

        if plan.uv1.lerp {
            ops::lerp_slices(
                &mut self.sample.uv1_int,
                &self.sample.uv1,
                &self.sample.uv1_next,
                weight,
            );
            self.sample.bind_uv1 = Binding::Interpolated;
        }

        if plan.rgba.lerp {
            ops::lerp_slices(
                &mut self.sample.rgba_int,
                &self.sample.rgba,
                &self.sample.rgba_next,
                weight,
            );
            self.sample.bind_rgba = Binding::Interpolated;
        }

        if plan.rgb.lerp {
            ops::lerp_slices(
                &mut self.sample.rgb_int,
                &self.sample.rgb,
                &self.sample.rgb_next,
                weight,
            );
            self.sample.bind_rgb = Binding::Interpolated;
        }
    }

    /// Tangent frames are generated split by split: indices are rebased per
    /// split and vertices are never shared across splits.
    fn tangents_per_split(
        refiner: &MeshRefiner,
        dst: &mut [Vec4],
        points: &[Vec3],
        uv0: &[Vec2],
        normals: &[Vec3],
    ) {
        for split in &refiner.splits {
            let v0 = split.vertex_offset;
            let v1 = v0 + split.vertex_count;
            let i0 = split.index_offset;
            let i1 = i0 + split.index_count;
            if v1 > points.len() || v1 > uv0.len() || v1 > normals.len() || v1 > dst.len() {
                log::warn!("tangent inputs shorter than split range, split skipped");
                continue;
            }
            ops::generate_tangents(
                &mut dst[v0..v1],
                &points[v0..v1],
                &uv0[v0..v1],
                &normals[v0..v1],
                &refiner.new_indices_tri[i0..i1],
            );
        }
    }
}

impl Schema for PolyMeshSchema {
    fn update_sample(&mut self, time: Chrono) -> Result<()> {
        let num_samples = self.provider.num_samples();
        if num_samples == 0 {
            self.data_updated = false;
            return Ok(());
        }

        let (index, weight) = self
            .provider
            .time_sampling()
            .time_to_index(time, num_samples);

        let force = matches!(self.state, CookState::ForceUpdate);
        let first = matches!(self.state, CookState::Fresh);
        let index_changed = match self.state {
            CookState::Ready { index: prev, weight: prev_w } => {
                if prev == index && prev_w == weight {
                    self.data_updated = false;
                    return Ok(());
                }
                prev != index
            }
            _ => true,
        };

        // Interpolation can't work with varying topology: a weight-only
        // change is not a new sample there.
        if self.varying_topology && !index_changed && !force && !first {
            self.state = CookState::Ready { index, weight };
            self.data_updated = false;
            return Ok(());
        }

        let topology_changed = self.varying_topology || force || first;
        let plan = CookPlan::build(
            &self.summary,
            FrameChange {
                topology_changed,
                index_changed,
            },
        );

        if !topology_changed && plan.is_noop() {
            self.state = CookState::Ready { index, weight };
            self.data_updated = false;
            return Ok(());
        }

        if let Err(e) = self.read_raw(&plan, index, num_samples) {
            // The previous cooked sample stays visible.
            self.sample.topology_changed = false;
            self.data_updated = false;
            return Err(e);
        }

        self.sample.topology_changed = topology_changed;
        if topology_changed {
            self.on_topology_change();
        } else if index_changed {
            self.remap_frame();
        }
        if index_changed {
            self.remap_next(&plan);
        }
        self.interpolate_and_synthesize(&plan, weight);

        self.sample.bounds = self.store.bounds.get().copied().flatten();
        self.sample.visibility = self.provider.visibility(index);

        self.state = CookState::Ready { index, weight };
        self.data_updated = true;
        Ok(())
    }

    fn sync(&mut self) {
        // Cooking is synchronous; the sample is already published.
    }

    fn is_constant(&self) -> bool {
        self.summary.constant
    }

    fn is_data_updated(&self) -> bool {
        self.data_updated
    }

    fn mark_force_update(&mut self) {
        self.state = CookState::ForceUpdate;
    }

    fn time_range(&self) -> Option<(Chrono, Chrono)> {
        let n = self.provider.num_samples();
        if n == 0 {
            return None;
        }
        let ts = self.provider.time_sampling();
        Some((ts.sample_time(0), ts.sample_time(n - 1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ChannelInfo, MeshChannel, TimeSampling};

    /// In-memory provider with one topology and per-sample point arrays.
    struct TestProvider {
        counts: Arc<Vec<i32>>,
        indices: Arc<Vec<i32>>,
        point_frames: Vec<Arc<Vec<Vec3>>>,
        normals: Option<IndexedSample<Vec3>>,
        uv0: Option<IndexedSample<Vec2>>,
        variance: TopologyVariance,
        ts: TimeSampling,
        fail_points: bool,
    }

    impl TestProvider {
        fn quad(frames: Vec<Vec<Vec3>>) -> Self {
            let variance = if frames.len() > 1 {
                TopologyVariance::Homogeneous
            } else {
                TopologyVariance::Constant
            };
            Self {
                counts: Arc::new(vec![4]),
                indices: Arc::new(vec![0, 1, 2, 3]),
                point_frames: frames.into_iter().map(Arc::new).collect(),
                normals: None,
                uv0: None,
                variance,
                ts: TimeSampling::uniform(1.0, 0.0),
                fail_points: false,
            }
        }
    }

    impl MeshProvider for TestProvider {
        fn num_samples(&self) -> usize {
            self.point_frames.len()
        }
        fn topology_variance(&self) -> TopologyVariance {
            self.variance
        }
        fn time_sampling(&self) -> &TimeSampling {
            &self.ts
        }
        fn channel_info(&self, channel: MeshChannel) -> Option<ChannelInfo> {
            let constant = self.point_frames.len() <= 1;
            match channel {
                MeshChannel::Counts | MeshChannel::Indices => Some(ChannelInfo { constant: true }),
                MeshChannel::Points => Some(ChannelInfo { constant }),
                MeshChannel::Normals => self.normals.as_ref().map(|_| ChannelInfo { constant: true }),
                MeshChannel::Uv0 => self.uv0.as_ref().map(|_| ChannelInfo { constant: true }),
                _ => None,
            }
        }
        fn counts(&self, _: usize) -> Result<Arc<Vec<i32>>> {
            Ok(Arc::clone(&self.counts))
        }
        fn face_indices(&self, _: usize) -> Result<Arc<Vec<i32>>> {
            Ok(Arc::clone(&self.indices))
        }
        fn points(&self, index: usize) -> Result<Arc<Vec<Vec3>>> {
            if self.fail_points {
                return Err(Error::provider("points", "synthetic failure"));
            }
            self.point_frames
                .get(index)
                .cloned()
                .ok_or(Error::SampleOutOfBounds {
                    index,
                    count: self.point_frames.len(),
                })
        }
        fn normals(&self, _: usize) -> Result<IndexedSample<Vec3>> {
            self.normals
                .clone()
                .ok_or_else(|| Error::provider("normals", "channel not present"))
        }
        fn uv0(&self, _: usize) -> Result<IndexedSample<Vec2>> {
            self.uv0
                .clone()
                .ok_or_else(|| Error::provider("uv0", "channel not present"))
        }
    }

    fn plain_config() -> ImportConfig {
        ImportConfig {
            swap_handedness: false,
            interpolate_samples: false,
            normals_mode: crate::core::NormalsMode::Ignore,
            ..ImportConfig::default()
        }
    }

    fn quad_frame(offset: f32) -> Vec<Vec3> {
        vec![
            Vec3::new(offset, 0.0, 0.0),
            Vec3::new(offset + 1.0, 0.0, 0.0),
            Vec3::new(offset + 1.0, 1.0, 0.0),
            Vec3::new(offset, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_cook_single_quad() {
        let provider = TestProvider::quad(vec![quad_frame(0.0)]);
        let mut schema = PolyMeshSchema::new(Box::new(provider), plain_config());
        schema.update_sample(0.0).unwrap();

        let summary = schema.sample_summary();
        assert_eq!(summary.split_count, 1);
        assert_eq!(summary.submesh_count, 1);
        assert_eq!(summary.vertex_count, 4);
        assert_eq!(summary.index_count, 6);
        assert!(summary.topology_changed);
        assert_eq!(schema.indices(), &[0, 1, 2, 0, 2, 3]);
        assert_eq!(schema.points(), quad_frame(0.0).as_slice());
    }

    #[test]
    fn test_cook_same_time_is_noop_and_stable() {
        let provider = TestProvider::quad(vec![quad_frame(0.0), quad_frame(1.0)]);
        let mut schema = PolyMeshSchema::new(Box::new(provider), plain_config());

        schema.update_sample(0.0).unwrap();
        assert!(schema.is_data_updated());
        let first: Vec<Vec3> = schema.points().to_vec();

        schema.update_sample(0.0).unwrap();
        assert!(!schema.is_data_updated());
        assert_eq!(schema.points(), first.as_slice());
    }

    #[test]
    fn test_interpolation_midpoint() {
        let provider = TestProvider::quad(vec![quad_frame(0.0), quad_frame(2.0)]);
        let mut schema = PolyMeshSchema::new(
            Box::new(provider),
            ImportConfig {
                interpolate_samples: true,
                ..plain_config()
            },
        );
        schema.update_sample(0.5).unwrap();

        let expected = quad_frame(1.0);
        for (p, e) in schema.points().iter().zip(expected.iter()) {
            assert!((*p - *e).length() < 1e-6);
        }
    }

    #[test]
    fn test_velocities_across_cooks() {
        let provider = TestProvider::quad(vec![quad_frame(0.0), quad_frame(2.0)]);
        let mut schema = PolyMeshSchema::new(
            Box::new(provider),
            ImportConfig {
                interpolate_samples: true,
                ..plain_config()
            },
        );

        // First cook: no previous frame, velocities zero-fill.
        schema.update_sample(0.0).unwrap();
        assert!(schema.velocities().iter().all(|v| *v == Vec3::ZERO));

        // Second cook half a frame later: points moved by 1 in x.
        schema.update_sample(0.5).unwrap();
        for v in schema.velocities() {
            assert!((*v - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-6);
        }
    }

    #[test]
    fn test_handedness_and_scale() {
        let mut provider = TestProvider::quad(vec![vec![Vec3::new(1.0, 2.0, 3.0)]]);
        provider.counts = Arc::new(vec![1]);
        provider.indices = Arc::new(vec![0]);
        let mut schema = PolyMeshSchema::new(
            Box::new(provider),
            ImportConfig {
                swap_handedness: true,
                scale_factor: 2.0,
                import_point_polygon: true,
                interpolate_samples: false,
                normals_mode: crate::core::NormalsMode::Ignore,
                ..ImportConfig::default()
            },
        );
        schema.update_sample(0.0).unwrap();
        assert_eq!(schema.points(), &[Vec3::new(-2.0, 4.0, 6.0)]);
    }

    #[test]
    fn test_provider_error_keeps_previous_sample() {
        let provider = TestProvider::quad(vec![quad_frame(0.0), quad_frame(1.0)]);
        let mut schema = PolyMeshSchema::new(Box::new(provider), plain_config());
        schema.update_sample(0.0).unwrap();
        let before: Vec<Vec3> = schema.points().to_vec();

        // Swap in a provider whose point reads fail.
        let mut failing = TestProvider::quad(vec![quad_frame(0.0), quad_frame(1.0)]);
        failing.fail_points = true;
        schema.provider = Box::new(failing);

        assert!(schema.update_sample(1.0).is_err());
        assert!(!schema.is_data_updated());
        assert!(!schema.sample_summary().topology_changed);
        assert_eq!(schema.points(), before.as_slice());
    }

    #[test]
    fn test_computed_normals_unit_length() {
        let provider = TestProvider::quad(vec![quad_frame(0.0)]);
        let mut schema = PolyMeshSchema::new(
            Box::new(provider),
            ImportConfig {
                swap_handedness: false,
                interpolate_samples: false,
                normals_mode: crate::core::NormalsMode::ComputeIfMissing,
                ..ImportConfig::default()
            },
        );
        schema.update_sample(0.0).unwrap();

        let normals = schema.normals();
        assert_eq!(normals.len(), 4);
        for n in normals {
            assert!((n.length() - 1.0).abs() < 1e-5);
        }
        // Constant points imply constant computed normals, stored on the
        // schema.
        assert!(schema.summary().constant_normals);
    }

    #[test]
    fn test_fill_vertex_buffers() {
        let provider = TestProvider::quad(vec![quad_frame(0.0)]);
        let mut schema = PolyMeshSchema::new(Box::new(provider), plain_config());
        schema.update_sample(0.0).unwrap();

        let mut points = vec![Vec3::ZERO; 4];
        let mut normals = vec![Vec3::ONE; 4];
        let mut indices = vec![0i32; 6];
        {
            let mut vbs = [PolyMeshData {
                points: Some(&mut points),
                normals: Some(&mut normals),
                ..PolyMeshData::default()
            }];
            let mut ibs = [SubmeshData {
                indices: Some(&mut indices),
            }];
            schema.fill_vertex_buffers(&mut vbs, &mut ibs);

            assert_eq!(vbs[0].center, Vec3::new(0.5, 0.5, 0.0));
            assert_eq!(vbs[0].extents, Vec3::new(1.0, 1.0, 0.0));
        }
        assert_eq!(points, quad_frame(0.0));
        // Normals absent in the cooked sample: zero-filled.
        assert!(normals.iter().all(|n| *n == Vec3::ZERO));
        assert_eq!(indices, vec![0, 1, 2, 0, 2, 3]);
    }
}
