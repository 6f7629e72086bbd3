//! Face-varying mesh refinement.
//!
//! Turns face counts, face-vertex indices and face-varying attributes into
//! per-vertex arrays suitable for vertex buffers: shared positions are
//! broken where attributes disagree at a corner, polygons are fan
//! triangulated, output vertices are assigned to capacity-bounded splits and
//! faces to per-material submeshes.
//!
//! The refiner does not copy attribute values itself; it produces one remap
//! table per registered attribute (`new_value[k] = src[remap[k]]`) which the
//! caller applies with [`crate::geom::ops::remap`].

use std::collections::HashMap;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::util::math::Vec3;

/// Primitive topology of a submesh, derived from the face arities it holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmeshTopology {
    Points,
    Lines,
    Triangles,
    /// Reserved for consumers that opt out of triangulation.
    Quads,
}

/// A contiguous range of output vertices, kept within the split unit so
/// downstream consumers can page vertex buffers.
#[derive(Clone, Copy, Debug, Default)]
pub struct Split {
    pub vertex_count: usize,
    pub vertex_offset: usize,
    pub index_count: usize,
    pub index_offset: usize,
    pub submesh_count: usize,
    pub submesh_offset: usize,
    pub face_count: usize,
    pub face_offset: usize,
}

/// A contiguous range of indices within a split, tagged with the material id
/// its faces were assigned from face sets.
#[derive(Clone, Copy, Debug)]
pub struct Submesh {
    pub split_index: usize,
    /// Index of this submesh within its split.
    pub submesh_index: usize,
    pub index_count: usize,
    /// Offset into `new_indices_submeshes`.
    pub index_offset: usize,
    pub material_id: i32,
    pub topology: SubmeshTopology,
}

/// Handle to an attribute registered before `refine`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttributeHandle(usize);

#[derive(Default)]
struct Attribute {
    /// Per-corner merge key: corners with equal keys (and equal point index)
    /// collapse into one output vertex.
    corner_keys: Vec<i32>,
    /// Per-corner source index the remap table is built from.
    src_indices: Vec<i32>,
    /// One source index per output vertex, filled by `refine`.
    remap: Vec<i32>,
}

#[derive(Clone, Copy, Debug)]
struct RefinedFace {
    /// Original face index (for material lookup).
    face: usize,
    class: SubmeshTopology,
    /// Range in `new_indices_tri`.
    index_offset: usize,
    index_count: usize,
}

/// Merge key of one output vertex: point index plus one key per attribute.
type VertexKey = SmallVec<[i32; 6]>;

/// Face-varying to per-vertex mesh refiner.
///
/// Working arrays are retained between runs so per-frame refinement of
/// topology-varying meshes reuses allocations.
#[derive(Default)]
pub struct MeshRefiner {
    /// Maximum vertices per split. Soft bound: a single face is never
    /// divided, so one face with more vertices than the unit gets a split of
    /// its own that exceeds it.
    pub split_unit: usize,
    pub gen_points: bool,
    pub gen_lines: bool,
    pub gen_triangles: bool,
    pub turn_quad_edges: bool,
    pub swap_face_winding: bool,

    counts: Arc<Vec<i32>>,
    indices: Arc<Vec<i32>>,
    points: Arc<Vec<Vec3>>,
    attributes: Vec<Attribute>,
    refined_faces: Vec<RefinedFace>,

    pub new_points: Vec<Vec3>,
    /// For each output vertex, the original point index.
    pub new2old_points: Vec<i32>,
    /// Triangulated indices, rebased to each split's vertex range.
    pub new_indices_tri: Vec<i32>,
    /// `new_indices_tri` regrouped by submesh.
    pub new_indices_submeshes: Vec<i32>,
    pub splits: Vec<Split>,
    pub submeshes: Vec<Submesh>,
}

impl MeshRefiner {
    /// Reset all inputs and outputs, keeping allocations where possible.
    pub fn clear(&mut self) {
        self.counts = Arc::new(Vec::new());
        self.indices = Arc::new(Vec::new());
        self.points = Arc::new(Vec::new());
        self.attributes.clear();
        self.refined_faces.clear();
        self.new_points.clear();
        self.new2old_points.clear();
        self.new_indices_tri.clear();
        self.new_indices_submeshes.clear();
        self.splits.clear();
        self.submeshes.clear();
    }

    /// Set the topology to refine. Clears any previously registered
    /// attributes and outputs.
    pub fn prepare(&mut self, counts: Arc<Vec<i32>>, indices: Arc<Vec<i32>>, points: Arc<Vec<Vec3>>) {
        self.clear();
        self.counts = counts;
        self.indices = indices;
        self.points = points;
    }

    /// Register an attribute with one value per face corner
    /// (`src.len() == indices.len()`). Corners holding bitwise-equal values
    /// merge.
    pub fn add_expanded_attribute<T: bytemuck::Pod>(&mut self, src: &[T]) -> AttributeHandle {
        debug_assert_eq!(src.len(), self.indices.len());

        let bytes: &[u8] = bytemuck::cast_slice(src);
        let stride = std::mem::size_of::<T>();
        let n = self.indices.len();

        let mut corner_keys = Vec::with_capacity(n);
        let mut value_ids: HashMap<&[u8], i32> = HashMap::new();
        for c in 0..n {
            let value = &bytes[c * stride..(c + 1) * stride];
            let next = value_ids.len() as i32;
            corner_keys.push(*value_ids.entry(value).or_insert(next));
        }

        self.push_attribute(Attribute {
            corner_keys,
            src_indices: (0..n as i32).collect(),
            remap: Vec::new(),
        })
    }

    /// Register an attribute with explicit per-corner indices into its value
    /// array (`src_indices.len() == indices.len()`).
    pub fn add_indexed_attribute(&mut self, src_indices: &[i32]) -> AttributeHandle {
        debug_assert_eq!(src_indices.len(), self.indices.len());

        self.push_attribute(Attribute {
            corner_keys: src_indices.to_vec(),
            src_indices: src_indices.to_vec(),
            remap: Vec::new(),
        })
    }

    /// Register an attribute with one value per point
    /// (`src.len() == points.len()`), addressed through the face-vertex
    /// indices.
    pub fn add_vertex_attribute(&mut self) -> AttributeHandle {
        let indices = Arc::clone(&self.indices);
        self.push_attribute(Attribute {
            corner_keys: indices.as_ref().clone(),
            src_indices: indices.as_ref().clone(),
            remap: Vec::new(),
        })
    }

    fn push_attribute(&mut self, attr: Attribute) -> AttributeHandle {
        self.attributes.push(attr);
        AttributeHandle(self.attributes.len() - 1)
    }

    /// Take the remap table built for an attribute by the last `refine`.
    pub fn take_remap(&mut self, handle: AttributeHandle) -> Vec<i32> {
        std::mem::take(&mut self.attributes[handle.0].remap)
    }

    /// Total output vertices across all splits.
    pub fn vertex_count(&self) -> usize {
        self.new_points.len()
    }

    /// Total output indices across all splits.
    pub fn index_count(&self) -> usize {
        self.new_indices_tri.len()
    }

    /// Run refinement: merge corners into output vertices, triangulate, and
    /// assign vertices to splits. Submeshes are produced by a following
    /// [`gen_submeshes`](Self::gen_submeshes) call.
    pub fn refine(&mut self) {
        self.new_points.clear();
        self.new2old_points.clear();
        self.new_indices_tri.clear();
        self.new_indices_submeshes.clear();
        self.splits.clear();
        self.submeshes.clear();
        self.refined_faces.clear();
        for a in &mut self.attributes {
            a.remap.clear();
        }

        let counts = Arc::clone(&self.counts);
        let indices = Arc::clone(&self.indices);
        let points = Arc::clone(&self.points);
        let split_unit = self.split_unit.max(1);

        let mut table: HashMap<VertexKey, i32> = HashMap::new();
        let mut split = Split::default();
        let mut offset = 0usize;

        for (fi, &c) in counts.iter().enumerate() {
            if c < 1 {
                // Degenerate face, skipped without error.
                offset += c.max(0) as usize;
                continue;
            }
            let arity = c as usize;
            if offset + arity > indices.len() {
                log::warn!("face {fi} overruns the index array, stopping refinement");
                break;
            }

            let class = match arity {
                1 => SubmeshTopology::Points,
                2 => SubmeshTopology::Lines,
                _ => SubmeshTopology::Triangles,
            };
            let enabled = match class {
                SubmeshTopology::Points => self.gen_points,
                SubmeshTopology::Lines => self.gen_lines,
                _ => self.gen_triangles,
            };
            if !enabled {
                offset += arity;
                continue;
            }

            let mut face_keys: SmallVec<[VertexKey; 8]> = SmallVec::new();
            for k in 0..arity {
                let corner = offset + k;
                let mut key: VertexKey = SmallVec::new();
                key.push(indices[corner]);
                for a in &self.attributes {
                    key.push(a.corner_keys[corner]);
                }
                face_keys.push(key);
            }

            // How many vertices this face would add to the current split.
            let mut fresh = 0usize;
            for (k, key) in face_keys.iter().enumerate() {
                if !table.contains_key(key) && !face_keys[..k].contains(key) {
                    fresh += 1;
                }
            }

            if split.vertex_count > 0 && split.vertex_count + fresh > split_unit {
                Self::close_split(&mut self.splits, &mut split);
                table.clear();
            }

            let mut corner_out: SmallVec<[i32; 8]> = SmallVec::new();
            for (k, key) in face_keys.iter().enumerate() {
                let local = match table.get(key) {
                    Some(&id) => id,
                    None => {
                        let id = split.vertex_count as i32;
                        split.vertex_count += 1;
                        let corner = offset + k;
                        let pt = indices[corner];
                        self.new_points
                            .push(points.get(pt as usize).copied().unwrap_or_default());
                        self.new2old_points.push(pt);
                        for a in &mut self.attributes {
                            a.remap.push(a.src_indices[corner]);
                        }
                        table.insert(key.clone(), id);
                        id
                    }
                };
                corner_out.push(local);
            }

            let tri_base = self.new_indices_tri.len();
            match arity {
                1 => self.new_indices_tri.push(corner_out[0]),
                2 => {
                    self.new_indices_tri.push(corner_out[0]);
                    self.new_indices_tri.push(corner_out[1]);
                }
                4 if self.turn_quad_edges => {
                    for tri in [[1, 2, 3], [1, 3, 0]] {
                        for i in tri {
                            self.new_indices_tri.push(corner_out[i]);
                        }
                    }
                }
                _ => {
                    for i in 1..arity - 1 {
                        self.new_indices_tri.push(corner_out[0]);
                        self.new_indices_tri.push(corner_out[i]);
                        self.new_indices_tri.push(corner_out[i + 1]);
                    }
                }
            }
            let emitted = self.new_indices_tri.len() - tri_base;
            split.index_count += emitted;
            split.face_count += 1;
            self.refined_faces.push(RefinedFace {
                face: fi,
                class,
                index_offset: tri_base,
                index_count: emitted,
            });

            offset += arity;
        }

        if split.face_count > 0 {
            Self::close_split(&mut self.splits, &mut split);
        }

        if self.swap_face_winding {
            for f in &self.refined_faces {
                if f.class != SubmeshTopology::Triangles {
                    continue;
                }
                let range = &mut self.new_indices_tri[f.index_offset..f.index_offset + f.index_count];
                for tri in range.chunks_exact_mut(3) {
                    tri.reverse();
                }
            }
        }
    }

    fn close_split(splits: &mut Vec<Split>, split: &mut Split) {
        let closed = *split;
        splits.push(closed);
        *split = Split {
            vertex_offset: closed.vertex_offset + closed.vertex_count,
            index_offset: closed.index_offset + closed.index_count,
            face_offset: closed.face_offset + closed.face_count,
            ..Split::default()
        };
    }

    /// Partition each split's faces into submeshes.
    ///
    /// With `material_ids` (one id per original face, -1 unassigned) faces
    /// group per (split, material id), ids ascending. Without, each split
    /// becomes a single submesh. The submesh topology follows the face
    /// arities it contains: all single-vertex faces are Points, all
    /// two-vertex faces Lines, anything else Triangles.
    pub fn gen_submeshes(&mut self, material_ids: Option<&[i32]>) {
        self.submeshes.clear();
        self.new_indices_submeshes.clear();
        self.new_indices_submeshes.resize(self.new_indices_tri.len(), 0);

        let mut cursor = 0usize;
        for (si, split) in self.splits.iter_mut().enumerate() {
            let faces = &self.refined_faces[split.face_offset..split.face_offset + split.face_count];
            let mat_of = |f: &RefinedFace| -> i32 {
                match material_ids {
                    Some(ids) => ids.get(f.face).copied().unwrap_or(-1),
                    None => -1,
                }
            };

            let mut mats: SmallVec<[i32; 8]> = SmallVec::new();
            for f in faces {
                let m = mat_of(f);
                if !mats.contains(&m) {
                    mats.push(m);
                }
            }
            mats.sort_unstable();

            split.submesh_offset = self.submeshes.len();
            for (smi, &mat) in mats.iter().enumerate() {
                let index_offset = cursor;
                let mut topology: Option<SubmeshTopology> = None;
                for f in faces.iter().filter(|f| mat_of(f) == mat) {
                    self.new_indices_submeshes[cursor..cursor + f.index_count]
                        .copy_from_slice(&self.new_indices_tri[f.index_offset..f.index_offset + f.index_count]);
                    cursor += f.index_count;
                    topology = Some(match topology {
                        None => f.class,
                        Some(t) if t == f.class => t,
                        Some(_) => SubmeshTopology::Triangles,
                    });
                }
                self.submeshes.push(Submesh {
                    split_index: si,
                    submesh_index: smi,
                    index_count: cursor - index_offset,
                    index_offset,
                    material_id: mat,
                    topology: topology.unwrap_or(SubmeshTopology::Triangles),
                });
            }
            split.submesh_count = self.submeshes.len() - split.submesh_offset;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refiner_for(
        counts: Vec<i32>,
        indices: Vec<i32>,
        points: Vec<Vec3>,
        split_unit: usize,
    ) -> MeshRefiner {
        let mut r = MeshRefiner {
            split_unit,
            gen_points: true,
            gen_lines: true,
            gen_triangles: true,
            ..MeshRefiner::default()
        };
        r.prepare(Arc::new(counts), Arc::new(indices), Arc::new(points));
        r
    }

    fn quad_points() -> Vec<Vec3> {
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_single_quad() {
        let mut r = refiner_for(vec![4], vec![0, 1, 2, 3], quad_points(), usize::MAX);
        r.refine();
        r.gen_submeshes(None);

        assert_eq!(r.vertex_count(), 4);
        assert_eq!(r.new_indices_tri, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(r.splits.len(), 1);
        assert_eq!(r.submeshes.len(), 1);
        assert_eq!(r.submeshes[0].topology, SubmeshTopology::Triangles);
        assert_eq!(r.new2old_points, vec![0, 1, 2, 3]);
        assert_eq!(r.new_indices_submeshes, r.new_indices_tri);
    }

    #[test]
    fn test_turn_quad_edges() {
        let mut r = refiner_for(vec![4], vec![0, 1, 2, 3], quad_points(), usize::MAX);
        r.turn_quad_edges = true;
        r.refine();
        assert_eq!(r.new_indices_tri, vec![1, 2, 3, 1, 3, 0]);
    }

    #[test]
    fn test_swap_face_winding() {
        let mut r = refiner_for(vec![3], vec![0, 1, 2], quad_points(), usize::MAX);
        r.swap_face_winding = true;
        r.refine();
        assert_eq!(r.new_indices_tri, vec![2, 1, 0]);
    }

    #[test]
    fn test_all_triangles_identity_remap() {
        // No face-varying attributes: refined vertices are the input points.
        let mut r = refiner_for(
            vec![3, 3],
            vec![0, 1, 2, 0, 2, 3],
            quad_points(),
            usize::MAX,
        );
        r.refine();
        assert_eq!(r.vertex_count(), 4);
        assert_eq!(r.new2old_points, vec![0, 1, 2, 3]);
        assert_eq!(r.new_points, quad_points());
    }

    #[test]
    fn test_face_varying_uv_splits_shared_corner() {
        let mut r = refiner_for(
            vec![3, 3],
            vec![0, 1, 2, 0, 2, 3],
            quad_points(),
            usize::MAX,
        );
        // Two different values at the two corners touching point 0, shared
        // value at point 2.
        let uv = [
            glam::Vec2::new(0.0, 0.0), // corner 0 -> point 0 (value A)
            glam::Vec2::new(1.0, 0.0),
            glam::Vec2::new(1.0, 1.0), // corner 2 -> point 2
            glam::Vec2::new(0.5, 0.5), // corner 3 -> point 0 (value B)
            glam::Vec2::new(1.0, 1.0), // corner 4 -> point 2, same value
            glam::Vec2::new(0.0, 1.0),
        ];
        let h = r.add_expanded_attribute(&uv);
        r.refine();

        assert_eq!(r.vertex_count(), 5);
        assert_eq!(r.new2old_points, vec![0, 1, 2, 0, 3]);
        assert_eq!(r.new_indices_tri, vec![0, 1, 2, 3, 2, 4]);

        let remap = r.take_remap(h);
        assert_eq!(remap.len(), 5);
        let mut cooked = Vec::new();
        crate::geom::ops::remap(&mut cooked, &uv, &remap);
        assert_eq!(cooked[0], uv[0]);
        assert_eq!(cooked[2], uv[2]);
        assert_eq!(cooked[3], uv[3]);
    }

    #[test]
    fn test_indexed_attribute_merges_equal_indices() {
        let mut r = refiner_for(
            vec![3, 3],
            vec![0, 1, 2, 0, 2, 3],
            quad_points(),
            usize::MAX,
        );
        // Explicit per-corner indices into a 2-value array; every corner of
        // both faces shares index 0 except the last.
        let h = r.add_indexed_attribute(&[0, 0, 0, 0, 0, 1]);
        r.refine();

        assert_eq!(r.vertex_count(), 4);
        let remap = r.take_remap(h);
        assert_eq!(remap, vec![0, 0, 0, 1]);
    }

    #[test]
    fn test_split_cap() {
        // 5 isolated triangles, 15 unique vertices, unit 6.
        let mut counts = Vec::new();
        let mut indices = Vec::new();
        let mut points = Vec::new();
        for t in 0..5 {
            counts.push(3);
            for k in 0..3 {
                indices.push((t * 3 + k) as i32);
                points.push(Vec3::new(t as f32, k as f32, 0.0));
            }
        }
        let mut r = refiner_for(counts, indices, points, 6);
        r.refine();
        r.gen_submeshes(None);

        assert!(r.splits.len() >= 3);
        let mut total = 0;
        for s in &r.splits {
            assert!(s.vertex_count <= 6);
            total += s.vertex_count;
            // Rebased indices stay within the split's vertex range.
            for &i in &r.new_indices_tri[s.index_offset..s.index_offset + s.index_count] {
                assert!((i as usize) < s.vertex_count);
            }
        }
        assert_eq!(total, r.vertex_count());
        assert_eq!(r.vertex_count(), 15);
    }

    #[test]
    fn test_split_unit_one_isolates_vertices() {
        // Three point polygons with unit 1: one vertex per split.
        let mut r = refiner_for(vec![1, 1, 1], vec![0, 1, 2], quad_points(), 1);
        r.refine();
        assert_eq!(r.splits.len(), 3);
        for s in &r.splits {
            assert_eq!(s.vertex_count, 1);
        }
    }

    #[test]
    fn test_split_soft_bound_single_face() {
        // One quad with unit 2: the face cannot be divided, so its split
        // exceeds the unit.
        let mut r = refiner_for(vec![4], vec![0, 1, 2, 3], quad_points(), 2);
        r.refine();
        assert_eq!(r.splits.len(), 1);
        assert_eq!(r.splits[0].vertex_count, 4);
    }

    #[test]
    fn test_empty_mesh() {
        let mut r = refiner_for(Vec::new(), Vec::new(), Vec::new(), usize::MAX);
        r.refine();
        r.gen_submeshes(None);
        assert_eq!(r.splits.len(), 0);
        assert_eq!(r.submeshes.len(), 0);
        assert_eq!(r.vertex_count(), 0);
    }

    #[test]
    fn test_arity_gating() {
        // A point, a line and a triangle; only triangles enabled.
        let mut r = refiner_for(
            vec![1, 2, 3],
            vec![0, 0, 1, 0, 1, 2],
            quad_points(),
            usize::MAX,
        );
        r.gen_points = false;
        r.gen_lines = false;
        r.refine();
        r.gen_submeshes(None);

        assert_eq!(r.vertex_count(), 3);
        assert_eq!(r.new_indices_tri.len(), 3);
        assert_eq!(r.submeshes.len(), 1);
        assert_eq!(r.submeshes[0].topology, SubmeshTopology::Triangles);
    }

    #[test]
    fn test_line_and_point_submesh_topology() {
        let mut r = refiner_for(vec![1], vec![0], quad_points(), usize::MAX);
        r.refine();
        r.gen_submeshes(None);
        assert_eq!(r.submeshes[0].topology, SubmeshTopology::Points);

        let mut r = refiner_for(vec![2], vec![0, 1], quad_points(), usize::MAX);
        r.refine();
        r.gen_submeshes(None);
        assert_eq!(r.submeshes[0].topology, SubmeshTopology::Lines);
    }

    #[test]
    fn test_submeshes_by_material() {
        // Two triangles with different material ids, one split.
        let mut r = refiner_for(
            vec![3, 3],
            vec![0, 1, 2, 0, 2, 3],
            quad_points(),
            usize::MAX,
        );
        r.refine();
        r.gen_submeshes(Some(&[1, 0]));

        assert_eq!(r.submeshes.len(), 2);
        // Ascending material order.
        assert_eq!(r.submeshes[0].material_id, 0);
        assert_eq!(r.submeshes[1].material_id, 1);
        assert_eq!(r.submeshes[0].index_count, 3);
        assert_eq!(r.submeshes[1].index_count, 3);
        // Submesh 0 holds the second face's triangle.
        assert_eq!(
            &r.new_indices_submeshes[0..3],
            &r.new_indices_tri[3..6]
        );
        assert_eq!(r.splits[0].submesh_count, 2);
    }

    #[test]
    fn test_degenerate_faces_skipped() {
        let mut r = refiner_for(vec![0, 3], vec![0, 1, 2], quad_points(), usize::MAX);
        r.refine();
        assert_eq!(r.vertex_count(), 3);
        assert_eq!(r.new_indices_tri.len(), 3);
    }
}
