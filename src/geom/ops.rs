//! Element-wise and scan operations over contiguous vertex arrays.
//!
//! These are the building blocks the cooker composes: coordinate
//! conversions, bounds, interpolation and derived-attribute synthesis
//! (normals, tangents, velocities).

use crate::util::math::{Vec2, Vec3, Vec4};

/// Negate the x component of every vector (mirror across the YZ plane).
pub fn swap_handedness(v: &mut [Vec3]) {
    for p in v.iter_mut() {
        p.x = -p.x;
    }
}

/// Negate the x component of every Vec4 (tangents keep their w sign).
pub fn swap_handedness4(v: &mut [Vec4]) {
    for p in v.iter_mut() {
        p.x = -p.x;
    }
}

/// Multiply every vector by a scalar.
pub fn apply_scale(v: &mut [Vec3], scale: f32) {
    for p in v.iter_mut() {
        *p *= scale;
    }
}

/// Componentwise min/max of a point array. None for an empty input.
pub fn min_max(v: &[Vec3]) -> Option<(Vec3, Vec3)> {
    let first = *v.first()?;
    let mut bbmin = first;
    let mut bbmax = first;
    for p in &v[1..] {
        bbmin = bbmin.min(*p);
        bbmax = bbmax.max(*p);
    }
    Some((bbmin, bbmax))
}

/// Types that can be linearly interpolated.
pub trait Lerp: Copy {
    fn lerp_to(self, other: Self, w: f32) -> Self;
}

impl Lerp for Vec2 {
    #[inline]
    fn lerp_to(self, other: Self, w: f32) -> Self {
        self.lerp(other, w)
    }
}

impl Lerp for Vec3 {
    #[inline]
    fn lerp_to(self, other: Self, w: f32) -> Self {
        self.lerp(other, w)
    }
}

impl Lerp for Vec4 {
    #[inline]
    fn lerp_to(self, other: Self, w: f32) -> Self {
        self.lerp(other, w)
    }
}

/// dst[i] = a[i] * (1 - w) + b[i] * w, with w clamped to [0, 1].
///
/// `a` and `b` must be the same length; the destination is resized to match.
pub fn lerp_slices<T: Lerp>(dst: &mut Vec<T>, a: &[T], b: &[T], w: f32) {
    if a.len() != b.len() {
        log::warn!(
            "lerp length mismatch ({} vs {}), skipping interpolation",
            a.len(),
            b.len()
        );
        dst.clear();
        dst.extend_from_slice(a);
        return;
    }
    let w = w.clamp(0.0, 1.0);
    dst.clear();
    dst.reserve(a.len());
    for (pa, pb) in a.iter().zip(b.iter()) {
        dst.push(pa.lerp_to(*pb, w));
    }
}

/// Normalize each vector in place; zero-length inputs become (0, 0, 0).
pub fn normalize(v: &mut [Vec3]) {
    for p in v.iter_mut() {
        *p = p.normalize_or_zero();
    }
}

/// dst[i] = (now[i] - prev[i]) * motion_scale.
///
/// When the two arrays disagree in length (topology churn between frames)
/// the destination is zero-filled instead.
pub fn generate_velocities(dst: &mut Vec<Vec3>, now: &[Vec3], prev: &[Vec3], motion_scale: f32) {
    dst.clear();
    if now.len() != prev.len() {
        dst.resize(now.len(), Vec3::ZERO);
        return;
    }
    dst.reserve(now.len());
    for (n, p) in now.iter().zip(prev.iter()) {
        dst.push((*n - *p) * motion_scale);
    }
}

/// dst[k] = src[remap[k]]. The destination is resized to the remap length.
pub fn remap<T: Copy + Default>(dst: &mut Vec<T>, src: &[T], remap: &[i32]) {
    dst.clear();
    dst.reserve(remap.len());
    for &i in remap {
        dst.push(src.get(i as usize).copied().unwrap_or_default());
    }
}

/// Area-weighted vertex normals over the original (unrefined) topology.
///
/// Face normals are accumulated into each original point via Newell's
/// method (magnitude twice the polygon area, so larger faces weigh more),
/// then routed to output vertices through `remap` and normalized. Faces
/// with fewer than three vertices contribute nothing.
pub fn generate_point_normals(
    counts: &[i32],
    indices: &[i32],
    points: &[Vec3],
    remap: &[i32],
    out: &mut Vec<Vec3>,
) {
    let mut acc = vec![Vec3::ZERO; points.len()];

    let mut offset = 0usize;
    for &c in counts {
        let arity = c.max(0) as usize;
        if offset + arity > indices.len() {
            break;
        }
        if arity >= 3 {
            let corners = &indices[offset..offset + arity];
            let in_range = corners.iter().all(|&i| (i as usize) < points.len());
            if in_range {
                let mut n = Vec3::ZERO;
                for i in 0..arity {
                    let p0 = points[corners[i] as usize];
                    let p1 = points[corners[(i + 1) % arity] as usize];
                    n.x += (p0.y - p1.y) * (p0.z + p1.z);
                    n.y += (p0.z - p1.z) * (p0.x + p1.x);
                    n.z += (p0.x - p1.x) * (p0.y + p1.y);
                }
                for &i in corners {
                    acc[i as usize] += n;
                }
            }
        }
        offset += arity;
    }

    out.clear();
    out.reserve(remap.len());
    for &i in remap {
        let n = acc.get(i as usize).copied().unwrap_or(Vec3::ZERO);
        out.push(n.normalize_or_zero());
    }
}

/// Per-vertex tangent frames (Lengyel's method) for a triangle list.
///
/// `tri_indices` references the refined per-vertex arrays; all three input
/// slices must have the same length. Output is V4 with the bitangent
/// handedness in w (-1 or +1).
pub fn generate_tangents(
    dst: &mut [Vec4],
    points: &[Vec3],
    uv: &[Vec2],
    normals: &[Vec3],
    tri_indices: &[i32],
) {
    let n_verts = points.len();
    let mut tan1 = vec![Vec3::ZERO; n_verts];
    let mut tan2 = vec![Vec3::ZERO; n_verts];

    for tri in tri_indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        if i0 >= n_verts || i1 >= n_verts || i2 >= n_verts {
            continue;
        }

        let x1 = points[i1] - points[i0];
        let x2 = points[i2] - points[i0];
        let s1 = uv[i1] - uv[i0];
        let s2 = uv[i2] - uv[i0];

        let denom = s1.x * s2.y - s2.x * s1.y;
        let r = if denom.abs() > 1e-12 { 1.0 / denom } else { 0.0 };

        let sdir = (x1 * s2.y - x2 * s1.y) * r;
        let tdir = (x2 * s1.x - x1 * s2.x) * r;

        for &i in &[i0, i1, i2] {
            tan1[i] += sdir;
            tan2[i] += tdir;
        }
    }

    for (i, out) in dst.iter_mut().enumerate().take(n_verts) {
        let n = normals[i];
        let t = tan1[i];
        // Gram-Schmidt orthogonalize against the normal.
        let tangent = (t - n * n.dot(t)).normalize_or_zero();
        let w = if n.cross(t).dot(tan2[i]) < 0.0 { -1.0 } else { 1.0 };
        *out = Vec4::new(tangent.x, tangent.y, tangent.z, w);
    }
}
