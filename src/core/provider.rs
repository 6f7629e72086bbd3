//! Sample provider traits.
//!
//! The core never parses the archive container. It consumes providers that
//! expose per-schema metadata plus raw samples at discrete indices; the
//! container format (and its caching) lives behind these traits.

use std::sync::Arc;

use crate::core::{PropertyValue, TimeSampling};
use crate::geom::visibility::ObjectVisibility;
use crate::util::math::{Vec2, Vec3, Vec4};
use crate::util::{BBox3f, Result};

/// Topology variance hint for a mesh schema.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TopologyVariance {
    /// Completely static: one topology, one set of positions.
    #[default]
    Constant,
    /// Topology is constant, only vertex data changes.
    Homogeneous,
    /// Topology changes between samples.
    Heterogeneous,
}

/// Channels of a polygon-mesh schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeshChannel {
    Counts,
    Indices,
    Points,
    Velocities,
    Normals,
    Uv0,
    Uv1,
    Rgba,
    Rgb,
}

/// Per-channel metadata reported by the provider.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChannelInfo {
    /// The channel's data is identical across all sample indices.
    pub constant: bool,
}

/// A raw face-varying attribute sample: values plus optional explicit
/// per-corner indices.
#[derive(Clone, Debug)]
pub struct IndexedSample<T> {
    pub values: Arc<Vec<T>>,
    pub indices: Option<Arc<Vec<i32>>>,
}

impl<T> IndexedSample<T> {
    /// Create a non-indexed sample.
    pub fn expanded(values: Arc<Vec<T>>) -> Self {
        Self {
            values,
            indices: None,
        }
    }

    /// Create an indexed sample.
    pub fn indexed(values: Arc<Vec<T>>, indices: Arc<Vec<i32>>) -> Self {
        Self {
            values,
            indices: Some(indices),
        }
    }

    /// Check if this sample carries explicit indices.
    pub fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }
}

/// Provider of raw polygon-mesh samples.
///
/// Channel getters are only invoked for indices in `0..num_samples()` and
/// only for channels `channel_info` reports as present. Getters for optional
/// channels have erroring defaults so simple providers implement just what
/// they store.
pub trait MeshProvider: Send + Sync {
    fn num_samples(&self) -> usize;

    fn is_constant(&self) -> bool {
        self.num_samples() <= 1
    }

    fn topology_variance(&self) -> TopologyVariance;

    fn time_sampling(&self) -> &TimeSampling;

    /// Presence and constancy of a channel; None when absent.
    fn channel_info(&self, channel: MeshChannel) -> Option<ChannelInfo>;

    fn counts(&self, index: usize) -> Result<Arc<Vec<i32>>>;

    fn face_indices(&self, index: usize) -> Result<Arc<Vec<i32>>>;

    fn points(&self, index: usize) -> Result<Arc<Vec<Vec3>>>;

    fn velocities(&self, _index: usize) -> Result<Arc<Vec<Vec3>>> {
        Err(crate::util::Error::provider("velocities", "channel not present"))
    }

    fn normals(&self, _index: usize) -> Result<IndexedSample<Vec3>> {
        Err(crate::util::Error::provider("normals", "channel not present"))
    }

    fn uv0(&self, _index: usize) -> Result<IndexedSample<Vec2>> {
        Err(crate::util::Error::provider("uv0", "channel not present"))
    }

    fn uv1(&self, _index: usize) -> Result<IndexedSample<Vec2>> {
        Err(crate::util::Error::provider("uv1", "channel not present"))
    }

    fn rgba(&self, _index: usize) -> Result<IndexedSample<Vec4>> {
        Err(crate::util::Error::provider("rgba", "channel not present"))
    }

    fn rgb(&self, _index: usize) -> Result<IndexedSample<Vec3>> {
        Err(crate::util::Error::provider("rgb", "channel not present"))
    }

    /// Number of face sets attached to this mesh.
    fn num_face_sets(&self) -> usize {
        0
    }

    /// Face indices belonging to face set `set_index` at sample `index`.
    fn face_set(&self, _set_index: usize, _index: usize) -> Result<Arc<Vec<i32>>> {
        Err(crate::util::Error::provider("face_set", "face set not present"))
    }

    /// Stored bounds, when the archive carries them.
    fn self_bounds(&self, _index: usize) -> Option<BBox3f> {
        None
    }

    fn visibility(&self, _index: usize) -> ObjectVisibility {
        ObjectVisibility::Deferred
    }

    fn visibility_constant(&self) -> bool {
        true
    }

    /// Names of user-defined properties attached to this schema.
    fn property_names(&self) -> Vec<String> {
        Vec::new()
    }

    /// Read a user property at a sample index.
    fn property(&self, _name: &str, _index: usize) -> Result<PropertyValue> {
        Err(crate::util::Error::provider("property", "property not present"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexed_sample() {
        let s = IndexedSample::expanded(Arc::new(vec![Vec2::ZERO, Vec2::ONE]));
        assert!(!s.is_indexed());

        let s = IndexedSample::indexed(
            Arc::new(vec![Vec2::ZERO]),
            Arc::new(vec![0, 0, 0]),
        );
        assert!(s.is_indexed());
    }
}
