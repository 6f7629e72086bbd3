//! User-defined property support.
//!
//! Archives can attach arbitrary per-schema properties sampled over time.
//! The importer does not interpret them; it surfaces typed values the host
//! forwards to its own side.

use crate::util::math::{Mat4, Vec2, Vec3, Vec4};

/// A single user-property sample.
///
/// Scalar variants hold one value; array variants hold one value per
/// element, in archive order.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int(i32),
    UInt(u32),
    Float(f32),
    Float2(Vec2),
    Float3(Vec3),
    Float4(Vec4),
    Float4x4(Mat4),

    BoolArray(Vec<bool>),
    IntArray(Vec<i32>),
    UIntArray(Vec<u32>),
    FloatArray(Vec<f32>),
    Float2Array(Vec<Vec2>),
    Float3Array(Vec<Vec3>),
    Float4Array(Vec<Vec4>),
    Float4x4Array(Vec<Mat4>),
}

impl PropertyValue {
    /// Whether this is an array variant.
    pub fn is_array(&self) -> bool {
        matches!(
            self,
            Self::BoolArray(_)
                | Self::IntArray(_)
                | Self::UIntArray(_)
                | Self::FloatArray(_)
                | Self::Float2Array(_)
                | Self::Float3Array(_)
                | Self::Float4Array(_)
                | Self::Float4x4Array(_)
        )
    }

    /// Element count: 1 for scalars, the array length otherwise.
    pub fn len(&self) -> usize {
        match self {
            Self::BoolArray(v) => v.len(),
            Self::IntArray(v) => v.len(),
            Self::UIntArray(v) => v.len(),
            Self::FloatArray(v) => v.len(),
            Self::Float2Array(v) => v.len(),
            Self::Float3Array(v) => v.len(),
            Self::Float4Array(v) => v.len(),
            Self::Float4x4Array(v) => v.len(),
            _ => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f32),
            _ => None,
        }
    }
}
