//! Transform schema.
//!
//! Transforms are cooked as decomposed TRS data. Between samples the
//! translation and scale are linearly interpolated and the rotation is
//! slerped; handedness and scale conversions match the mesh path.

use crate::core::{ImportConfig, Schema, TimeSampling};
use crate::util::math::{Quat, Vec3};
use crate::util::{Chrono, Result};

/// Decomposed transform sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct XformData {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    /// Whether this transform composes with its parent.
    pub inherits: bool,
}

impl Default for XformData {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            inherits: true,
        }
    }
}

impl XformData {
    /// Identity transform.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Compose into a 4x4 matrix.
    pub fn matrix(&self) -> glam::Mat4 {
        glam::Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Provider of raw transform samples.
pub trait XformProvider: Send + Sync {
    fn num_samples(&self) -> usize;

    fn is_constant(&self) -> bool {
        self.num_samples() <= 1
    }

    fn time_sampling(&self) -> &TimeSampling;

    fn sample(&self, index: usize) -> Result<XformData>;
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum CookState {
    Fresh,
    Ready { index: usize, weight: f32 },
    ForceUpdate,
}

/// Transform schema.
pub struct XformSchema {
    provider: Box<dyn XformProvider>,
    config: ImportConfig,
    data: XformData,
    state: CookState,
    data_updated: bool,
}

impl XformSchema {
    pub fn new(provider: Box<dyn XformProvider>, config: ImportConfig) -> Self {
        Self {
            provider,
            config,
            data: XformData::identity(),
            state: CookState::Fresh,
            data_updated: false,
        }
    }

    /// The current cooked transform.
    pub fn data(&self) -> &XformData {
        &self.data
    }

    fn convert(&self, mut d: XformData) -> XformData {
        if self.config.swap_handedness {
            d.translation.x = -d.translation.x;
            // Mirroring across the YZ plane flips the rotation axis
            // components parallel to the plane.
            d.rotation = Quat::from_xyzw(d.rotation.x, -d.rotation.y, -d.rotation.z, d.rotation.w);
        }
        if self.config.scale_factor != 1.0 {
            d.translation *= self.config.scale_factor;
        }
        d
    }
}

impl Schema for XformSchema {
    fn update_sample(&mut self, time: Chrono) -> Result<()> {
        let n = self.provider.num_samples();
        if n == 0 {
            self.data_updated = false;
            return Ok(());
        }

        let (index, weight) = self.provider.time_sampling().time_to_index(time, n);
        if let CookState::Ready { index: pi, weight: pw } = self.state {
            if pi == index && pw == weight {
                self.data_updated = false;
                return Ok(());
            }
        }

        let raw = self.provider.sample(index)?;
        let interpolate =
            self.config.interpolate_samples && weight > 0.0 && index + 1 < n && !self.provider.is_constant();
        self.data = if interpolate {
            let next = self.provider.sample(index + 1)?;
            let blended = XformData {
                translation: raw.translation.lerp(next.translation, weight),
                rotation: raw.rotation.slerp(next.rotation, weight),
                scale: raw.scale.lerp(next.scale, weight),
                inherits: raw.inherits,
            };
            self.convert(blended)
        } else {
            self.convert(raw)
        };

        self.state = CookState::Ready { index, weight };
        self.data_updated = true;
        Ok(())
    }

    fn sync(&mut self) {}

    fn is_constant(&self) -> bool {
        self.provider.is_constant()
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

    struct TestXform {
        frames: Vec<XformData>,
        ts: TimeSampling,
    }

    impl XformProvider for TestXform {
        fn num_samples(&self) -> usize {
            self.frames.len()
        }
        fn time_sampling(&self) -> &TimeSampling {
            &self.ts
        }
        fn sample(&self, index: usize) -> Result<XformData> {
            self.frames
                .get(index)
                .copied()
                .ok_or(crate::util::Error::SampleOutOfBounds {
                    index,
                    count: self.frames.len(),
                })
        }
    }

    fn provider(frames: Vec<XformData>) -> Box<TestXform> {
        Box::new(TestXform {
            frames,
            ts: TimeSampling::uniform(1.0, 0.0),
        })
    }

    #[test]
    fn test_translation_interpolation() {
        let a = XformData {
            translation: Vec3::ZERO,
            ..XformData::identity()
        };
        let b = XformData {
            translation: Vec3::new(2.0, 0.0, 0.0),
            ..XformData::identity()
        };
        let config = ImportConfig {
            swap_handedness: false,
            ..ImportConfig::default()
        };
        let mut schema = XformSchema::new(provider(vec![a, b]), config);
        schema.update_sample(0.5).unwrap();
        assert!((schema.data().translation - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_handedness_and_scale() {
        let a = XformData {
            translation: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_xyzw(0.1, 0.2, 0.3, 0.9),
            ..XformData::identity()
        };
        let config = ImportConfig {
            swap_handedness: true,
            scale_factor: 2.0,
            ..ImportConfig::default()
        };
        let mut schema = XformSchema::new(provider(vec![a]), config);
        schema.update_sample(0.0).unwrap();

        let d = schema.data();
        assert_eq!(d.translation, Vec3::new(-2.0, 4.0, 6.0));
        assert_eq!(d.rotation.y, -0.2);
        assert_eq!(d.rotation.z, -0.3);
        assert_eq!(d.rotation.x, 0.1);
    }

    #[test]
    fn test_memoized_cook() {
        let mut schema = XformSchema::new(
            provider(vec![XformData::identity(), XformData::identity()]),
            ImportConfig::default(),
        );
        schema.update_sample(0.0).unwrap();
        assert!(schema.is_data_updated());
        schema.update_sample(0.0).unwrap();
        assert!(!schema.is_data_updated());
    }
}
