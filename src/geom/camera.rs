//! Camera schema.

use crate::core::{ImportConfig, Schema, TimeSampling};
use crate::util::{Chrono, Result};

/// Camera sample data, in the units renderers expect.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraData {
    pub near_clipping_plane: f32,
    pub far_clipping_plane: f32,
    /// Vertical field of view in degrees.
    pub field_of_view: f32,
    pub aspect_ratio: f32,
    /// Focus distance in cm.
    pub focus_distance: f32,
    /// Focal length in mm.
    pub focal_length: f32,
    /// Vertical aperture in cm.
    pub aperture: f32,
}

impl Default for CameraData {
    fn default() -> Self {
        Self {
            near_clipping_plane: 0.3,
            far_clipping_plane: 1000.0,
            field_of_view: 60.0,
            aspect_ratio: 16.0 / 9.0,
            focus_distance: 5.0,
            focal_length: 0.0,
            aperture: 2.4,
        }
    }
}

impl CameraData {
    fn lerp(a: &Self, b: &Self, w: f32) -> Self {
        let t = |x: f32, y: f32| x + (y - x) * w;
        Self {
            near_clipping_plane: t(a.near_clipping_plane, b.near_clipping_plane),
            far_clipping_plane: t(a.far_clipping_plane, b.far_clipping_plane),
            field_of_view: t(a.field_of_view, b.field_of_view),
            aspect_ratio: t(a.aspect_ratio, b.aspect_ratio),
            focus_distance: t(a.focus_distance, b.focus_distance),
            focal_length: t(a.focal_length, b.focal_length),
            aperture: t(a.aperture, b.aperture),
        }
    }
}

/// Provider of raw camera samples.
pub trait CameraProvider: Send + Sync {
    fn num_samples(&self) -> usize;

    fn is_constant(&self) -> bool {
        self.num_samples() <= 1
    }

    fn time_sampling(&self) -> &TimeSampling;

    fn sample(&self, index: usize) -> Result<CameraData>;
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum CookState {
    Fresh,
    Ready { index: usize, weight: f32 },
    ForceUpdate,
}

/// Camera schema.
pub struct CameraSchema {
    provider: Box<dyn CameraProvider>,
    config: ImportConfig,
    data: CameraData,
    state: CookState,
    data_updated: bool,
}

impl CameraSchema {
    pub fn new(provider: Box<dyn CameraProvider>, config: ImportConfig) -> Self {
        Self {
            provider,
            config,
            data: CameraData::default(),
            state: CookState::Fresh,
            data_updated: false,
        }
    }

    /// The current cooked camera parameters.
    pub fn data(&self) -> &CameraData {
        &self.data
    }
}

impl Schema for CameraSchema {
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
        let mut data = if interpolate {
            let next = self.provider.sample(index + 1)?;
            CameraData::lerp(&raw, &next, weight)
        } else {
            raw
        };

        if self.config.aspect_ratio > 0.0 {
            data.aspect_ratio = self.config.aspect_ratio;
        }

        self.data = data;
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

    struct TestCamera {
        frames: Vec<CameraData>,
        ts: TimeSampling,
    }

    impl CameraProvider for TestCamera {
        fn num_samples(&self) -> usize {
            self.frames.len()
        }
        fn time_sampling(&self) -> &TimeSampling {
            &self.ts
        }
        fn sample(&self, index: usize) -> Result<CameraData> {
            self.frames
                .get(index)
                .copied()
                .ok_or(crate::util::Error::SampleOutOfBounds {
                    index,
                    count: self.frames.len(),
                })
        }
    }

    #[test]
    fn test_focal_length_interpolation() {
        let a = CameraData {
            focal_length: 35.0,
            ..CameraData::default()
        };
        let b = CameraData {
            focal_length: 85.0,
            ..CameraData::default()
        };
        let mut schema = CameraSchema::new(
            Box::new(TestCamera {
                frames: vec![a, b],
                ts: TimeSampling::uniform(1.0, 0.0),
            }),
            ImportConfig::default(),
        );
        schema.update_sample(0.5).unwrap();
        assert!((schema.data().focal_length - 60.0).abs() < 1e-5);
    }

    #[test]
    fn test_aspect_ratio_override() {
        let mut schema = CameraSchema::new(
            Box::new(TestCamera {
                frames: vec![CameraData::default()],
                ts: TimeSampling::uniform(1.0, 0.0),
            }),
            ImportConfig {
                aspect_ratio: 2.35,
                ..ImportConfig::default()
            },
        );
        schema.update_sample(0.0).unwrap();
        assert!((schema.data().aspect_ratio - 2.35).abs() < 1e-6);
    }
}
