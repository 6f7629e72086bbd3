//! Point-cloud schema.
//!
//! Points follow the mesh pipeline in miniature: positions are interpolated
//! between adjacent samples, velocities come from the archive or are
//! synthesized from consecutive interpolated frames, and handedness/scale
//! conversions are shared with the mesh path through [`crate::geom::ops`].

use std::sync::Arc;

use crate::core::{ImportConfig, Schema, TimeSampling};
use crate::geom::ops;
use crate::util::math::Vec3;
use crate::util::{BBox3f, Chrono, Error, Result};

/// Presence and peak-size metadata for a points schema.
#[derive(Clone, Copy, Debug, Default)]
pub struct PointsSummary {
    pub has_velocities: bool,
    pub has_ids: bool,
    pub constant_points: bool,
    /// Largest point count across all samples; sizes caller buffers.
    pub peak_count: usize,
}

/// Provider of raw point-cloud samples.
pub trait PointsProvider: Send + Sync {
    fn num_samples(&self) -> usize;

    fn is_constant(&self) -> bool {
        self.num_samples() <= 1
    }

    fn time_sampling(&self) -> &TimeSampling;

    fn point_count(&self, index: usize) -> Result<usize>;

    fn points(&self, index: usize) -> Result<Arc<Vec<Vec3>>>;

    fn velocities(&self, _index: usize) -> Result<Arc<Vec<Vec3>>> {
        Err(Error::provider("velocities", "channel not present"))
    }

    fn has_velocities(&self) -> bool {
        false
    }

    fn ids(&self, _index: usize) -> Result<Arc<Vec<u64>>> {
        Err(Error::provider("ids", "channel not present"))
    }

    fn has_ids(&self) -> bool {
        false
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum CookState {
    Fresh,
    Ready { index: usize, weight: f32 },
    ForceUpdate,
}

/// Point-cloud schema.
pub struct PointsSchema {
    provider: Box<dyn PointsProvider>,
    config: ImportConfig,
    summary: PointsSummary,

    points: Vec<Vec3>,
    points_next: Vec<Vec3>,
    points_prev: Vec<Vec3>,
    points_int: Vec<Vec3>,
    interpolated: bool,
    velocities: Vec<Vec3>,
    ids: Vec<u64>,

    state: CookState,
    data_updated: bool,
}

impl PointsSchema {
    pub fn new(provider: Box<dyn PointsProvider>, config: ImportConfig) -> Self {
        let mut summary = PointsSummary {
            has_velocities: provider.has_velocities(),
            has_ids: provider.has_ids(),
            constant_points: provider.is_constant(),
            peak_count: 0,
        };
        for i in 0..provider.num_samples() {
            if let Ok(n) = provider.point_count(i) {
                summary.peak_count = summary.peak_count.max(n);
            }
        }
        if config.interpolate_samples && !summary.constant_points {
            summary.has_velocities = true;
        }

        Self {
            provider,
            config,
            summary,
            points: Vec::new(),
            points_next: Vec::new(),
            points_prev: Vec::new(),
            points_int: Vec::new(),
            interpolated: false,
            velocities: Vec::new(),
            ids: Vec::new(),
            state: CookState::Fresh,
            data_updated: false,
        }
    }

    pub fn summary(&self) -> &PointsSummary {
        &self.summary
    }

    pub fn points(&self) -> &[Vec3] {
        if self.interpolated {
            &self.points_int
        } else {
            &self.points
        }
    }

    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities
    }

    pub fn ids(&self) -> &[u64] {
        &self.ids
    }

    pub fn bounds(&self) -> Option<BBox3f> {
        let (bbmin, bbmax) = ops::min_max(self.points())?;
        Some(BBox3f::new(bbmin, bbmax))
    }

    fn convert(config: &ImportConfig, v: &mut [Vec3]) {
        if config.swap_handedness {
            ops::swap_handedness(v);
        }
        if config.scale_factor != 1.0 {
            ops::apply_scale(v, config.scale_factor);
        }
    }
}

impl Schema for PointsSchema {
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

        let interpolate = self.config.interpolate_samples
            && !self.summary.constant_points
            && index + 1 < n;

        let raw = self.provider.points(index)?;
        self.points.clear();
        self.points.extend_from_slice(&raw);
        Self::convert(&self.config, &mut self.points);

        if interpolate {
            let raw_next = self.provider.points(index + 1)?;
            self.points_next.clear();
            self.points_next.extend_from_slice(&raw_next);
            Self::convert(&self.config, &mut self.points_next);

            std::mem::swap(&mut self.points_int, &mut self.points_prev);
            ops::lerp_slices(&mut self.points_int, &self.points, &self.points_next, weight);
            self.interpolated = true;

            ops::generate_velocities(
                &mut self.velocities,
                &self.points_int,
                &self.points_prev,
                self.config.vertex_motion_scale,
            );
        } else {
            self.interpolated = false;
            if self.provider.has_velocities() {
                let raw_vel = self.provider.velocities(index)?;
                self.velocities.clear();
                self.velocities.extend_from_slice(&raw_vel);
                Self::convert(&self.config, &mut self.velocities);
            } else {
                self.velocities.clear();
            }
        }

        if self.provider.has_ids() {
            let raw_ids = self.provider.ids(index)?;
            self.ids.clear();
            self.ids.extend_from_slice(&raw_ids);
        }

        self.state = CookState::Ready { index, weight };
        self.data_updated = true;
        Ok(())
    }

    fn sync(&mut self) {}

    fn is_constant(&self) -> bool {
        self.summary.constant_points
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

    struct TestPoints {
        frames: Vec<Arc<Vec<Vec3>>>,
        ts: TimeSampling,
    }

    impl PointsProvider for TestPoints {
        fn num_samples(&self) -> usize {
            self.frames.len()
        }
        fn time_sampling(&self) -> &TimeSampling {
            &self.ts
        }
        fn point_count(&self, index: usize) -> Result<usize> {
            Ok(self.frames.get(index).map(|f| f.len()).unwrap_or(0))
        }
        fn points(&self, index: usize) -> Result<Arc<Vec<Vec3>>> {
            self.frames
                .get(index)
                .cloned()
                .ok_or(Error::SampleOutOfBounds {
                    index,
                    count: self.frames.len(),
                })
        }
    }

    fn provider(frames: Vec<Vec<Vec3>>) -> Box<TestPoints> {
        Box::new(TestPoints {
            frames: frames.into_iter().map(Arc::new).collect(),
            ts: TimeSampling::uniform(1.0, 0.0),
        })
    }

    fn no_swap() -> ImportConfig {
        ImportConfig {
            swap_handedness: false,
            ..ImportConfig::default()
        }
    }

    #[test]
    fn test_peak_count() {
        let schema = PointsSchema::new(
            provider(vec![
                vec![Vec3::ZERO; 3],
                vec![Vec3::ZERO; 7],
                vec![Vec3::ZERO; 5],
            ]),
            no_swap(),
        );
        assert_eq!(schema.summary().peak_count, 7);
    }

    #[test]
    fn test_interpolated_positions_and_velocities() {
        let mut schema = PointsSchema::new(
            provider(vec![
                vec![Vec3::new(0.0, 0.0, 0.0)],
                vec![Vec3::new(2.0, 0.0, 0.0)],
            ]),
            no_swap(),
        );

        schema.update_sample(0.0).unwrap();
        assert_eq!(schema.points(), &[Vec3::ZERO]);

        schema.update_sample(0.5).unwrap();
        assert!((schema.points()[0] - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-6);
        assert!((schema.velocities()[0] - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_bounds() {
        let mut schema = PointsSchema::new(
            provider(vec![vec![
                Vec3::new(-1.0, 0.0, 0.0),
                Vec3::new(3.0, 2.0, -5.0),
            ]]),
            no_swap(),
        );
        schema.update_sample(0.0).unwrap();
        let b = schema.bounds().unwrap();
        assert_eq!(b.min, Vec3::new(-1.0, 0.0, -5.0));
        assert_eq!(b.max, Vec3::new(3.0, 2.0, 0.0));
    }
}
