//! Mesh summary planning.
//!
//! The summary is derived once per topology-variance class from archive
//! metadata plus the import configuration. It records which channels exist,
//! which are constant over time, and which get interpolated or synthesized.
//! Each frame the planner also produces an explicit cook plan enumerating
//! the per-channel work (fetch, remap, lerp, synthesize) so the cooker
//! executes it without re-deriving conditionals.

use crate::core::{ImportConfig, MeshChannel, MeshProvider, NormalsMode, TangentsMode, TopologyVariance};

/// Presence, constancy and derivation flags for every mesh channel.
#[derive(Clone, Copy, Debug, Default)]
pub struct MeshSummary {
    pub topology_variance: TopologyVariance,
    /// Every present channel (including visibility) is constant and the
    /// topology is constant.
    pub constant: bool,

    pub has_counts: bool,
    pub has_indices: bool,

    pub has_points: bool,
    pub constant_points: bool,

    pub has_velocities_prop: bool,
    pub has_velocities: bool,
    pub constant_velocities: bool,

    pub has_normals_prop: bool,
    pub has_normals: bool,
    pub constant_normals: bool,

    pub has_uv0_prop: bool,
    pub has_uv0: bool,
    pub constant_uv0: bool,

    pub has_uv1_prop: bool,
    pub has_uv1: bool,
    pub constant_uv1: bool,

    pub has_rgba_prop: bool,
    pub has_rgba: bool,
    pub constant_rgba: bool,

    pub has_rgb_prop: bool,
    pub has_rgb: bool,
    pub constant_rgb: bool,

    pub has_tangents: bool,
    pub constant_tangents: bool,

    pub interpolate_points: bool,
    pub interpolate_normals: bool,
    pub interpolate_uv0: bool,
    pub interpolate_uv1: bool,
    pub interpolate_rgba: bool,
    pub interpolate_rgb: bool,

    pub compute_normals: bool,
    pub compute_tangents: bool,
    pub compute_velocities: bool,
}

impl MeshSummary {
    /// Derive the summary from provider metadata and the configuration.
    pub fn plan(provider: &dyn MeshProvider, config: &ImportConfig) -> Self {
        let mut s = Self {
            topology_variance: provider.topology_variance(),
            constant: provider.is_constant() && provider.visibility_constant(),
            ..Self::default()
        };

        s.has_counts = provider.channel_info(MeshChannel::Counts).is_some();
        s.has_indices = provider.channel_info(MeshChannel::Indices).is_some();

        if let Some(info) = provider.channel_info(MeshChannel::Points) {
            s.has_points = true;
            s.constant_points = info.constant;
            if !info.constant {
                s.constant = false;
            }
        }

        if config.normals_mode != NormalsMode::Ignore {
            if let Some(info) = provider.channel_info(MeshChannel::Normals) {
                s.has_normals_prop = true;
                s.has_normals = true;
                s.constant_normals =
                    info.constant && config.normals_mode != NormalsMode::AlwaysCompute;
                if !s.constant_normals {
                    s.constant = false;
                }
            }
        }

        if let Some(info) = provider.channel_info(MeshChannel::Uv0) {
            s.has_uv0_prop = true;
            s.has_uv0 = true;
            s.constant_uv0 = info.constant;
            if !info.constant {
                s.constant = false;
            }
        }

        if let Some(info) = provider.channel_info(MeshChannel::Uv1) {
            s.has_uv1_prop = true;
            s.has_uv1 = true;
            s.constant_uv1 = info.constant;
            if !info.constant {
                s.constant = false;
            }
        }

        if let Some(info) = provider.channel_info(MeshChannel::Rgba) {
            s.has_rgba_prop = true;
            s.has_rgba = true;
            s.constant_rgba = info.constant;
            if !info.constant {
                s.constant = false;
            }
        }

        if let Some(info) = provider.channel_info(MeshChannel::Rgb) {
            s.has_rgb_prop = true;
            s.has_rgb = true;
            s.constant_rgb = info.constant;
            if !info.constant {
                s.constant = false;
            }
        }

        let interpolate = config.interpolate_samples
            && !s.constant
            && s.topology_variance != TopologyVariance::Heterogeneous;
        s.interpolate_points = interpolate && !s.constant_points;

        // Velocities: synthesized from consecutive interpolated positions,
        // or read from the archive when not interpolating.
        if interpolate {
            s.has_velocities = true;
            s.compute_velocities = true;
        } else if let Some(info) = provider.channel_info(MeshChannel::Velocities) {
            s.has_velocities_prop = true;
            s.has_velocities = true;
            s.constant_velocities = info.constant;
        }

        // Normals: interpolate stored data or compute from positions.
        if !s.constant_normals {
            if s.has_normals && config.normals_mode != NormalsMode::AlwaysCompute {
                s.interpolate_normals = interpolate;
            } else {
                s.compute_normals = config.normals_mode == NormalsMode::AlwaysCompute
                    || (!s.has_normals && config.normals_mode == NormalsMode::ComputeIfMissing);
                if s.compute_normals {
                    s.has_normals = true;
                    s.constant_normals = s.constant_points;
                }
            }
        }

        if config.tangents_mode == TangentsMode::Compute && s.has_normals && s.has_uv0 {
            s.has_tangents = true;
            s.compute_tangents = true;
            if s.constant_points && s.constant_normals && s.constant_uv0 {
                s.constant_tangents = true;
            }
        }

        if interpolate {
            s.interpolate_uv0 = s.has_uv0_prop && !s.constant_uv0;
            s.interpolate_uv1 = s.has_uv1_prop && !s.constant_uv1;
            s.interpolate_rgba = s.has_rgba_prop && !s.constant_rgba;
            s.interpolate_rgb = s.has_rgb_prop && !s.constant_rgb;
        }

        s
    }
}

/// What changed between the previous cook and the requested one.
#[derive(Clone, Copy, Debug)]
pub struct FrameChange {
    pub topology_changed: bool,
    pub index_changed: bool,
}

/// Per-channel work order for one cook.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChannelPlan {
    /// Fetch the raw sample at the floor index.
    pub fetch: bool,
    /// Also fetch the sample at the next index (interpolation input).
    pub fetch_next: bool,
    /// Rebuild the cooked array through the remap table.
    pub remap: bool,
    /// Blend the floor and next arrays into the interpolation buffer.
    pub lerp: bool,
}

/// Explicit work order for one cook, produced by the planner and executed
/// by the cooker without further channel conditionals.
#[derive(Clone, Copy, Debug, Default)]
pub struct CookPlan {
    /// Run the refiner and rebuild remap tables.
    pub refine: bool,
    /// Re-read topology channels (counts, indices, face sets).
    pub fetch_topology: bool,

    pub points: ChannelPlan,
    pub velocities: ChannelPlan,
    pub normals: ChannelPlan,
    pub uv0: ChannelPlan,
    pub uv1: ChannelPlan,
    pub rgba: ChannelPlan,
    pub rgb: ChannelPlan,

    pub compute_normals: bool,
    pub compute_tangents: bool,
    pub compute_velocities: bool,
}

impl CookPlan {
    /// Build the work order for a frame.
    pub fn build(summary: &MeshSummary, frame: FrameChange) -> Self {
        let changed = frame.topology_changed || frame.index_changed;

        let mut plan = Self {
            refine: frame.topology_changed,
            fetch_topology: frame.topology_changed,
            ..Self::default()
        };

        plan.points = ChannelPlan {
            fetch: summary.has_points,
            fetch_next: summary.interpolate_points,
            remap: changed,
            lerp: summary.interpolate_points,
        };

        plan.velocities = ChannelPlan {
            fetch: summary.has_velocities_prop && !summary.compute_velocities,
            fetch_next: false,
            remap: changed && summary.has_velocities_prop && !summary.compute_velocities,
            lerp: false,
        };

        plan.normals = ChannelPlan {
            fetch: summary.has_normals_prop && !summary.compute_normals,
            fetch_next: summary.interpolate_normals,
            remap: changed && summary.has_normals_prop && !summary.compute_normals,
            lerp: summary.interpolate_normals,
        };

        plan.uv0 = ChannelPlan {
            fetch: summary.has_uv0_prop,
            fetch_next: summary.interpolate_uv0,
            remap: changed && summary.has_uv0_prop,
            lerp: summary.interpolate_uv0,
        };

        plan.uv1 = ChannelPlan {
            fetch: summary.has_uv1_prop,
            fetch_next: summary.interpolate_uv1,
            remap: changed && summary.has_uv1_prop,
            lerp: summary.interpolate_uv1,
        };

        plan.rgba = ChannelPlan {
            fetch: summary.has_rgba_prop,
            fetch_next: summary.interpolate_rgba,
            remap: changed && summary.has_rgba_prop,
            lerp: summary.interpolate_rgba,
        };

        plan.rgb = ChannelPlan {
            fetch: summary.has_rgb_prop,
            fetch_next: summary.interpolate_rgb,
            remap: changed && summary.has_rgb_prop,
            lerp: summary.interpolate_rgb,
        };

        plan.compute_velocities = summary.compute_velocities;
        plan.compute_normals =
            summary.compute_normals && (frame.index_changed || summary.interpolate_points);
        plan.compute_tangents = summary.compute_tangents
            && (frame.index_changed
                || summary.interpolate_points
                || summary.interpolate_normals);

        plan
    }

    /// True when executing this plan would change nothing.
    pub fn is_noop(&self) -> bool {
        !self.refine
            && !self.points.remap
            && !self.points.lerp
            && !self.normals.lerp
            && !self.uv0.lerp
            && !self.uv1.lerp
            && !self.rgba.lerp
            && !self.rgb.lerp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ChannelInfo, TimeSampling};
    use crate::util::math::Vec3;
    use crate::util::Result;
    use std::sync::Arc;

    struct MetaProvider {
        samples: usize,
        variance: TopologyVariance,
        constant_points: bool,
        normals: Option<ChannelInfo>,
        uv0: Option<ChannelInfo>,
        velocities: Option<ChannelInfo>,
        ts: TimeSampling,
    }

    impl MetaProvider {
        fn animated() -> Self {
            Self {
                samples: 10,
                variance: TopologyVariance::Homogeneous,
                constant_points: false,
                normals: None,
                uv0: None,
                velocities: None,
                ts: TimeSampling::uniform(1.0, 0.0),
            }
        }
    }

    impl MeshProvider for MetaProvider {
        fn num_samples(&self) -> usize {
            self.samples
        }
        fn topology_variance(&self) -> TopologyVariance {
            self.variance
        }
        fn time_sampling(&self) -> &TimeSampling {
            &self.ts
        }
        fn channel_info(&self, channel: MeshChannel) -> Option<ChannelInfo> {
            match channel {
                MeshChannel::Counts | MeshChannel::Indices => Some(ChannelInfo { constant: true }),
                MeshChannel::Points => Some(ChannelInfo {
                    constant: self.constant_points,
                }),
                MeshChannel::Normals => self.normals,
                MeshChannel::Uv0 => self.uv0,
                MeshChannel::Velocities => self.velocities,
                _ => None,
            }
        }
        fn counts(&self, _: usize) -> Result<Arc<Vec<i32>>> {
            Ok(Arc::new(Vec::new()))
        }
        fn face_indices(&self, _: usize) -> Result<Arc<Vec<i32>>> {
            Ok(Arc::new(Vec::new()))
        }
        fn points(&self, _: usize) -> Result<Arc<Vec<Vec3>>> {
            Ok(Arc::new(Vec::new()))
        }
    }

    #[test]
    fn test_interpolation_enables_velocity_synthesis() {
        let provider = MetaProvider::animated();
        let config = ImportConfig::default();
        let s = MeshSummary::plan(&provider, &config);

        assert!(!s.constant);
        assert!(s.interpolate_points);
        assert!(s.has_velocities);
        assert!(s.compute_velocities);
        assert!(!s.has_velocities_prop);
    }

    #[test]
    fn test_stored_velocities_without_interpolation() {
        let mut provider = MetaProvider::animated();
        provider.velocities = Some(ChannelInfo { constant: false });
        let config = ImportConfig {
            interpolate_samples: false,
            ..ImportConfig::default()
        };
        let s = MeshSummary::plan(&provider, &config);

        assert!(!s.compute_velocities);
        assert!(s.has_velocities_prop);
        assert!(s.has_velocities);
    }

    #[test]
    fn test_heterogeneous_disables_interpolation() {
        let mut provider = MetaProvider::animated();
        provider.variance = TopologyVariance::Heterogeneous;
        let s = MeshSummary::plan(&provider, &ImportConfig::default());

        assert!(!s.interpolate_points);
        assert!(!s.compute_velocities);
    }

    #[test]
    fn test_compute_if_missing_normals() {
        let provider = MetaProvider::animated();
        let s = MeshSummary::plan(&provider, &ImportConfig::default());
        assert!(s.compute_normals);
        assert!(s.has_normals);
        assert!(!s.has_normals_prop);
        // Computed normals follow point constancy.
        assert!(!s.constant_normals);
    }

    #[test]
    fn test_always_compute_overrides_stored_normals() {
        let mut provider = MetaProvider::animated();
        provider.normals = Some(ChannelInfo { constant: true });
        let config = ImportConfig {
            normals_mode: NormalsMode::AlwaysCompute,
            ..ImportConfig::default()
        };
        let s = MeshSummary::plan(&provider, &config);
        assert!(s.compute_normals);
        assert!(!s.constant_normals);
    }

    #[test]
    fn test_ignore_normals() {
        let mut provider = MetaProvider::animated();
        provider.normals = Some(ChannelInfo { constant: true });
        let config = ImportConfig {
            normals_mode: NormalsMode::Ignore,
            ..ImportConfig::default()
        };
        let s = MeshSummary::plan(&provider, &config);
        assert!(!s.has_normals);
        assert!(!s.compute_normals);
    }

    #[test]
    fn test_tangents_require_normals_and_uvs() {
        let mut provider = MetaProvider::animated();
        let config = ImportConfig {
            tangents_mode: TangentsMode::Compute,
            ..ImportConfig::default()
        };

        // Normals computed, but no UVs.
        let s = MeshSummary::plan(&provider, &config);
        assert!(!s.has_tangents);

        provider.uv0 = Some(ChannelInfo { constant: true });
        let s = MeshSummary::plan(&provider, &config);
        assert!(s.has_tangents);
        assert!(s.compute_tangents);
        assert!(!s.constant_tangents);
    }

    #[test]
    fn test_cook_plan_topology_change() {
        let provider = MetaProvider::animated();
        let s = MeshSummary::plan(&provider, &ImportConfig::default());
        let plan = CookPlan::build(
            &s,
            FrameChange {
                topology_changed: true,
                index_changed: true,
            },
        );

        assert!(plan.refine);
        assert!(plan.fetch_topology);
        assert!(plan.points.fetch);
        assert!(plan.points.remap);
        assert!(plan.points.lerp);
        assert!(plan.compute_normals);
        assert!(!plan.is_noop());
    }

    #[test]
    fn test_cook_plan_noop_frame() {
        let mut provider = MetaProvider::animated();
        provider.constant_points = true;
        provider.normals = Some(ChannelInfo { constant: true });
        let config = ImportConfig {
            interpolate_samples: false,
            ..ImportConfig::default()
        };
        let s = MeshSummary::plan(&provider, &config);
        let plan = CookPlan::build(
            &s,
            FrameChange {
                topology_changed: false,
                index_changed: false,
            },
        );
        assert!(plan.is_noop());
    }
}
