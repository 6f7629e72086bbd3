//! Core layer - configuration, time resolution, provider traits and the
//! schema lifecycle contract.

mod config;
mod property;
mod provider;
mod schema;
mod time_sampling;

pub use config::{ImportConfig, NormalsMode, TangentsMode};
pub use property::PropertyValue;
pub use provider::{
    ChannelInfo, IndexedSample, MeshChannel, MeshProvider, TopologyVariance,
};
pub use schema::Schema;
pub use time_sampling::{TimeSampling, TimeSamplingType};
