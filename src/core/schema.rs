//! Schema lifecycle contract.
//!
//! Every schema kind (polymesh, xform, camera, points) shares the same
//! per-frame lifecycle: resolve a time, cook a sample, publish it as the
//! current read view. The contract is a small capability trait; there is no
//! deeper hierarchy.

use crate::util::{Chrono, Result};

/// Lifecycle contract implemented by every schema kind.
pub trait Schema {
    /// Resolve `time` against the schema's time sampling and cook the sample
    /// for it. Returns without work when the resolved (index, weight) pair is
    /// unchanged and no force update is pending.
    ///
    /// On a provider failure the previously cooked sample stays visible.
    fn update_sample(&mut self, time: Chrono) -> Result<()>;

    /// Finalize any deferred work for the last `update_sample`. Cooking is
    /// synchronous in this implementation, so this is a publication point
    /// only.
    fn sync(&mut self);

    /// True when every sample of this schema is identical (data and
    /// visibility), i.e. cooking is independent of time.
    fn is_constant(&self) -> bool;

    /// True when the last `update_sample` produced new cooked data.
    fn is_data_updated(&self) -> bool;

    /// Request a full rebuild (topology included) on the next update.
    fn mark_force_update(&mut self);

    /// First and last sample times, when the schema has any samples.
    fn time_range(&self) -> Option<(Chrono, Chrono)> {
        None
    }
}
