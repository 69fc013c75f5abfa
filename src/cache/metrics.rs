//! Acquisition cycle metrics
//!
//! Counters and timings for the incremental cache. Recorder-agnostic: nothing
//! is exported unless the host process installs a `metrics` recorder.

use crate::error::ErrorKind;

pub const CYCLES_STARTED: &str = "catalog_cache_cycles_started_total";
pub const CYCLES_SUCCEEDED: &str = "catalog_cache_cycles_succeeded_total";
pub const CYCLES_FAILED: &str = "catalog_cache_cycles_failed_total";
pub const CYCLES_COALESCED: &str = "catalog_cache_cycles_coalesced_total";
pub const ENTITIES_MERGED: &str = "catalog_cache_entities_merged_total";
pub const ITEMS_DROPPED: &str = "catalog_cache_items_dropped_total";
pub const CYCLE_DURATION: &str = "catalog_cache_cycle_duration_seconds";

pub struct CacheMetrics;

impl CacheMetrics {
    pub fn record_cycle_started() {
        ::metrics::counter!(CYCLES_STARTED).increment(1);
    }

    pub fn record_cycle_success(added: usize, dropped: usize, duration_secs: f64) {
        ::metrics::counter!(CYCLES_SUCCEEDED).increment(1);
        ::metrics::counter!(ENTITIES_MERGED).increment(added as u64);
        ::metrics::counter!(ITEMS_DROPPED).increment(dropped as u64);
        ::metrics::histogram!(CYCLE_DURATION).record(duration_secs);
    }

    pub fn record_cycle_failure(kind: ErrorKind, duration_secs: f64) {
        ::metrics::counter!(CYCLES_FAILED, "kind" => kind.as_str()).increment(1);
        ::metrics::histogram!(CYCLE_DURATION).record(duration_secs);
    }

    /// A load request arrived while a cycle was already in flight
    pub fn record_coalesced() {
        ::metrics::counter!(CYCLES_COALESCED).increment(1);
    }
}
