//! Incremental catalog cache
//!
//! Owns the growing, insertion-ordered, id-deduplicated collection of
//! entities. Growth happens in acquisition cycles that fetch the next slice of
//! the remote list, resolve every row's detail record concurrently, and merge
//! the surviving entities in one atomic step. At most one cycle is in flight;
//! overlapping load requests are coalesced.

pub mod metrics;

use crate::config::CatalogConfig;
use crate::error::{CatalogError, ErrorKind, Result};
use crate::transform::transform;
use crate::types::{CatalogSource, Entity, Locator};
use futures::future::join_all;
use self::metrics::CacheMetrics;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Acquisition policy knobs, usually derived from [`CatalogConfig`]
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub batch_size: usize,
    pub prefetch_threshold: usize,
    /// Ceiling on the collection size, used until (and capping) the remote count
    pub max_entities: usize,
    /// Share of a batch's detail fetches that may fail with `RemoteUnavailable`
    /// before the whole cycle is considered failed
    pub detail_failure_tolerance: f64,
}

impl From<&CatalogConfig> for CacheSettings {
    fn from(config: &CatalogConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            prefetch_threshold: config.prefetch_threshold,
            max_entities: config.max_entities,
            detail_failure_tolerance: config.detail_failure_tolerance,
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self::from(&CatalogConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Idle,
    Fetching,
    Errored(ErrorKind),
}

/// What a `load_more` call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A cycle ran and merged `added` new entities; `dropped` rows were omitted
    Loaded { added: usize, dropped: usize },
    /// The slice was cut at a detail fetch that failed with
    /// `RemoteUnavailable`; `deferred` rows from there on are requested again
    /// by the next cycle
    Partial { added: usize, dropped: usize, deferred: usize },
    /// Another cycle was already in flight; nothing was issued
    Coalesced,
    /// Nothing more is available from the remote catalog
    Exhausted,
}

/// Read-only view handed to the presentation layer
#[derive(Debug, Clone)]
pub struct CacheSnapshot {
    pub entities: Arc<Vec<Entity>>,
    pub is_loading: bool,
    pub has_more: bool,
    pub error: Option<ErrorKind>,
    pub batches_requested: u64,
    pub total_available: usize,
}

impl CacheSnapshot {
    pub fn total_loaded(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[derive(Debug)]
struct CacheState {
    entities: Arc<Vec<Entity>>,
    ids: HashSet<u32>,
    batches_requested: u64,
    next_offset: usize,
    total_available: usize,
    remote_exhausted: bool,
    phase: CyclePhase,
}

impl CacheState {
    fn new(max_entities: usize) -> Self {
        Self {
            entities: Arc::new(Vec::new()),
            ids: HashSet::new(),
            batches_requested: 0,
            next_offset: 0,
            total_available: max_entities,
            remote_exhausted: false,
            phase: CyclePhase::Idle,
        }
    }

    fn has_more(&self) -> bool {
        !self.remote_exhausted
            && self.entities.len() < self.total_available
            && self.next_offset < self.total_available
    }

    /// Append unseen entities in the given order. Ids already present are
    /// skipped, so existing entries never move. Readers holding an older
    /// snapshot keep their own copy.
    fn merge(&mut self, incoming: Vec<Entity>) -> usize {
        let fresh: Vec<Entity> = incoming
            .into_iter()
            .filter(|entity| self.ids.insert(entity.id))
            .collect();
        let added = fresh.len();
        if added > 0 {
            Arc::make_mut(&mut self.entities).extend(fresh);
        }
        added
    }
}

/// Result of one successful cycle, not yet merged
struct Batch {
    offset: usize,
    /// List rows consumed; fewer than the page held when the slice was cut
    rows: usize,
    deferred: usize,
    entities: Vec<Entity>,
    dropped: usize,
    remote_count: usize,
    has_next: bool,
}

pub struct CatalogCache {
    source: Arc<dyn CatalogSource>,
    settings: CacheSettings,
    state: RwLock<CacheState>,
    in_flight: AtomicBool,
    cycle_done: Notify,
}

/// Marks the single in-flight cycle. Dropping it, on completion or because
/// the caller abandoned the future, releases the slot and wakes waiters.
struct FlightGuard<'a> {
    cache: &'a CatalogCache,
}

impl<'a> FlightGuard<'a> {
    fn acquire(cache: &'a CatalogCache) -> Option<Self> {
        cache
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { cache })
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        {
            let mut state = self.cache.write_state();
            // An abandoned cycle merges nothing and leaves no error behind
            if state.phase == CyclePhase::Fetching {
                state.phase = CyclePhase::Idle;
            }
        }
        self.cache.in_flight.store(false, Ordering::Release);
        self.cache.cycle_done.notify_waiters();
    }
}

impl CatalogCache {
    pub fn new(source: Arc<dyn CatalogSource>, settings: CacheSettings) -> Result<Self> {
        if settings.batch_size == 0 {
            return Err(CatalogError::InvalidArgument(
                "batch_size must be greater than zero".into(),
            ));
        }
        let state = CacheState::new(settings.max_entities);
        Ok(Self {
            source,
            settings,
            state: RwLock::new(state),
            in_flight: AtomicBool::new(false),
            cycle_done: Notify::new(),
        })
    }

    pub fn from_config(source: Arc<dyn CatalogSource>, config: &CatalogConfig) -> Result<Self> {
        Self::new(source, CacheSettings::from(config))
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    fn read_state(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        let state = self.read_state();
        let error = match state.phase {
            CyclePhase::Errored(kind) => Some(kind),
            _ => None,
        };
        CacheSnapshot {
            entities: Arc::clone(&state.entities),
            is_loading: self.is_loading(),
            has_more: state.has_more(),
            error,
            batches_requested: state.batches_requested,
            total_available: state.total_available,
        }
    }

    pub fn entities(&self) -> Arc<Vec<Entity>> {
        Arc::clone(&self.read_state().entities)
    }

    pub fn phase(&self) -> CyclePhase {
        self.read_state().phase
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn has_more(&self) -> bool {
        self.read_state().has_more()
    }

    pub fn total_loaded(&self) -> usize {
        self.read_state().entities.len()
    }

    /// Cached entity by id, without touching the network
    pub fn get(&self, id: u32) -> Option<Entity> {
        self.read_state().entities.iter().find(|e| e.id == id).cloned()
    }

    /// Run one acquisition cycle: the next slice of the list plus its detail
    /// records. Coalesced into a no-op while another cycle is in flight. On
    /// failure the collection is untouched and the same call may be retried.
    #[instrument(skip(self))]
    pub async fn load_more(&self) -> Result<LoadOutcome> {
        let Some(_flight) = FlightGuard::acquire(self) else {
            debug!("Acquisition cycle already in flight, coalescing");
            CacheMetrics::record_coalesced();
            return Ok(LoadOutcome::Coalesced);
        };

        let Some((offset, limit)) = self.begin_cycle() else {
            return Ok(LoadOutcome::Exhausted);
        };

        CacheMetrics::record_cycle_started();
        let started = Instant::now();
        let result = self.run_cycle(offset, limit).await;
        self.finish_cycle(result, started.elapsed().as_secs_f64())
    }

    fn begin_cycle(&self) -> Option<(usize, usize)> {
        let mut state = self.write_state();
        if !state.has_more() {
            if matches!(state.phase, CyclePhase::Errored(_)) {
                state.phase = CyclePhase::Idle;
            }
            return None;
        }
        state.phase = CyclePhase::Fetching;
        state.batches_requested += 1;
        let remaining = state.total_available.saturating_sub(state.next_offset);
        let limit = self.settings.batch_size.min(remaining).max(1);
        debug!(
            "Starting acquisition cycle {} at offset {} (limit {})",
            state.batches_requested, state.next_offset, limit
        );
        Some((state.next_offset, limit))
    }

    async fn run_cycle(&self, offset: usize, limit: usize) -> Result<Batch> {
        let page = self.source.fetch_list_page(limit, offset).await?;
        let page_rows = page.results.len();

        let locators: Vec<Locator> = page.results.iter().map(Locator::from).collect();
        // join_all yields results in list order regardless of completion order
        let results = join_all(locators.iter().map(|locator| async move {
            let raw = self.source.fetch_detail(locator).await?;
            transform(&raw)
        }))
        .await;

        let unavailable = results
            .iter()
            .filter(|result| matches!(result, Err(err) if !err.is_droppable()))
            .count();
        let over_tolerance = page_rows > 0
            && unavailable as f64 / page_rows as f64 > self.settings.detail_failure_tolerance;
        if over_tolerance {
            warn!("{} of {} detail fetches unavailable, failing cycle", unavailable, page_rows);
        }

        let mut entities = Vec::with_capacity(page_rows);
        let mut dropped = 0;
        let mut rows = page_rows;
        for (index, (locator, result)) in locators.iter().zip(results).enumerate() {
            match result {
                Ok(entity) => entities.push(entity),
                Err(err) if err.is_droppable() => {
                    warn!("Dropping {} from batch: {}", locator, err);
                    dropped += 1;
                }
                // A leading failure would leave the offset where it is
                Err(err) if index == 0 || over_tolerance => return Err(err),
                // Cut the slice here; this row and the rest are requested again
                Err(err) => {
                    warn!("Detail fetch for {} failed, deferring rest of slice: {}", locator, err);
                    rows = index;
                    break;
                }
            }
        }

        Ok(Batch {
            offset,
            rows,
            deferred: page_rows - rows,
            entities,
            dropped,
            remote_count: page.count,
            has_next: page.next.is_some(),
        })
    }

    fn finish_cycle(&self, result: Result<Batch>, duration_secs: f64) -> Result<LoadOutcome> {
        let mut state = self.write_state();
        match result {
            Ok(batch) => {
                let added = state.merge(batch.entities);
                state.next_offset = state.next_offset.max(batch.offset + batch.rows);
                state.total_available = batch.remote_count.min(self.settings.max_entities);
                state.remote_exhausted =
                    batch.deferred == 0 && (!batch.has_next || batch.rows == 0);
                state.phase = CyclePhase::Idle;
                info!(
                    "Cycle {} merged {} entities ({} dropped, {} deferred), {} of {} loaded",
                    state.batches_requested,
                    added,
                    batch.dropped,
                    batch.deferred,
                    state.entities.len(),
                    state.total_available
                );
                CacheMetrics::record_cycle_success(added, batch.dropped, duration_secs);
                let dropped = batch.dropped;
                Ok(match batch.deferred {
                    0 => LoadOutcome::Loaded { added, dropped },
                    deferred => LoadOutcome::Partial { added, dropped, deferred },
                })
            }
            Err(err) => {
                warn!("Acquisition cycle {} failed: {}", state.batches_requested, err);
                state.phase = CyclePhase::Errored(err.kind());
                CacheMetrics::record_cycle_failure(err.kind(), duration_secs);
                Err(err)
            }
        }
    }

    /// Fire-and-forget `load_more` for callers that only observe snapshots
    pub fn spawn_load_more(self: &Arc<Self>) -> JoinHandle<Result<LoadOutcome>> {
        let cache = Arc::clone(self);
        tokio::spawn(async move { cache.load_more().await })
    }

    /// Run cycles until at least `target` entities are loaded, nothing more is
    /// available, or a cycle fails. Returns the loaded count.
    pub async fn ensure_loaded(&self, target: usize) -> Result<usize> {
        loop {
            {
                let state = self.read_state();
                if state.entities.len() >= target || !state.has_more() {
                    return Ok(state.entities.len());
                }
            }

            let notified = self.cycle_done.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.load_more().await? {
                LoadOutcome::Loaded { .. } | LoadOutcome::Partial { .. } => {}
                LoadOutcome::Exhausted => return Ok(self.total_loaded()),
                // Wait for the other caller's cycle instead of spinning
                LoadOutcome::Coalesced => notified.await,
            }
        }
    }

    /// Whether the consumer is close enough to the end of what is loaded that
    /// the next batch should be requested. `consumed` is how many items of the
    /// current projection the consumer has already seen.
    pub fn should_prefetch(&self, projection_len: usize, consumed: usize) -> bool {
        let remaining = projection_len.saturating_sub(consumed);
        projection_len > 0
            && remaining <= self.settings.prefetch_threshold
            && !self.is_loading()
            && self.has_more()
    }

    pub async fn prefetch_if_needed(
        &self,
        projection_len: usize,
        consumed: usize,
    ) -> Result<Option<LoadOutcome>> {
        if !self.should_prefetch(projection_len, consumed) {
            return Ok(None);
        }
        debug!("Prefetching: {} of {} consumed", consumed, projection_len);
        self.load_more().await.map(Some)
    }

    pub fn spawn_prefetch_if_needed(
        self: &Arc<Self>,
        projection_len: usize,
        consumed: usize,
    ) -> Option<JoinHandle<Result<LoadOutcome>>> {
        self.should_prefetch(projection_len, consumed)
            .then(|| self.spawn_load_more())
    }

    /// Entity for the detail view: the cached copy when present, otherwise a
    /// direct detail fetch that is not merged into the list.
    #[instrument(skip(self))]
    pub async fn entity(&self, id: u32) -> Result<Entity> {
        if let Some(entity) = self.get(id) {
            return Ok(entity);
        }
        let raw = self.source.fetch_detail(&Locator::Id(id)).await?;
        transform(&raw)
    }
}
