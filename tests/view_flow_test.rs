mod common;

use catalog_cache::cache::{CacheSettings, CatalogCache};
use catalog_cache::error::ErrorKind;
use catalog_cache::view::{
    project, Criteria, CumulativeWindow, DisplayState, FilterState, MemoryFilterStore, Pager,
    ProjectionMemo, SortDirection, SortKey,
};
use common::FakeSource;
use std::sync::Arc;

fn cache(source: &Arc<FakeSource>, batch_size: usize) -> CatalogCache {
    CatalogCache::new(
        source.clone(),
        CacheSettings {
            batch_size,
            prefetch_threshold: 5,
            max_entities: 1010,
            detail_failure_tolerance: 0.5,
        },
    )
    .unwrap()
}

#[tokio::test]
async fn test_fixed_page_mode_over_loaded_catalog() {
    let source = Arc::new(FakeSource::new(45));
    let cache = cache(&source, 20);
    cache.ensure_loaded(200).await.unwrap();

    let snapshot = cache.snapshot();
    let projection = project(&snapshot.entities, &Criteria::default());
    let pager = Pager::new(16).unwrap();

    assert_eq!(pager.total_pages(projection.len()), 3);
    assert_eq!(pager.window(&projection, 0).current_page, 1);
    let last = pager.window(&projection, 4);
    assert_eq!(last.current_page, 3);
    assert_eq!(last.items.len(), 13);
    assert_eq!(DisplayState::derive(&snapshot, projection.len()), DisplayState::Ready);
}

#[tokio::test]
async fn test_filter_state_drives_projection_and_paging() {
    let source = Arc::new(FakeSource::new(40));
    let cache = cache(&source, 20);
    cache.ensure_loaded(40).await.unwrap();

    let mut state = FilterState::new(MemoryFilterStore::new());
    // Even ids are "water"
    state.set_search("WATER");
    state.set_sort(SortKey::Metric, SortDirection::Descending);
    state.go_to_page(2);

    let snapshot = cache.snapshot();
    let projection = project(&snapshot.entities, &state.criteria());
    let window = Pager::new(16).unwrap().window(&projection, state.page());

    assert_eq!(projection.len(), 20);
    assert_eq!(projection.first().map(|e| e.id), Some(40));
    assert_eq!(window.items.iter().map(|e| e.id).collect::<Vec<_>>(), vec![8, 6, 4, 2]);
}

#[tokio::test]
async fn test_no_data_and_no_results_are_distinguishable() {
    let empty_source = Arc::new(FakeSource::new(0));
    let empty = cache(&empty_source, 20);
    empty.load_more().await.unwrap();
    let snapshot = empty.snapshot();
    assert_eq!(
        DisplayState::derive(&snapshot, project(&snapshot.entities, &Criteria::default()).len()),
        DisplayState::NoData
    );

    let source = Arc::new(FakeSource::new(30));
    let loaded = cache(&source, 20);
    loaded.load_more().await.unwrap();
    let snapshot = loaded.snapshot();
    let projection = project(&snapshot.entities, &Criteria::search("no-such-entry"));
    assert_eq!(DisplayState::derive(&snapshot, projection.len()), DisplayState::NoResults);
}

#[tokio::test]
async fn test_first_cycle_failure_is_a_failed_state() {
    let source = Arc::new(FakeSource::new(30));
    source.fail_next_list_calls(1);
    let cache = cache(&source, 20);

    assert!(cache.load_more().await.is_err());

    let snapshot = cache.snapshot();
    assert_eq!(
        DisplayState::derive(&snapshot, 0),
        DisplayState::Failed(ErrorKind::RemoteUnavailable)
    );
}

#[tokio::test]
async fn test_cumulative_window_grows_with_the_cache() {
    let source = Arc::new(FakeSource::new(60));
    let cache = cache(&source, 20);
    let mut memo = ProjectionMemo::new();
    let criteria = Criteria::search("fire");

    cache.load_more().await.unwrap();
    let snapshot = cache.snapshot();
    let first = memo.project(&snapshot.entities, &criteria);
    let window = CumulativeWindow::new(&first, snapshot.total_loaded(), snapshot.has_more);
    assert_eq!(window.items.len(), 10);
    assert_eq!(window.total_loaded, 20);

    // Consumed the whole window: the prefetch policy asks for more
    assert!(cache.should_prefetch(window.items.len(), window.items.len()));
    cache.prefetch_if_needed(window.items.len(), window.items.len()).await.unwrap();

    let snapshot = cache.snapshot();
    let second = memo.project(&snapshot.entities, &criteria);
    assert_eq!(second.len(), 20);
    // Earlier matches keep their place at the front
    assert_eq!(&second[..10], &first[..]);
}
