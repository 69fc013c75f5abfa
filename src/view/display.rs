use crate::cache::CacheSnapshot;
use crate::error::ErrorKind;

/// What the presentation layer should render for the current snapshot and
/// projection. `NoData` (nothing fetched) and `NoResults` (nothing matches the
/// filter) are deliberately separate states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    Loading,
    Failed(ErrorKind),
    NoData,
    NoResults,
    Ready,
}

impl DisplayState {
    pub fn derive(snapshot: &CacheSnapshot, projection_len: usize) -> Self {
        if snapshot.is_empty() {
            if let Some(kind) = snapshot.error {
                return DisplayState::Failed(kind);
            }
            if snapshot.is_loading || (snapshot.batches_requested == 0 && snapshot.has_more) {
                return DisplayState::Loading;
            }
            return DisplayState::NoData;
        }
        if projection_len == 0 {
            DisplayState::NoResults
        } else {
            DisplayState::Ready
        }
    }
}
