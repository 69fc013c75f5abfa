//! Filter/sort projection and windowing over the cache's current contents.

pub mod display;
pub mod filter_state;
pub mod pagination;

use crate::error::{CatalogError, Result};
use crate::types::Entity;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub use display::DisplayState;
pub use filter_state::{FilterState, FilterStore, MemoryFilterStore, QueryStringStore};
pub use pagination::{CumulativeWindow, PageWindow, Pager};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortKey {
    /// Arrival order in the cache
    #[default]
    Natural,
    Name,
    Metric,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Natural => "id",
            SortKey::Name => "name",
            SortKey::Metric => "metric",
        }
    }
}

impl FromStr for SortKey {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "id" | "natural" => Ok(SortKey::Natural),
            "name" => Ok(SortKey::Name),
            "metric" | "powerlevel" | "power" => Ok(SortKey::Metric),
            other => Err(CatalogError::InvalidArgument(format!("unknown sort key '{}'", other))),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }

    fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

impl FromStr for SortDirection {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            other => Err(CatalogError::InvalidArgument(format!(
                "unknown sort direction '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable filter/sort input to [`project`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Criteria {
    pub search_term: String,
    pub sort_key: SortKey,
    pub sort_direction: SortDirection,
}

impl Criteria {
    pub fn new(
        search_term: impl Into<String>,
        sort_key: SortKey,
        sort_direction: SortDirection,
    ) -> Self {
        Self {
            search_term: search_term.into(),
            sort_key,
            sort_direction,
        }
    }

    pub fn search(search_term: impl Into<String>) -> Self {
        Self {
            search_term: search_term.into(),
            ..Self::default()
        }
    }
}

/// Case-insensitive match on name, any category, or the decimal id.
pub fn matches(entity: &Entity, needle_lower: &str) -> bool {
    if needle_lower.is_empty() {
        return true;
    }
    entity.name.to_lowercase().contains(needle_lower)
        || entity
            .categories
            .iter()
            .any(|category| category.to_lowercase().contains(needle_lower))
        || entity.id.to_string().contains(needle_lower)
}

/// Filtered and ordered copy of `entities`. The sort is stable: ties keep
/// their input order in both directions.
pub fn project(entities: &[Entity], criteria: &Criteria) -> Vec<Entity> {
    let needle = criteria.search_term.to_lowercase();
    let mut selected: Vec<(usize, &Entity)> = entities
        .iter()
        .enumerate()
        .filter(|(_, entity)| matches(entity, &needle))
        .collect();

    match criteria.sort_key {
        SortKey::Natural => {
            if criteria.sort_direction == SortDirection::Descending {
                selected.reverse();
            }
        }
        SortKey::Name => {
            let mut keyed: Vec<(String, usize, &Entity)> = selected
                .into_iter()
                .map(|(position, entity)| (entity.name.to_lowercase(), position, entity))
                .collect();
            keyed.sort_by(|a, b| criteria.sort_direction.apply(a.0.cmp(&b.0)));
            selected = keyed.into_iter().map(|(_, position, entity)| (position, entity)).collect();
        }
        SortKey::Metric => {
            selected.sort_by(|a, b| criteria.sort_direction.apply(a.1.metric.cmp(&b.1.metric)));
        }
    }

    selected.into_iter().map(|(_, entity)| entity.clone()).collect()
}

/// Remembers the last projection and recomputes only when the collection
/// (by identity and length) or the criteria change. The collection the last
/// projection came from stays alive until the next recompute.
#[derive(Debug, Default)]
pub struct ProjectionMemo {
    key: Option<MemoKey>,
    value: Arc<Vec<Entity>>,
}

#[derive(Debug)]
struct MemoKey {
    entities: Arc<Vec<Entity>>,
    len: usize,
    criteria: Criteria,
}

impl MemoKey {
    fn matches(&self, entities: &Arc<Vec<Entity>>, criteria: &Criteria) -> bool {
        Arc::ptr_eq(&self.entities, entities)
            && self.len == entities.len()
            && &self.criteria == criteria
    }
}

impl ProjectionMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project(
        &mut self,
        entities: &Arc<Vec<Entity>>,
        criteria: &Criteria,
    ) -> Arc<Vec<Entity>> {
        let fresh = self
            .key
            .as_ref()
            .map_or(true, |key| !key.matches(entities, criteria));
        if fresh {
            self.value = Arc::new(project(entities, criteria));
            self.key = Some(MemoKey {
                entities: Arc::clone(entities),
                len: entities.len(),
                criteria: criteria.clone(),
            });
        }
        Arc::clone(&self.value)
    }

    pub fn invalidate(&mut self) {
        self.key = None;
    }
}
