//! Maps raw detail records into display entities.

use crate::constants::{default_artwork_url, METRIC_CEILING, METRIC_MULTIPLIER};
use crate::error::{CatalogError, Result};
use crate::types::{Entity, RawDetailRecord};
use serde_json::Value;

/// Derived metric: `min(round(sum * 1.5), 1000)`.
pub fn compute_metric(sub_attributes: &[u64]) -> u32 {
    let total: u64 = sub_attributes.iter().fold(0u64, |acc, v| acc.saturating_add(*v));
    let scaled = (total as f64 * METRIC_MULTIPLIER).round();
    if scaled >= METRIC_CEILING as f64 {
        METRIC_CEILING
    } else {
        scaled as u32
    }
}

/// Ordered image candidates: official artwork, canonical asset, basic sprite,
/// then the computed default keyed by id. Absent and duplicate entries are skipped.
pub fn image_candidates(sprites: &Value, id: u32) -> Vec<String> {
    let preferred = [
        sprites.pointer("/other/official-artwork/front_default"),
        sprites.pointer("/other/home/front_default"),
        sprites.get("front_default"),
    ];

    let mut candidates: Vec<String> = Vec::with_capacity(4);
    let found = preferred
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string);
    for url in found.chain(std::iter::once(default_artwork_url(id))) {
        if !candidates.contains(&url) {
            candidates.push(url);
        }
    }
    candidates
}

/// Transform one detail record. Missing required fields yield
/// `MalformedRecord`, which batch callers treat as "drop this item".
pub fn transform(raw: &RawDetailRecord) -> Result<Entity> {
    let id = raw["id"]
        .as_u64()
        .filter(|id| *id > 0)
        .and_then(|id| u32::try_from(id).ok())
        .ok_or_else(|| malformed("id not found"))?;
    let name = raw["name"]
        .as_str()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| malformed_for(id, "name not found"))?;

    let categories = raw["types"]
        .as_array()
        .ok_or_else(|| malformed_for(id, "types not found"))?
        .iter()
        .map(|t| {
            t.pointer("/type/name")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| malformed_for(id, "type name not found"))
        })
        .collect::<Result<Vec<_>>>()?;
    if categories.is_empty() {
        return Err(malformed_for(id, "no category tags"));
    }

    let sub_attributes = raw["stats"]
        .as_array()
        .ok_or_else(|| malformed_for(id, "stats not found"))?
        .iter()
        .map(|s| {
            s["base_stat"]
                .as_u64()
                .ok_or_else(|| malformed_for(id, "base_stat not a non-negative integer"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Entity {
        id,
        name: name.to_string(),
        image_refs: image_candidates(&raw["sprites"], id),
        categories,
        metric: compute_metric(&sub_attributes),
    })
}

fn malformed(msg: &str) -> CatalogError {
    CatalogError::MalformedRecord(msg.to_string())
}

fn malformed_for(id: u32, msg: &str) -> CatalogError {
    CatalogError::MalformedRecord(format!("record #{}: {}", id, msg))
}
