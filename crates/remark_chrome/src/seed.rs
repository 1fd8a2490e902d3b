use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use remark::{DayId, MemoryStore, Result, StoreRecord};
use tracing::info;

/// Parse a seed document: a JSON object keyed by day id.
///
/// ```json
/// { "2024-06-01": { "title": "Beach", "thumbCoverUrl": "t.jpg" } }
/// ```
pub fn parse_seed(json: &str) -> Result<BTreeMap<DayId, StoreRecord>> {
    Ok(serde_json::from_str(json)?)
}

pub fn load_seed(path: &Path) -> Result<MemoryStore> {
    let contents = fs::read_to_string(path)?;
    let records = parse_seed(&contents)?;
    info!("seeded {} record(s) from {}", records.len(), path.display());
    Ok(MemoryStore::with_records(records))
}
