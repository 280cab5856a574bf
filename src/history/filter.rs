use crate::models::{HistoryRecord, HistoryStats};

pub const ALL_PLATFORMS: &str = "all";

/// Case-insensitive substring match on content, niche or client name, AND'd
/// with an exact platform match unless the filter is `"all"`.
pub fn search_and_filter(records: &[HistoryRecord], term: &str, platform_filter: &str) -> Vec<HistoryRecord> {
    let needle = term.to_lowercase();
    records
        .iter()
        .filter(|r| matches_term(r, &needle) && matches_platform(r, platform_filter))
        .cloned()
        .collect()
}

fn matches_term(record: &HistoryRecord, needle: &str) -> bool {
    record.content.to_lowercase().contains(needle)
        || record.niche.to_lowercase().contains(needle)
        || record
            .client_name
            .as_deref()
            .is_some_and(|name| name.to_lowercase().contains(needle))
}

fn matches_platform(record: &HistoryRecord, platform_filter: &str) -> bool {
    platform_filter == ALL_PLATFORMS || record.platform == platform_filter
}

pub fn stats(records: &[HistoryRecord]) -> HistoryStats {
    let mut stats = HistoryStats {
        total: records.len(),
        ..Default::default()
    };
    for record in records {
        *stats.by_platform.entry(record.platform.clone()).or_default() += 1;
        *stats.by_niche.entry(record.niche.clone()).or_default() += 1;
    }
    stats
}
