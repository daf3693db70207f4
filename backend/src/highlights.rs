use crate::sources::u256_to_f64;
use crate::types::Dlp;
use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

pub const DEFAULT_HIGHLIGHT_LIMIT: usize = 3;

/// One row of a dashboard summary card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightEntry {
    pub id: String,
    pub name: String,
    pub rank: u32,
    pub label: String,
}

/// Short leaderboards shown above the main table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlights {
    pub top_score: Vec<HighlightEntry>,
    pub best_ranked: Vec<HighlightEntry>,
    pub most_contributors: Vec<HighlightEntry>,
    pub top_data_access_fees: Vec<HighlightEntry>,
    pub top_trading_volume: Vec<HighlightEntry>,
}

impl Highlights {
    pub fn from_dlps(dlps: &[Dlp], limit: usize) -> Self {
        let entry = |dlp: &Dlp, label: String| HighlightEntry {
            id: dlp.id.clone(),
            name: dlp.name.clone(),
            rank: dlp.rank,
            label,
        };

        let top_by = |key: fn(&Dlp) -> U256, suffix: &str| -> Vec<HighlightEntry> {
            let mut sorted: Vec<&Dlp> = dlps.iter().collect();
            sorted.sort_by(|a, b| key(b).cmp(&key(a)));
            sorted
                .into_iter()
                .take(limit)
                .map(|d| entry(d, format!("{}{}", format_compact_u256(key(d)), suffix)))
                .collect()
        };

        let mut by_score: Vec<&Dlp> = dlps.iter().collect();
        by_score.sort_by(|a, b| b.metrics.total_score.total_cmp(&a.metrics.total_score));
        let top_score = by_score
            .into_iter()
            .take(limit)
            .map(|d| entry(d, format!("{:.1}", d.metrics.total_score)))
            .collect();

        let mut ranked: Vec<&Dlp> = dlps.iter().filter(|d| d.rank > 0).collect();
        ranked.sort_by_key(|d| d.rank);
        let best_ranked = ranked
            .into_iter()
            .take(limit)
            .map(|d| entry(d, format!("#{}", d.rank)))
            .collect();

        Self {
            top_score,
            best_ranked,
            most_contributors: top_by(|d| d.metrics.unique_contributors, ""),
            top_data_access_fees: top_by(|d| d.metrics.data_access_fees, " VANA"),
            top_trading_volume: top_by(|d| d.metrics.trading_volume, " VANA"),
        }
    }
}

/// Case-insensitive name search; an empty query keeps everything.
pub fn filter_by_name(dlps: &[Dlp], query: &str) -> Vec<Dlp> {
    let query = query.trim().to_lowercase();
    dlps.iter()
        .filter(|d| d.name.to_lowercase().contains(&query))
        .cloned()
        .collect()
}

/// `1.2M`, `3.4K` or the plain number.
pub fn format_compact(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.1}K", value / 1_000.0)
    } else {
        value.to_string()
    }
}

pub fn format_compact_u256(value: U256) -> String {
    format_compact(u256_to_f64(value))
}
