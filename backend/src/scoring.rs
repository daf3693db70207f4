use crate::sources::u256_to_f64;
use crate::types::{Dlp, Metrics, RawPerformance};
use alloy::primitives::U256;

/// Score fields carry two implied decimals on chain: `12345` reads as `123.45`.
pub const SCORE_SCALE: f64 = 100.0;

pub fn scale_score(raw: U256) -> f64 {
    u256_to_f64(raw) / SCORE_SCALE
}

/// Convert a raw record into display units.
///
/// The contract total is used when present; event-derived records only carry
/// components, so their total is the sum of the component scores.
pub fn normalize_performance(raw: &RawPerformance) -> Metrics {
    let trading_volume_score = scale_score(raw.trading_volume_score);
    let unique_contributors_score = scale_score(raw.unique_contributors_score);
    let data_access_fees_score = scale_score(raw.data_access_fees_score);

    let total_score = match raw.total_score {
        Some(total) => scale_score(total),
        None => trading_volume_score + unique_contributors_score + data_access_fees_score,
    };

    Metrics {
        total_score,
        trading_volume_score,
        unique_contributors_score,
        data_access_fees_score,
        trading_volume_score_penalty: scale_score(raw.trading_volume_score_penalty),
        unique_contributors_score_penalty: scale_score(raw.unique_contributors_score_penalty),
        data_access_fees_score_penalty: scale_score(raw.data_access_fees_score_penalty),
        trading_volume: raw.trading_volume,
        unique_contributors: raw.unique_contributors,
        data_access_fees: raw.data_access_fees,
    }
}

/// Sort by total score descending and hand out dense ranks.
///
/// Only positive scores are ranked; the rest keep rank 0 and their sorted position.
/// The sort is stable, so ties keep input order.
pub fn assign_ranks(dlps: &mut [Dlp]) {
    dlps.sort_by(|a, b| b.metrics.total_score.total_cmp(&a.metrics.total_score));

    for (index, dlp) in dlps.iter_mut().enumerate() {
        dlp.rank = if dlp.metrics.total_score > 0.0 {
            index as u32 + 1
        } else {
            0
        };
    }
}
