use crate::types::{HistoricalPoint, Metrics};
use crate::sources::u256_to_f64;
use chrono::{Days, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Days before today covered by a series; the series holds `HISTORY_DAYS + 1` points.
pub const HISTORY_DAYS: u64 = 30;
pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;

/// How a metric's synthetic values are kept in range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bounds {
    /// Absolute wobble, clamped to `[min, max]`.
    Clamped { min: f64, max: f64 },
    /// Wobble proportional to the base value, floored at zero.
    NonNegative,
}

/// Synthetic series for one named metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    pub metric: String,
    pub points: Vec<HistoricalPoint>,
}

/// Placeholder trend data for the dashboard charts.
///
/// Nothing here is real history: every series is a smooth random wobble around
/// the current value, regenerated on each fetch. The charts only rely on the
/// shape (31 daily points, oldest first, ending today).
pub struct HistoricalSynthesizer {
    rng: Mutex<StdRng>,
    today: Option<NaiveDate>,
}

impl HistoricalSynthesizer {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
            today: None,
        }
    }

    /// Deterministic noise, for tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            today: None,
        }
    }

    /// Pin "today" instead of reading the clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    /// 31 daily score points around `base`, clamped to the 0-100 score range.
    pub fn generate(&self, base: f64) -> Vec<HistoricalPoint> {
        self.series(
            base,
            Bounds::Clamped {
                min: SCORE_MIN,
                max: SCORE_MAX,
            },
        )
    }

    pub fn series(&self, base: f64, bounds: Bounds) -> Vec<HistoricalPoint> {
        let today = self.today();
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        (0..=HISTORY_DAYS)
            .rev()
            .map(|days_ago| {
                let wave = (days_ago as f64 / 5.0).sin();
                let noise = rng.gen::<f64>() - 0.5;
                let score = match bounds {
                    Bounds::Clamped { min, max } => {
                        (base + wave * 5.0 + noise * 2.0).clamp(min, max)
                    }
                    Bounds::NonNegative => (base * (1.0 + wave * 0.05 + noise * 0.02)).max(0.0),
                };
                HistoricalPoint {
                    date: today.checked_sub_days(Days::new(days_ago)).unwrap_or(today),
                    score,
                }
            })
            .collect()
    }

    /// One series per named metric of a pool.
    pub fn generate_for_metrics(&self, metrics: &Metrics) -> Vec<MetricSeries> {
        let score = Bounds::Clamped {
            min: SCORE_MIN,
            max: SCORE_MAX,
        };
        let bases = [
            ("totalScore", metrics.total_score, score),
            ("tradingVolumeScore", metrics.trading_volume_score, score),
            ("uniqueContributorsScore", metrics.unique_contributors_score, score),
            ("dataAccessFeesScore", metrics.data_access_fees_score, score),
            ("tradingVolume", u256_to_f64(metrics.trading_volume), Bounds::NonNegative),
            ("uniqueContributors", u256_to_f64(metrics.unique_contributors), Bounds::NonNegative),
            ("dataAccessFees", u256_to_f64(metrics.data_access_fees), Bounds::NonNegative),
        ];

        bases
            .into_iter()
            .map(|(metric, base, bounds)| MetricSeries {
                metric: metric.to_string(),
                points: self.series(base, bounds),
            })
            .collect()
    }
}

impl Default for HistoricalSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}
