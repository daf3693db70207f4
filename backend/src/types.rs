use alloy::primitives::{Address, U256};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Metadata handed to the summarizer when the registry has none.
pub const EMPTY_METADATA: &str = "{}";

/// Descriptive record for a Data Liquidity Pool as kept by the registry contract.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DlpInfo {
    pub id: U256,
    pub name: String,
    pub icon_url: String,
    pub website: String,
    pub metadata: String,
    pub address: Address,
    pub status: u8,
}

/// Per-epoch performance record in its on-chain fixed-point form.
///
/// `total_score` is `None` when the record was rebuilt from event logs,
/// which only carry the component scores.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPerformance {
    pub total_score: Option<U256>,
    pub trading_volume: U256,
    pub unique_contributors: U256,
    pub data_access_fees: U256,
    pub trading_volume_score: U256,
    pub unique_contributors_score: U256,
    pub data_access_fees_score: U256,
    pub trading_volume_score_penalty: U256,
    pub unique_contributors_score_penalty: U256,
    pub data_access_fees_score_penalty: U256,
}

/// Normalized metrics as shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub total_score: f64,
    pub trading_volume_score: f64,
    pub unique_contributors_score: f64,
    pub data_access_fees_score: f64,
    pub trading_volume_score_penalty: f64,
    pub unique_contributors_score_penalty: f64,
    pub data_access_fees_score_penalty: f64,
    #[serde(with = "u256_decimal")]
    pub trading_volume: U256,
    #[serde(with = "u256_decimal")]
    pub unique_contributors: U256,
    #[serde(with = "u256_decimal")]
    pub data_access_fees: U256,
}

/// One day of the placeholder trend line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub date: NaiveDate,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dlp {
    pub id: String,
    pub name: String,
    /// 1-based position among pools with a positive score, 0 when unranked.
    pub rank: u32,
    #[serde(flatten)]
    pub metrics: Metrics,
    pub metadata: String,
    pub historical_data: Vec<HistoricalPoint>,
    pub icon_url: String,
    pub website: String,
    pub address: Address,
}

/// Result of one aggregation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedDlps {
    pub epoch: u64,
    pub fetched_at: DateTime<Utc>,
    pub dlps: Vec<Dlp>,
}

/// Serializes `U256` as a plain decimal string so the front-end can feed it to `BigInt`.
pub mod u256_decimal {
    use alloy::primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<U256>().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dlp_serializes_camel_case_with_decimal_counts() {
        let dlp = Dlp {
            id: "7".to_string(),
            name: "Reddit DLP".to_string(),
            rank: 1,
            metrics: Metrics {
                total_score: 12.5,
                unique_contributors: U256::from(140_000u64),
                trading_volume: U256::from(10).pow(U256::from(24)),
                ..Default::default()
            },
            metadata: EMPTY_METADATA.to_string(),
            historical_data: vec![],
            icon_url: String::new(),
            website: String::new(),
            address: Address::ZERO,
        };

        let json = serde_json::to_value(&dlp).unwrap();
        assert_eq!(json["totalScore"], 12.5);
        assert_eq!(json["uniqueContributors"], "140000");
        assert_eq!(json["tradingVolume"], "1000000000000000000000000");
        assert_eq!(json["historicalData"], serde_json::json!([]));

        let back: Dlp = serde_json::from_value(json).unwrap();
        assert_eq!(back, dlp);
    }
}
