#![allow(dead_code)]

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use dlp_rankings_backend::aggregator::DlpAggregator;
use dlp_rankings_backend::config::AppConfig;
use dlp_rankings_backend::historical::HistoricalSynthesizer;
use dlp_rankings_backend::sources::{PerformanceSource, RegistrySource, SourceError};
use dlp_rankings_backend::summarizer::{Summarizer, SummaryError};
use dlp_rankings_backend::types::{DlpInfo, RawPerformance};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// In-memory registry; ids listed in `broken` fail their info lookup.
#[derive(Default)]
pub struct FakeRegistry {
    pub ids: Vec<U256>,
    pub infos: HashMap<U256, DlpInfo>,
    pub broken: HashSet<U256>,
    pub fail_ids: bool,
    pub current_epoch: Option<u64>,
    pub id_calls: AtomicUsize,
}

impl FakeRegistry {
    pub fn with_dlps(dlps: &[(u64, &str)]) -> Self {
        let mut registry = Self::default();
        for &(id, name) in dlps {
            registry.ids.push(U256::from(id));
            registry.infos.insert(U256::from(id), info(id, name));
        }
        registry
    }
}

pub fn info(id: u64, name: &str) -> DlpInfo {
    DlpInfo {
        id: U256::from(id),
        name: name.to_string(),
        icon_url: format!("https://icons.example/{}.png", id),
        website: format!("https://dlp{}.example", id),
        metadata: format!(r#"{{"dlp":{}}}"#, id),
        address: Address::repeat_byte(id as u8),
        status: 1,
    }
}

#[async_trait]
impl RegistrySource for FakeRegistry {
    async fn eligible_dlp_ids(&self) -> Result<Vec<U256>, SourceError> {
        self.id_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_ids {
            return Err(SourceError::Rpc("connection refused".to_string()));
        }
        Ok(self.ids.clone())
    }

    async fn dlp_info(&self, id: U256) -> Result<Option<DlpInfo>, SourceError> {
        if self.broken.contains(&id) {
            return Err(SourceError::ContractCallFailed(format!("dlps({}) reverted", id)));
        }
        Ok(self.infos.get(&id).cloned())
    }

    async fn current_epoch(&self) -> Result<Option<u64>, SourceError> {
        Ok(self.current_epoch)
    }

    fn get_name(&self) -> &'static str {
        "fake-registry"
    }
}

/// Performance keyed by `(epoch, id)`; `delay` stalls every batch.
#[derive(Default)]
pub struct FakePerformance {
    pub records: HashMap<(u64, U256), RawPerformance>,
    pub fail: bool,
    pub delay: Option<Duration>,
}

impl FakePerformance {
    pub fn with_totals(epoch: u64, totals: &[(u64, u64)]) -> Self {
        let mut source = Self::default();
        for &(id, total) in totals {
            source.records.insert((epoch, U256::from(id)), performance(total));
        }
        source
    }
}

pub fn performance(total: u64) -> RawPerformance {
    RawPerformance {
        total_score: Some(U256::from(total)),
        trading_volume: U256::from(total * 1_000),
        unique_contributors: U256::from(total / 10),
        data_access_fees: U256::from(total * 3),
        trading_volume_score: U256::from(total / 2),
        unique_contributors_score: U256::from(total / 4),
        data_access_fees_score: U256::from(total / 4),
        ..Default::default()
    }
}

#[async_trait]
impl PerformanceSource for FakePerformance {
    async fn performances(
        &self,
        epoch: u64,
        ids: &[U256],
    ) -> Result<HashMap<U256, RawPerformance>, SourceError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(SourceError::ContractCallFailed("aggregate3 reverted".to_string()));
        }
        Ok(ids
            .iter()
            .filter_map(|id| self.records.get(&(epoch, *id)).map(|p| (*id, p.clone())))
            .collect())
    }

    fn get_name(&self) -> &'static str {
        "fake-performance"
    }
}

pub struct FakeSummarizer {
    pub reply: Option<String>,
}

#[async_trait]
impl Summarizer for FakeSummarizer {
    async fn summarize(&self, metadata: &str) -> Result<String, SummaryError> {
        match &self.reply {
            Some(reply) => Ok(format!("{} ({} bytes)", reply, metadata.len())),
            None => Err(SummaryError::NotConfigured),
        }
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        default_epoch: 3,
        call_timeout: Duration::from_millis(200),
        fetch_timeout: Duration::from_millis(200),
        ..Default::default()
    }
}

pub fn aggregator(registry: FakeRegistry, performance: FakePerformance) -> DlpAggregator {
    DlpAggregator::new(Arc::new(registry), Arc::new(performance), &test_config())
        .with_synthesizer(HistoricalSynthesizer::seeded(7))
}
