use crate::sources::contracts::IDlpPerformance::{
    EpochDlpPerformancesOverridden, EpochDlpPerformancesSaved,
};
use crate::sources::{PerformanceSource, ProviderCache, SourceError};
use crate::types::RawPerformance;
use alloy::primitives::{Address, B256, U256};
use alloy::providers::Provider;
use alloy::rpc::types::eth::{Filter, Log};
use alloy::sol_types::SolEvent;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Performance rebuilt from `EpochDlpPerformancesSaved` / `EpochDlpPerformancesOverridden` logs.
///
/// Logs are scanned newest first in windows no wider than `max_block_range`,
/// stopping once every requested DLP has a record or `lookback_blocks` are covered.
#[derive(Clone)]
pub struct EventLogPerformance {
    provider_cache: ProviderCache,
    performance_address: Address,
    max_block_range: u64,
    lookback_blocks: u64,
    call_timeout: Duration,
}

/// One decoded performance event.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceEvent {
    pub dlp_id: U256,
    pub block_number: u64,
    pub log_index: u64,
    pub overridden: bool,
    pub performance: RawPerformance,
}

impl PerformanceEvent {
    fn precedence(&self) -> (bool, u64, u64) {
        (self.overridden, self.block_number, self.log_index)
    }

    fn from_log(log: &Log) -> Option<Self> {
        let data = &log.inner.data;
        let topic0 = *data.topics().first()?;
        let block_number = log.block_number.unwrap_or_default();
        let log_index = log.log_index.unwrap_or_default();

        if topic0 == EpochDlpPerformancesOverridden::SIGNATURE_HASH {
            let event = EpochDlpPerformancesOverridden::decode_log_data(data, true).ok()?;
            Some(Self {
                dlp_id: event.dlpId,
                block_number,
                log_index,
                overridden: true,
                performance: event.into(),
            })
        } else if topic0 == EpochDlpPerformancesSaved::SIGNATURE_HASH {
            let event = EpochDlpPerformancesSaved::decode_log_data(data, true).ok()?;
            Some(Self {
                dlp_id: event.dlpId,
                block_number,
                log_index,
                overridden: false,
                performance: event.into(),
            })
        } else {
            None
        }
    }
}

/// Inclusive `(from, to)` block windows, newest first, each at most `max_range` blocks wide.
pub fn block_windows(latest: u64, lookback: u64, max_range: u64) -> Vec<(u64, u64)> {
    let max_range = max_range.max(1);
    let earliest = latest.saturating_sub(lookback);
    let mut windows = Vec::new();
    let mut to = latest;

    loop {
        let from = to.saturating_sub(max_range - 1).max(earliest);
        windows.push((from, to));
        if from <= earliest {
            break;
        }
        to = from - 1;
    }

    windows
}

/// Collapse events to one record per DLP: an override beats a save, then the later log wins.
pub fn merge_events(
    events: impl IntoIterator<Item = PerformanceEvent>,
) -> HashMap<U256, RawPerformance> {
    let mut latest: HashMap<U256, PerformanceEvent> = HashMap::new();

    for event in events {
        match latest.get(&event.dlp_id) {
            Some(existing) if existing.precedence() >= event.precedence() => {}
            _ => {
                latest.insert(event.dlp_id, event);
            }
        }
    }

    latest.into_iter().map(|(id, event)| (id, event.performance)).collect()
}

impl EventLogPerformance {
    pub fn new(
        provider_cache: ProviderCache,
        performance_address: Address,
        max_block_range: u64,
        lookback_blocks: u64,
        call_timeout: Duration,
    ) -> Self {
        Self {
            provider_cache,
            performance_address,
            max_block_range,
            lookback_blocks,
            call_timeout,
        }
    }

    fn epoch_filter(&self, epoch: u64, from: u64, to: u64) -> Filter {
        Filter::new()
            .address(self.performance_address)
            .event_signature(vec![
                EpochDlpPerformancesSaved::SIGNATURE_HASH,
                EpochDlpPerformancesOverridden::SIGNATURE_HASH,
            ])
            .topic1(B256::from(U256::from(epoch)))
            .from_block(from)
            .to_block(to)
    }
}

#[async_trait]
impl PerformanceSource for EventLogPerformance {
    async fn performances(
        &self,
        epoch: u64,
        ids: &[U256],
    ) -> Result<HashMap<U256, RawPerformance>, SourceError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let provider = self.provider_cache.get_provider().await?;
        let latest = match timeout(self.call_timeout, provider.get_block_number()).await {
            Ok(Ok(block)) => block,
            Ok(Err(e)) => {
                self.provider_cache.report_failure();
                return Err(SourceError::Rpc(format!("eth_blockNumber: {}", e)));
            }
            Err(_) => {
                self.provider_cache.report_failure();
                return Err(SourceError::Timeout("eth_blockNumber".to_string()));
            }
        };

        let wanted: HashSet<U256> = ids.iter().copied().collect();
        let windows = block_windows(latest, self.lookback_blocks, self.max_block_range);
        let mut events = Vec::new();
        let mut covered = HashSet::new();
        let mut failed_windows = 0usize;

        for &(from, to) in &windows {
            let filter = self.epoch_filter(epoch, from, to);
            let logs = match timeout(self.call_timeout, provider.get_logs(&filter)).await {
                Ok(Ok(logs)) => logs,
                Ok(Err(e)) => {
                    warn!("eth_getLogs failed for blocks {}..={}: {}", from, to, e);
                    failed_windows += 1;
                    continue;
                }
                Err(_) => {
                    warn!("eth_getLogs timed out for blocks {}..={}", from, to);
                    self.provider_cache.report_failure();
                    failed_windows += 1;
                    continue;
                }
            };

            debug!("{} performance logs in blocks {}..={}", logs.len(), from, to);
            for event in logs.iter().filter_map(PerformanceEvent::from_log) {
                if wanted.contains(&event.dlp_id) {
                    covered.insert(event.dlp_id);
                    events.push(event);
                }
            }

            if covered.len() == wanted.len() {
                break;
            }
        }

        if failed_windows == windows.len() {
            self.provider_cache.report_failure();
            return Err(SourceError::Rpc(format!("every log window failed for epoch {}", epoch)));
        }

        let merged = merge_events(events);
        info!(
            "📜 Rebuilt {}/{} performance records from logs for epoch {}",
            merged.len(),
            ids.len(),
            epoch
        );
        Ok(merged)
    }

    fn get_name(&self) -> &'static str {
        "events"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::LogData;

    fn event(id: u64, block: u64, index: u64, overridden: bool, volume: u64) -> PerformanceEvent {
        PerformanceEvent {
            dlp_id: U256::from(id),
            block_number: block,
            log_index: index,
            overridden,
            performance: RawPerformance {
                trading_volume: U256::from(volume),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_block_windows_respect_platform_limit() {
        let windows = block_windows(25_000, 25_000, 10_000);
        assert_eq!(windows, vec![(15_001, 25_000), (5_001, 15_000), (0, 5_000)]);
        assert!(windows.iter().all(|(from, to)| to - from + 1 <= 10_000));
    }

    #[test]
    fn test_block_windows_near_genesis() {
        assert_eq!(block_windows(50, 100_000, 10_000), vec![(0, 50)]);
        assert_eq!(block_windows(0, 10, 10_000), vec![(0, 0)]);
    }

    #[test]
    fn test_override_replaces_saved_record() {
        let merged = merge_events(vec![
            event(1, 100, 0, false, 10),
            event(1, 200, 3, true, 20),
            event(2, 150, 1, false, 30),
        ]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[&U256::from(1)].trading_volume, U256::from(20));
        assert_eq!(merged[&U256::from(2)].trading_volume, U256::from(30));
    }

    #[test]
    fn test_latest_override_wins_regardless_of_scan_order() {
        // newest-first scan order
        let merged = merge_events(vec![
            event(1, 300, 0, true, 3),
            event(1, 300, 1, true, 4),
            event(1, 250, 9, true, 2),
            event(1, 400, 0, false, 99),
        ]);
        assert_eq!(merged[&U256::from(1)].trading_volume, U256::from(4));
    }

    #[test]
    fn test_from_log_decodes_saved_event() {
        let saved = EpochDlpPerformancesSaved {
            epochId: U256::from(3),
            dlpId: U256::from(7),
            tradingVolume: U256::from(1_000u64),
            uniqueContributors: U256::from(12u64),
            dataAccessFees: U256::from(5u64),
            tradingVolumeScore: U256::from(2_500u64),
            uniqueContributorsScore: U256::from(1_500u64),
            dataAccessFeesScore: U256::from(500u64),
        };
        let data: LogData = saved.encode_log_data();
        let log = Log {
            inner: alloy::primitives::Log {
                address: Address::ZERO,
                data,
            },
            block_number: Some(42),
            log_index: Some(2),
            ..Default::default()
        };

        let decoded = PerformanceEvent::from_log(&log).unwrap();
        assert_eq!(decoded.dlp_id, U256::from(7));
        assert!(!decoded.overridden);
        assert_eq!(decoded.block_number, 42);
        assert_eq!(decoded.performance.total_score, None);
        assert_eq!(decoded.performance.trading_volume_score, U256::from(2_500u64));
    }
}
