use crate::config::AppConfig;
use crate::historical::HistoricalSynthesizer;
use crate::scoring::{assign_ranks, normalize_performance};
use crate::sources::{PerformanceSource, RegistrySource, SourceError};
use crate::types::{Dlp, DlpInfo, Metrics, RankedDlps, EMPTY_METADATA};
use alloy::primitives::U256;
use chrono::Utc;
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

/// Joins registry records with per-epoch performance into a ranked DLP list.
#[derive(Clone)]
pub struct DlpAggregator {
    registry: Arc<dyn RegistrySource>,
    performance: Arc<dyn PerformanceSource>,
    synthesizer: Arc<HistoricalSynthesizer>,
    call_timeout: Duration,
    fetch_timeout: Duration,
    default_epoch: u64,
}

impl DlpAggregator {
    pub fn new(
        registry: Arc<dyn RegistrySource>,
        performance: Arc<dyn PerformanceSource>,
        config: &AppConfig,
    ) -> Self {
        Self {
            registry,
            performance,
            synthesizer: Arc::new(HistoricalSynthesizer::new()),
            call_timeout: config.call_timeout,
            fetch_timeout: config.fetch_timeout,
            default_epoch: config.default_epoch,
        }
    }

    pub fn with_synthesizer(mut self, synthesizer: HistoricalSynthesizer) -> Self {
        self.synthesizer = Arc::new(synthesizer);
        self
    }

    pub fn synthesizer(&self) -> &HistoricalSynthesizer {
        &self.synthesizer
    }

    /// Caller's epoch, else the chain's current one, else the configured default.
    pub async fn resolve_epoch(&self, requested: Option<u64>) -> u64 {
        if let Some(epoch) = requested {
            return epoch;
        }

        match timeout(self.call_timeout, self.registry.current_epoch()).await {
            Ok(Ok(Some(epoch))) => epoch,
            Ok(Ok(None)) => self.default_epoch,
            Ok(Err(e)) => {
                warn!("Could not read current epoch, using {}: {}", self.default_epoch, e);
                self.default_epoch
            }
            Err(_) => {
                warn!("Current epoch lookup timed out, using {}", self.default_epoch);
                self.default_epoch
            }
        }
    }

    /// Fetch the ranked DLP list for `epoch`.
    ///
    /// Never fails: a registry failure yields an empty list, a missing
    /// descriptive record drops that DLP, and missing performance zeroes its metrics.
    #[instrument(
        skip(self),
        fields(registry = self.registry.get_name(), performance = self.performance.get_name())
    )]
    pub async fn fetch_dlp_data(&self, epoch: Option<u64>) -> RankedDlps {
        let epoch = self.resolve_epoch(epoch).await;
        info!("🔍 Fetching DLP data for epoch {}", epoch);

        let dlps = match self.eligible_ids().await {
            Ok(ids) if ids.is_empty() => {
                info!("No eligible DLPs found");
                Vec::new()
            }
            Ok(ids) => {
                info!("Found {} eligible DLPs", ids.len());
                self.collect(epoch, &ids).await
            }
            Err(e) => {
                error!("❌ Registry unavailable, returning no DLPs: {}", e);
                Vec::new()
            }
        };

        info!("✅ Processed {} DLPs for epoch {}", dlps.len(), epoch);
        RankedDlps {
            epoch,
            fetched_at: Utc::now(),
            dlps,
        }
    }

    async fn eligible_ids(&self) -> Result<Vec<U256>, SourceError> {
        let ids = timeout(self.call_timeout, self.registry.eligible_dlp_ids())
            .await
            .map_err(|_| SourceError::Timeout("eligible DLP ids".to_string()))??;

        // Keep first occurrence so ids stay unique in the result
        let mut seen = HashSet::with_capacity(ids.len());
        Ok(ids.into_iter().filter(|id| seen.insert(*id)).collect())
    }

    async fn collect(&self, epoch: u64, ids: &[U256]) -> Vec<Dlp> {
        let info_lookups = join_all(ids.iter().map(|&id| self.lookup_info(id)));
        let performance_batch =
            timeout(self.fetch_timeout, self.performance.performances(epoch, ids));

        let (infos, performances) = tokio::join!(info_lookups, performance_batch);

        let performances = match performances {
            Ok(Ok(found)) => found,
            Ok(Err(e)) => {
                warn!("Performance source failed for epoch {}, zeroing metrics: {}", epoch, e);
                HashMap::new()
            }
            Err(_) => {
                warn!("Performance source timed out for epoch {}, zeroing metrics", epoch);
                HashMap::new()
            }
        };

        let mut dlps: Vec<Dlp> = ids
            .iter()
            .zip(infos)
            .filter_map(|(id, info)| {
                let info = info?;
                let metrics = match performances.get(id) {
                    Some(raw) => normalize_performance(raw),
                    None => {
                        debug!("No performance record for DLP {} in epoch {}", id, epoch);
                        Metrics::default()
                    }
                };
                Some(self.build_dlp(*id, info, metrics))
            })
            .collect();

        assign_ranks(&mut dlps);
        dlps
    }

    /// `None` drops the DLP from the result.
    async fn lookup_info(&self, id: U256) -> Option<DlpInfo> {
        match timeout(self.call_timeout, self.registry.dlp_info(id)).await {
            Ok(Ok(Some(info))) if !info.name.is_empty() => Some(info),
            Ok(Ok(Some(_))) => {
                warn!("DLP {} has no name, skipping", id);
                None
            }
            Ok(Ok(None)) => {
                warn!("DLP {} missing from registry, skipping", id);
                None
            }
            Ok(Err(e)) => {
                warn!("Could not fetch info for DLP {}: {}", id, e);
                None
            }
            Err(_) => {
                warn!("Info lookup timed out for DLP {}", id);
                None
            }
        }
    }

    fn build_dlp(&self, id: U256, info: DlpInfo, metrics: Metrics) -> Dlp {
        let metadata = if info.metadata.trim().is_empty() {
            EMPTY_METADATA.to_string()
        } else {
            info.metadata
        };

        Dlp {
            id: id.to_string(),
            name: info.name,
            rank: 0,
            historical_data: self.synthesizer.generate(metrics.total_score),
            metrics,
            metadata,
            icon_url: info.icon_url,
            website: info.website,
            address: info.address,
        }
    }
}
