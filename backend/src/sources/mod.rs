// On-chain readers for the DLP registry and per-epoch performance records
pub mod contracts;
pub mod direct;
pub mod event_log;
pub mod multicall;
pub mod provider;
pub mod registry;

pub use direct::DirectPerformance;
pub use event_log::EventLogPerformance;
pub use multicall::MulticallPerformance;
pub use provider::ProviderCache;
pub use registry::ContractRegistry;

use crate::config::{AppConfig, PerformanceStrategy};
use crate::types::{DlpInfo, RawPerformance};
use alloy::primitives::U256;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("RPC request failed: {0}")]
    Rpc(String),
    #[error("Contract call failed: {0}")]
    ContractCallFailed(String),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Request timeout: {0}")]
    Timeout(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("No RPC endpoint reachable")]
    NoHealthyEndpoint,
}

/// Read side of the DLP registry contract.
#[async_trait]
pub trait RegistrySource: Send + Sync {
    async fn eligible_dlp_ids(&self) -> Result<Vec<U256>, SourceError>;

    /// `Ok(None)` when the registry has no record for `id`.
    async fn dlp_info(&self, id: U256) -> Result<Option<DlpInfo>, SourceError>;

    /// Latest epoch known on chain, if an epoch contract is wired up.
    async fn current_epoch(&self) -> Result<Option<u64>, SourceError> {
        Ok(None)
    }

    fn get_name(&self) -> &'static str;
}

/// Per-epoch performance records, keyed by DLP id.
///
/// Ids missing from the returned map have no record for the epoch.
#[async_trait]
pub trait PerformanceSource: Send + Sync {
    async fn performances(
        &self,
        epoch: u64,
        ids: &[U256],
    ) -> Result<HashMap<U256, RawPerformance>, SourceError>;

    fn get_name(&self) -> &'static str;
}

/// Wire the registry reader and the configured performance strategy onto one provider cache.
pub fn build_sources(
    config: &AppConfig,
) -> (Arc<dyn RegistrySource>, Arc<dyn PerformanceSource>) {
    let provider_cache = ProviderCache::new(config.rpc_urls.clone());

    let registry: Arc<dyn RegistrySource> = Arc::new(ContractRegistry::new(
        provider_cache.clone(),
        config.registry_address,
        config.epoch_address,
        config.call_timeout,
    ));

    let performance: Arc<dyn PerformanceSource> = match config.strategy {
        PerformanceStrategy::Direct => Arc::new(DirectPerformance::new(
            provider_cache,
            config.performance_address,
            config.call_timeout,
        )),
        PerformanceStrategy::Multicall => Arc::new(MulticallPerformance::new(
            provider_cache,
            config.performance_address,
            config.multicall_address,
            config.call_timeout,
        )),
        PerformanceStrategy::Events => Arc::new(EventLogPerformance::new(
            provider_cache,
            config.performance_address,
            config.max_log_block_range,
            config.log_lookback_blocks,
            config.call_timeout,
        )),
    };

    (registry, performance)
}

/// Lossy conversion for display; exact below 2^53, approximate above.
pub fn u256_to_f64(value: U256) -> f64 {
    if value.bit_len() <= 128 {
        value.to::<u128>() as f64
    } else {
        value.to_string().parse::<f64>().unwrap_or(f64::MAX)
    }
}

/// Epoch ids fit in u64 on every network we talk to; saturate otherwise.
pub fn u256_to_u64(value: U256) -> u64 {
    if value.bit_len() <= 64 {
        value.to::<u64>()
    } else {
        u64::MAX
    }
}
