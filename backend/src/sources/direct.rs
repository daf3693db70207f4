use crate::sources::contracts::IDlpPerformance;
use crate::sources::{PerformanceSource, ProviderCache, SourceError};
use crate::types::RawPerformance;
use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// One `epochDlpPerformances` call per DLP, issued concurrently.
#[derive(Clone)]
pub struct DirectPerformance {
    provider_cache: ProviderCache,
    performance_address: Address,
    call_timeout: Duration,
}

impl DirectPerformance {
    pub fn new(
        provider_cache: ProviderCache,
        performance_address: Address,
        call_timeout: Duration,
    ) -> Self {
        Self {
            provider_cache,
            performance_address,
            call_timeout,
        }
    }
}

#[async_trait]
impl PerformanceSource for DirectPerformance {
    async fn performances(
        &self,
        epoch: u64,
        ids: &[U256],
    ) -> Result<HashMap<U256, RawPerformance>, SourceError> {
        let provider = self.provider_cache.get_provider().await?;
        let contract = IDlpPerformance::new(self.performance_address, &provider);
        let epoch_id = U256::from(epoch);

        let lookups = ids.iter().map(|&id| {
            let contract = &contract;
            async move {
                let call = contract.epochDlpPerformances(epoch_id, id);
                match timeout(self.call_timeout, call.call()).await {
                    Ok(Ok(result)) => Some((id, RawPerformance::from(result._0))),
                    Ok(Err(e)) => {
                        warn!("Performance lookup failed for DLP {}: {}", id, e);
                        self.provider_cache.report_call_error(&e);
                        None
                    }
                    Err(_) => {
                        warn!("Performance lookup timed out for DLP {}", id);
                        self.provider_cache.report_failure();
                        None
                    }
                }
            }
        });

        let found: HashMap<U256, RawPerformance> =
            join_all(lookups).await.into_iter().flatten().collect();
        debug!(
            "Direct lookups returned {}/{} records for epoch {}",
            found.len(),
            ids.len(),
            epoch
        );
        Ok(found)
    }

    fn get_name(&self) -> &'static str {
        "direct"
    }
}
