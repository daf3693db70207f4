use crate::sources::contracts::IDlpPerformance::epochDlpPerformancesCall;
use crate::sources::contracts::IMulticall3;
use crate::sources::{PerformanceSource, ProviderCache, SourceError};
use crate::types::RawPerformance;
use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Sub-calls per `aggregate3` request, keeps calldata well under node limits.
const MAX_CALLS_PER_BATCH: usize = 200;

/// All `epochDlpPerformances` lookups folded into Multicall3 `aggregate3` round trips.
#[derive(Clone)]
pub struct MulticallPerformance {
    provider_cache: ProviderCache,
    performance_address: Address,
    multicall_address: Address,
    call_timeout: Duration,
}

impl MulticallPerformance {
    pub fn new(
        provider_cache: ProviderCache,
        performance_address: Address,
        multicall_address: Address,
        call_timeout: Duration,
    ) -> Self {
        Self {
            provider_cache,
            performance_address,
            multicall_address,
            call_timeout,
        }
    }

    fn build_calls(&self, epoch: u64, ids: &[U256]) -> Vec<IMulticall3::Call3> {
        let epoch_id = U256::from(epoch);
        ids.iter()
            .map(|&dlp_id| IMulticall3::Call3 {
                target: self.performance_address,
                allowFailure: true,
                callData: epochDlpPerformancesCall {
                    epochId: epoch_id,
                    dlpId: dlp_id,
                }
                .abi_encode()
                .into(),
            })
            .collect()
    }
}

/// Pair each id with its sub-call result; failed or undecodable entries are left out.
pub fn decode_batch(
    ids: &[U256],
    results: &[IMulticall3::CallResult],
) -> HashMap<U256, RawPerformance> {
    let mut decoded = HashMap::with_capacity(ids.len());

    for (id, result) in ids.iter().zip(results) {
        if !result.success {
            debug!("Multicall sub-call reverted for DLP {}", id);
            continue;
        }
        match epochDlpPerformancesCall::abi_decode_returns(&result.returnData, true) {
            Ok(ret) => {
                decoded.insert(*id, RawPerformance::from(ret._0));
            }
            Err(e) => warn!("Undecodable performance data for DLP {}: {}", id, e),
        }
    }

    decoded
}

#[async_trait]
impl PerformanceSource for MulticallPerformance {
    async fn performances(
        &self,
        epoch: u64,
        ids: &[U256],
    ) -> Result<HashMap<U256, RawPerformance>, SourceError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let provider = self.provider_cache.get_provider().await?;
        let multicall = IMulticall3::new(self.multicall_address, &provider);
        let mut found = HashMap::with_capacity(ids.len());
        let mut failed_batches = 0usize;
        let batches = ids.chunks(MAX_CALLS_PER_BATCH);
        let batch_count = batches.len();

        for batch in batches {
            let call = multicall.aggregate3(self.build_calls(epoch, batch));
            match timeout(self.call_timeout, call.call()).await {
                Ok(Ok(result)) => found.extend(decode_batch(batch, &result.returnData)),
                Ok(Err(e)) => {
                    warn!("aggregate3 failed for {} DLPs: {}", batch.len(), e);
                    failed_batches += 1;
                }
                Err(_) => {
                    warn!("aggregate3 timed out for {} DLPs", batch.len());
                    self.provider_cache.report_failure();
                    failed_batches += 1;
                }
            }
        }

        if failed_batches == batch_count {
            self.provider_cache.report_failure();
            return Err(SourceError::ContractCallFailed(format!(
                "all {} multicall batches failed for epoch {}",
                batch_count, epoch
            )));
        }

        info!(
            "📦 Multicall returned {}/{} performance records for epoch {}",
            found.len(),
            ids.len(),
            epoch
        );
        Ok(found)
    }

    fn get_name(&self) -> &'static str {
        "multicall"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::contracts::IDlpPerformance;
    use alloy::sol_types::SolType;

    fn encoded_performance(total: u64) -> Vec<u8> {
        let info = IDlpPerformance::EpochDlpPerformanceInfo {
            totalScore: U256::from(total),
            tradingVolume: U256::from(5_000u64),
            uniqueContributors: U256::from(42u64),
            dataAccessFees: U256::from(7u64),
            tradingVolumeScore: U256::from(100u64),
            uniqueContributorsScore: U256::from(200u64),
            dataAccessFeesScore: U256::from(300u64),
            tradingVolumeScorePenalty: U256::ZERO,
            uniqueContributorsScorePenalty: U256::from(1u64),
            dataAccessFeesScorePenalty: U256::ZERO,
        };
        <IDlpPerformance::EpochDlpPerformanceInfo as SolType>::abi_encode(&info)
    }

    #[test]
    fn test_decode_batch_isolates_failed_sub_calls() {
        let ids = [U256::from(1), U256::from(2), U256::from(3)];
        let results = vec![
            IMulticall3::CallResult {
                success: true,
                returnData: encoded_performance(12345).into(),
            },
            IMulticall3::CallResult {
                success: false,
                returnData: Default::default(),
            },
            IMulticall3::CallResult {
                success: true,
                returnData: vec![0xde, 0xad].into(),
            },
        ];

        let decoded = decode_batch(&ids, &results);

        assert_eq!(decoded.len(), 1);
        let perf = &decoded[&U256::from(1)];
        assert_eq!(perf.total_score, Some(U256::from(12345u64)));
        assert_eq!(perf.unique_contributors, U256::from(42u64));
        assert_eq!(perf.unique_contributors_score_penalty, U256::from(1u64));
    }

    #[test]
    fn test_build_calls_targets_performance_contract() {
        let performance_address = Address::repeat_byte(0x11);
        let source = MulticallPerformance::new(
            ProviderCache::new(vec![]),
            performance_address,
            Address::repeat_byte(0x22),
            Duration::from_secs(1),
        );

        let calls = source.build_calls(4, &[U256::from(9)]);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].target, performance_address);
        assert!(calls[0].allowFailure);

        let decoded = epochDlpPerformancesCall::abi_decode(&calls[0].callData, true).unwrap();
        assert_eq!(decoded.epochId, U256::from(4));
        assert_eq!(decoded.dlpId, U256::from(9));
    }

    #[tokio::test]
    async fn test_empty_ids_skip_rpc() {
        let source = MulticallPerformance::new(
            ProviderCache::new(vec![]),
            Address::ZERO,
            Address::ZERO,
            Duration::from_secs(1),
        );
        assert!(source.performances(1, &[]).await.unwrap().is_empty());
    }
}
