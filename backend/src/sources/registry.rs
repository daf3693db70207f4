use crate::sources::contracts::{IDlpRegistry, IVanaEpoch};
use crate::sources::{u256_to_u64, ProviderCache, RegistrySource, SourceError};
use crate::types::DlpInfo;
use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info};

/// DLP registry reader backed by the on-chain registry contract.
#[derive(Clone)]
pub struct ContractRegistry {
    provider_cache: ProviderCache,
    registry_address: Address,
    epoch_address: Option<Address>,
    call_timeout: Duration,
}

impl ContractRegistry {
    pub fn new(
        provider_cache: ProviderCache,
        registry_address: Address,
        epoch_address: Option<Address>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            provider_cache,
            registry_address,
            epoch_address,
            call_timeout,
        }
    }
}

#[async_trait]
impl RegistrySource for ContractRegistry {
    async fn eligible_dlp_ids(&self) -> Result<Vec<U256>, SourceError> {
        let provider = self.provider_cache.get_provider().await?;
        let registry = IDlpRegistry::new(self.registry_address, &provider);
        let call = registry.eligibleDlpsListValues();

        match timeout(self.call_timeout, call.call()).await {
            Ok(Ok(result)) => {
                info!("✅ Registry reports {} eligible DLPs", result._0.len());
                Ok(result._0)
            }
            Ok(Err(e)) => {
                self.provider_cache.report_call_error(&e);
                Err(SourceError::ContractCallFailed(format!(
                    "eligibleDlpsListValues: {}",
                    e
                )))
            }
            Err(_) => {
                self.provider_cache.report_failure();
                Err(SourceError::Timeout("eligibleDlpsListValues".to_string()))
            }
        }
    }

    async fn dlp_info(&self, id: U256) -> Result<Option<DlpInfo>, SourceError> {
        let provider = self.provider_cache.get_provider().await?;
        let registry = IDlpRegistry::new(self.registry_address, &provider);
        let call = registry.dlps(id);

        match timeout(self.call_timeout, call.call()).await {
            Ok(Ok(result)) => {
                let info = DlpInfo::from(result._0);
                // Unregistered ids come back as an all-zero struct
                if info.id.is_zero() && info.address == Address::ZERO {
                    debug!("DLP {} not found in registry", id);
                    Ok(None)
                } else {
                    Ok(Some(info))
                }
            }
            Ok(Err(e)) => {
                self.provider_cache.report_call_error(&e);
                Err(SourceError::ContractCallFailed(format!("dlps({}): {}", id, e)))
            }
            Err(_) => {
                self.provider_cache.report_failure();
                Err(SourceError::Timeout(format!("dlps({})", id)))
            }
        }
    }

    async fn current_epoch(&self) -> Result<Option<u64>, SourceError> {
        let Some(epoch_address) = self.epoch_address else {
            return Ok(None);
        };

        let provider = self.provider_cache.get_provider().await?;
        let epochs = IVanaEpoch::new(epoch_address, &provider);
        let call = epochs.epochsCount();

        match timeout(self.call_timeout, call.call()).await {
            Ok(Ok(result)) => Ok(Some(u256_to_u64(result._0))),
            Ok(Err(e)) => {
                self.provider_cache.report_call_error(&e);
                Err(SourceError::ContractCallFailed(format!("epochsCount: {}", e)))
            }
            Err(_) => {
                self.provider_cache.report_failure();
                Err(SourceError::Timeout("epochsCount".to_string()))
            }
        }
    }

    fn get_name(&self) -> &'static str {
        "DlpRegistry"
    }
}
