use crate::sources::SourceError;
use alloy::contract::Error as ContractError;
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::transports::http::{Client, Http};
use alloy::transports::RpcError;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, warn};

pub type HttpProvider = RootProvider<Http<Client>>;

const PROVIDER_TTL: Duration = Duration::from_secs(300);
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Vana RPC provider cache with health-ordered fallback across endpoints
#[derive(Clone)]
pub struct ProviderCache {
    cached: Arc<RwLock<Option<CachedProvider>>>,
    rpc_endpoints: Vec<String>,
    health_tracker: Arc<RwLock<HashMap<String, EndpointHealth>>>,
}

#[derive(Clone)]
struct CachedProvider {
    provider: HttpProvider,
    rpc_url: String,
    created_at: Instant,
}

#[derive(Clone)]
struct EndpointHealth {
    success_rate: f32,
    last_failure: Option<Instant>,
    consecutive_failures: u32,
}

impl Default for EndpointHealth {
    fn default() -> Self {
        Self {
            success_rate: 1.0,
            last_failure: None,
            consecutive_failures: 0,
        }
    }
}

impl ProviderCache {
    pub fn new(rpc_endpoints: Vec<String>) -> Self {
        Self {
            cached: Arc::new(RwLock::new(None)),
            rpc_endpoints,
            health_tracker: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get a live provider, probing endpoints best-health first
    pub async fn get_provider(&self) -> Result<HttpProvider, SourceError> {
        if let Some(provider) = self.get_cached_provider() {
            return Ok(provider);
        }

        if self.rpc_endpoints.is_empty() {
            return Err(SourceError::ConfigError("No RPC endpoints configured".into()));
        }

        let ordered = self.order_endpoints_by_health();
        for (i, rpc_url) in ordered.iter().enumerate() {
            match self.create_provider(rpc_url).await {
                Ok(provider) => {
                    self.cache_provider(provider.clone(), rpc_url);
                    self.update_health_success(rpc_url);
                    return Ok(provider);
                }
                Err(e) => {
                    warn!("RPC endpoint {} unavailable: {}", rpc_url, e);
                    self.update_health_failure(rpc_url);

                    if i < ordered.len() - 1 {
                        sleep(Duration::from_millis(100)).await;
                    }
                }
            }
        }

        Err(SourceError::NoHealthyEndpoint)
    }

    /// Drop the cached provider after a failed call so the next request re-probes.
    pub fn report_failure(&self) {
        let failed_url = match self.cached.write() {
            Ok(mut cached) => cached.take().map(|c| c.rpc_url),
            Err(_) => None,
        };
        if let Some(url) = failed_url {
            debug!("Evicting provider for {}", url);
            self.update_health_failure(&url);
        }
    }

    /// A JSON-RPC error reply such as a revert came from a live endpoint; anything else evicts it.
    pub fn report_call_error(&self, error: &ContractError) {
        if !matches!(error, ContractError::TransportError(RpcError::ErrorResp(_))) {
            self.report_failure();
        }
    }

    async fn create_provider(&self, rpc_url: &str) -> Result<HttpProvider, SourceError> {
        let parsed_url = rpc_url
            .parse()
            .map_err(|e| SourceError::ConfigError(format!("Invalid RPC URL {}: {}", rpc_url, e)))?;

        let provider = ProviderBuilder::new().on_http(parsed_url);

        match tokio::time::timeout(PROBE_TIMEOUT, provider.get_block_number()).await {
            Ok(Ok(_)) => Ok(provider),
            Ok(Err(e)) => Err(SourceError::Rpc(format!("Provider test failed: {}", e))),
            Err(_) => Err(SourceError::Timeout("Provider probe".to_string())),
        }
    }

    fn get_cached_provider(&self) -> Option<HttpProvider> {
        let cached = self.cached.read().ok()?;
        let entry = cached.as_ref()?;
        if entry.created_at.elapsed() < PROVIDER_TTL {
            Some(entry.provider.clone())
        } else {
            None
        }
    }

    fn cache_provider(&self, provider: HttpProvider, rpc_url: &str) {
        if let Ok(mut cached) = self.cached.write() {
            *cached = Some(CachedProvider {
                provider,
                rpc_url: rpc_url.to_string(),
                created_at: Instant::now(),
            });
        }
    }

    fn order_endpoints_by_health(&self) -> Vec<String> {
        let health = self.health_tracker.read().ok();
        let mut scored: Vec<(String, f32)> = self
            .rpc_endpoints
            .iter()
            .map(|url| {
                let score = health
                    .as_ref()
                    .and_then(|h| h.get(url))
                    .map(Self::calculate_health_score)
                    .unwrap_or(1.0);
                (url.clone(), score)
            })
            .collect();

        // Stable, so configured order breaks ties
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.into_iter().map(|(url, _)| url).collect()
    }

    /// Health score from 0.0 (worst) to 1.0 (best)
    fn calculate_health_score(health: &EndpointHealth) -> f32 {
        let mut score = health.success_rate;

        if let Some(last_failure) = health.last_failure {
            if last_failure.elapsed() < Duration::from_secs(60) {
                score *= 0.5;
            }
        }

        if health.consecutive_failures > 0 {
            score *= 0.9_f32.powi(health.consecutive_failures as i32);
        }

        score.clamp(0.0, 1.0)
    }

    fn update_health_success(&self, rpc_url: &str) {
        if let Ok(mut health) = self.health_tracker.write() {
            let entry = health.entry(rpc_url.to_string()).or_default();
            entry.success_rate = (entry.success_rate * 0.9 + 0.1).min(1.0);
            entry.consecutive_failures = 0;
        }
    }

    fn update_health_failure(&self, rpc_url: &str) {
        if let Ok(mut health) = self.health_tracker.write() {
            let entry = health.entry(rpc_url.to_string()).or_default();
            entry.success_rate *= 0.9;
            entry.last_failure = Some(Instant::now());
            entry.consecutive_failures += 1;
        }
    }

    /// (url, success rate, consecutive failures) per configured endpoint
    pub fn get_health_stats(&self) -> Vec<(String, f32, u32)> {
        let health = self.health_tracker.read().ok();
        self.rpc_endpoints
            .iter()
            .map(|url| {
                let (rate, failures) = health
                    .as_ref()
                    .and_then(|h| h.get(url))
                    .map(|h| (h.success_rate, h.consecutive_failures))
                    .unwrap_or((1.0, 0));
                (url.clone(), rate, failures)
            })
            .collect()
    }
}
