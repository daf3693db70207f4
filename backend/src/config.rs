use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Hard cap on the block span of a single `eth_getLogs` request on Vana RPCs.
pub const MAX_LOG_BLOCK_RANGE: u64 = 10_000;

pub const VANA_CHAIN_ID: u64 = 1480;
pub const VANA_RPC_URL: &str = "https://rpc.vana.org";
pub const DLP_REGISTRY_ADDRESS: &str = "0x4D59880a924526d1dD33260552Ff4328b1E18a43";
pub const DLP_PERFORMANCE_ADDRESS: &str = "0x00A5Fffd73fe45f410b888ba83C7FCE886eE6521";
pub const MULTICALL3_ADDRESS: &str = "0xcA11bde05977b3631167028862bE2a173976CA11";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid address for {0}: {1}")]
    InvalidAddress(&'static str, String),
    #[error("Invalid number for {0}: {1}")]
    InvalidNumber(&'static str, String),
    #[error("Unknown performance strategy: {0}")]
    UnknownStrategy(String),
}

/// How per-epoch performance records are read from the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceStrategy {
    /// One `epochDlpPerformances` call per pool.
    Direct,
    /// A single Multicall3 `aggregate3` round trip.
    Multicall,
    /// Rebuilt from saved/overridden performance events.
    Events,
}

impl FromStr for PerformanceStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "multicall" => Ok(Self::Multicall),
            "events" | "logs" => Ok(Self::Events),
            other => Err(ConfigError::UnknownStrategy(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.0-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout: Duration::from_secs(20),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Primary RPC first, fallbacks after it.
    pub rpc_urls: Vec<String>,
    pub chain_id: u64,
    pub registry_address: Address,
    pub performance_address: Address,
    pub epoch_address: Option<Address>,
    pub multicall_address: Address,
    pub default_epoch: u64,
    pub strategy: PerformanceStrategy,
    pub call_timeout: Duration,
    /// Upper bound on one whole performance batch, whatever the strategy.
    pub fetch_timeout: Duration,
    pub max_log_block_range: u64,
    pub log_lookback_blocks: u64,
    pub bind_addr: String,
    pub summarizer: SummarizerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rpc_urls: vec![VANA_RPC_URL.to_string()],
            chain_id: VANA_CHAIN_ID,
            registry_address: Address::from_str(DLP_REGISTRY_ADDRESS).unwrap_or(Address::ZERO),
            performance_address: Address::from_str(DLP_PERFORMANCE_ADDRESS)
                .unwrap_or(Address::ZERO),
            epoch_address: None,
            multicall_address: Address::from_str(MULTICALL3_ADDRESS).unwrap_or(Address::ZERO),
            default_epoch: 3,
            strategy: PerformanceStrategy::Multicall,
            call_timeout: Duration::from_secs(10),
            fetch_timeout: Duration::from_secs(30),
            max_log_block_range: MAX_LOG_BLOCK_RANGE,
            log_lookback_blocks: 100_000,
            bind_addr: "0.0.0.0:3000".to_string(),
            summarizer: SummarizerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from process environment, falling back to Vana mainnet defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut rpc_urls = vec![var("VANA_RPC_URL").unwrap_or_else(|| VANA_RPC_URL.to_string())];
        if let Some(fallbacks) = var("VANA_RPC_FALLBACK_URLS") {
            rpc_urls.extend(
                fallbacks
                    .split(',')
                    .map(|url| url.trim().to_string())
                    .filter(|url| !url.is_empty()),
            );
        }
        rpc_urls.dedup();

        let address = |key: &'static str, fallback: Address| -> Result<Address, ConfigError> {
            match var(key) {
                Some(raw) => Address::from_str(raw.trim())
                    .map_err(|_| ConfigError::InvalidAddress(key, raw)),
                None => Ok(fallback),
            }
        };
        let number = |key: &'static str, fallback: u64| -> Result<u64, ConfigError> {
            match var(key) {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidNumber(key, raw)),
                None => Ok(fallback),
            }
        };

        let epoch_address = match var("DLP_EPOCH_ADDRESS") {
            Some(raw) => Some(
                Address::from_str(raw.trim())
                    .map_err(|_| ConfigError::InvalidAddress("DLP_EPOCH_ADDRESS", raw))?,
            ),
            None => None,
        };

        let strategy = match var("DLP_PERFORMANCE_STRATEGY") {
            Some(raw) => raw.parse()?,
            None => defaults.strategy,
        };

        let summarizer = SummarizerConfig {
            api_key: var("GEMINI_API_KEY"),
            model: var("GEMINI_MODEL").unwrap_or(defaults.summarizer.model),
            endpoint: var("GEMINI_ENDPOINT").unwrap_or(defaults.summarizer.endpoint),
            timeout: Duration::from_secs(number(
                "SUMMARY_TIMEOUT_SECS",
                defaults.summarizer.timeout.as_secs(),
            )?),
        };

        Ok(Self {
            rpc_urls,
            chain_id: number("VANA_CHAIN_ID", defaults.chain_id)?,
            registry_address: address("DLP_REGISTRY_ADDRESS", defaults.registry_address)?,
            performance_address: address("DLP_PERFORMANCE_ADDRESS", defaults.performance_address)?,
            epoch_address,
            multicall_address: address("MULTICALL3_ADDRESS", defaults.multicall_address)?,
            default_epoch: number("DLP_DEFAULT_EPOCH", defaults.default_epoch)?,
            strategy,
            call_timeout: Duration::from_millis(number(
                "RPC_CALL_TIMEOUT_MS",
                defaults.call_timeout.as_millis() as u64,
            )?),
            fetch_timeout: Duration::from_millis(number(
                "FETCH_TIMEOUT_MS",
                defaults.fetch_timeout.as_millis() as u64,
            )?),
            max_log_block_range: number("MAX_LOG_BLOCK_RANGE", defaults.max_log_block_range)?
                .clamp(1, MAX_LOG_BLOCK_RANGE),
            log_lookback_blocks: number("LOG_LOOKBACK_BLOCKS", defaults.log_lookback_blocks)?,
            bind_addr: var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            summarizer,
        })
    }
}
