pub mod aggregator;
pub mod api;
pub mod config;
pub mod highlights;
pub mod historical;
pub mod scoring;
pub mod sources;
pub mod summarizer;
pub mod types;

pub use aggregator::DlpAggregator;
pub use config::AppConfig;
pub use types::{Dlp, RankedDlps};
