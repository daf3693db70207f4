use crate::api::{ApiError, AppState};
use crate::highlights::{filter_by_name, Highlights, DEFAULT_HIGHLIGHT_LIMIT};
use crate::historical::MetricSeries;
use crate::types::RankedDlps;
use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

#[derive(Debug, Deserialize)]
pub struct DlpQuery {
    pub epoch: Option<u64>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HighlightsQuery {
    pub epoch: Option<u64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct EpochQuery {
    pub epoch: Option<u64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub epoch: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummarizeRequest {
    #[serde(default)]
    pub metadata: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryStatus {
    Ok,
    Unavailable,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummarizeResponse {
    pub summary: Option<String>,
    pub status: SummaryStatus,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendsResponse {
    pub id: String,
    pub name: String,
    pub epoch: u64,
    pub series: Vec<MetricSeries>,
}

pub async fn health_check() -> &'static str {
    info!("Health check requested");
    "OK"
}

#[instrument(skip(state))]
pub async fn list_dlps(
    State(state): State<AppState>,
    query: Result<Query<DlpQuery>, QueryRejection>,
) -> Result<Json<RankedDlps>, ApiError> {
    let Query(params) = query?;
    let mut result = state.aggregator.fetch_dlp_data(params.epoch).await;

    if let Some(search) = params.search.as_deref() {
        result.dlps = filter_by_name(&result.dlps, search);
    }

    Ok(Json(result))
}

/// Manual refresh; the body is optional and may carry an epoch.
#[instrument(skip(state, body))]
pub async fn refresh_dlps(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<RankedDlps>, ApiError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        RefreshRequest::default()
    } else {
        serde_json::from_slice::<RefreshRequest>(&body)
            .map_err(|e| ApiError::BadRequest(format!("refresh body: {}", e)))?
    };

    info!("🔄 Manual refresh requested (epoch: {:?})", request.epoch);
    Ok(Json(state.aggregator.fetch_dlp_data(request.epoch).await))
}

#[instrument(skip(state))]
pub async fn get_highlights(
    State(state): State<AppState>,
    query: Result<Query<HighlightsQuery>, QueryRejection>,
) -> Result<Json<Highlights>, ApiError> {
    let Query(params) = query?;
    let result = state.aggregator.fetch_dlp_data(params.epoch).await;
    let limit = params.limit.unwrap_or(DEFAULT_HIGHLIGHT_LIMIT).max(1);
    Ok(Json(Highlights::from_dlps(&result.dlps, limit)))
}

/// Placeholder per-metric trend lines for one DLP.
#[instrument(skip(state))]
pub async fn get_trends(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<EpochQuery>, QueryRejection>,
) -> Result<Json<TrendsResponse>, ApiError> {
    let Query(params) = query?;
    let result = state.aggregator.fetch_dlp_data(params.epoch).await;
    let dlp = result
        .dlps
        .iter()
        .find(|d| d.id == id)
        .ok_or_else(|| ApiError::NotFound(format!("DLP {} in epoch {}", id, result.epoch)))?;

    Ok(Json(TrendsResponse {
        id: dlp.id.clone(),
        name: dlp.name.clone(),
        epoch: result.epoch,
        series: state.aggregator.synthesizer().generate_for_metrics(&dlp.metrics),
    }))
}

#[instrument(skip(state, payload))]
pub async fn summarize_metadata(
    State(state): State<AppState>,
    payload: Result<Json<SummarizeRequest>, JsonRejection>,
) -> Result<Json<SummarizeResponse>, ApiError> {
    let Json(request) = payload?;

    let response = match state.summarizer.summarize(&request.metadata).await {
        Ok(summary) => SummarizeResponse {
            summary: Some(summary),
            status: SummaryStatus::Ok,
        },
        Err(e) => {
            warn!("Summary unavailable: {}", e);
            SummarizeResponse {
                summary: None,
                status: SummaryStatus::Unavailable,
            }
        }
    };

    Ok(Json(response))
}
