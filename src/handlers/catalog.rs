use super::AppState;
use crate::{
    Result,
    types::{GlobalStats, ReferenceSequence, TrackCatalog},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

pub async fn ref_seqs(
    State(state): State<AppState>,
    Path(organism): Path<String>,
) -> Result<Json<Vec<ReferenceSequence>>> {
    let seqs = state.catalog.list_reference_sequences(&organism).await?;
    Ok(Json(seqs))
}

pub async fn track_list(
    State(state): State<AppState>,
    Path(organism): Path<String>,
) -> Result<Json<TrackCatalog>> {
    let catalog = state.catalog.build_track_catalog(&organism).await?;
    Ok(Json(catalog))
}

/// Fixed density hint; no per-organism statistics are computed
pub async fn stats_global() -> Json<GlobalStats> {
    Json(GlobalStats {
        feature_density: 0.01,
    })
}

/// Empty configuration; everything is described by `trackList.json`
pub async fn tracks_conf() -> StatusCode {
    StatusCode::OK
}
