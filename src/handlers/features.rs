use super::AppState;
use crate::{
    Result,
    dispatch::RangeMode,
    range::CoordinateRange,
    types::{FeatureContainer, FeatureQuery},
};
use axum::{
    Json,
    extract::{Path, RawQuery, State},
};

/// Features or residues of one reference sequence over `[start, end)`
pub async fn get_features(
    State(state): State<AppState>,
    Path((organism, refseq)): Path<(String, String)>,
    RawQuery(raw): RawQuery,
) -> Result<Json<FeatureContainer>> {
    let query = FeatureQuery::parse(raw.as_deref());
    let range = CoordinateRange::from_params(query.start.as_deref(), query.end.as_deref())?;
    let mode = RangeMode::from_flag(query.wants_sequence());

    let result = state
        .dispatcher
        .resolve_range(&organism, &refseq, range, mode, query.type_filter())
        .await?;

    Ok(Json(result.into()))
}
