use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Default, Deserialize)]
pub(super) struct MapParams {
    /// Comma-separated condition or symptom text.
    conditions: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SpecialtyMapData {
    conditions: Vec<String>,
    specialties: Vec<String>,
    dictionary_version: String,
}

pub(super) async fn map_specialties(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<MapParams>,
) -> Json<ApiResponse<SpecialtyMapData>> {
    let conditions: Vec<String> = params
        .conditions
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(ToString::to_string)
        .collect();
    let specialties = state.mapper.map_conditions(&conditions);

    Json(ApiResponse {
        data: SpecialtyMapData {
            conditions,
            specialties: specialties.into_iter().collect(),
            dictionary_version: state.mapper.version().to_string(),
        },
        meta: ResponseMeta::new(req_id.0),
    })
}
