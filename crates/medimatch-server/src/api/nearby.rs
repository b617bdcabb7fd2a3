use std::collections::BTreeSet;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use medimatch_core::{Coordinate, ProviderKind};
use medimatch_geo::LocationInput;
use medimatch_proximity::{
    format_results, FormattedProvider, NearbyResponse, SearchTier, SpecialtyMapper, UserLocation,
};
use serde::{Deserialize, Serialize};

use crate::middleware::{ClientIp, RequestId};

use super::{map_search_error, ApiError, ApiResponse, AppState, ResponseMeta, SearchLimits};

/// Raw query string. Numbers stay text so bad input becomes a
/// `validation_error` envelope instead of a bare extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub(super) struct NearbyParams {
    lat: Option<String>,
    lng: Option<String>,
    radius: Option<String>,
    limit: Option<String>,
    specialty: Option<String>,
    specialization: Option<String>,
}

#[derive(Debug, PartialEq)]
struct NearbyRequest {
    coordinates: Option<Coordinate>,
    radius_km: f64,
    limit: usize,
    specialties: BTreeSet<String>,
}

impl NearbyRequest {
    fn location_input(&self, client_ip: Option<String>) -> LocationInput {
        LocationInput {
            coordinates: self.coordinates,
            ip_address: client_ip,
        }
    }
}

fn parse_number(name: &str, raw: &str) -> Result<f64, String> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("{name} must be a number, got '{raw}'"))
}

fn parse_coordinates(lat: Option<&str>, lng: Option<&str>) -> Result<Option<Coordinate>, String> {
    match (lat, lng) {
        (None, None) => Ok(None),
        (Some(lat), Some(lng)) => {
            let latitude = parse_number("lat", lat)?;
            let longitude = parse_number("lng", lng)?;
            Coordinate::new(latitude, longitude)
                .map(Some)
                .map_err(|e| e.to_string())
        }
        _ => Err("lat and lng must be supplied together".to_string()),
    }
}

fn parse_request(
    params: &NearbyParams,
    limits: SearchLimits,
    mapper: &SpecialtyMapper,
) -> Result<NearbyRequest, String> {
    let coordinates = parse_coordinates(params.lat.as_deref(), params.lng.as_deref())?;

    let radius_km = match params.radius.as_deref() {
        None => limits.default_radius_km,
        Some(raw) => {
            let radius = parse_number("radius", raw)?;
            if radius <= 0.0 {
                return Err(format!("radius must be greater than zero, got {radius}"));
            }
            radius
        }
    };

    let limit = match params.limit.as_deref() {
        None => limits.default_limit,
        Some(raw) => {
            let limit = raw
                .trim()
                .parse::<i64>()
                .map_err(|_| format!("limit must be an integer, got '{raw}'"))?;
            if limit <= 0 {
                return Err(format!("limit must be greater than zero, got {limit}"));
            }
            usize::try_from(limit).unwrap_or(usize::MAX)
        }
    }
    .min(limits.max_limit);

    let specialties = params
        .specialty
        .as_deref()
        .or(params.specialization.as_deref())
        .map(|raw| {
            let texts: Vec<&str> = raw.split(',').collect();
            mapper.specialties_for_query(&texts)
        })
        .unwrap_or_default();

    Ok(NearbyRequest {
        coordinates,
        radius_km,
        limit,
        specialties,
    })
}

pub(super) async fn hospitals_nearby(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ClientIp(client_ip): ClientIp,
    Query(params): Query<NearbyParams>,
) -> Result<Json<ApiResponse<NearbyResponse>>, ApiError> {
    nearby(&state, ProviderKind::Hospital, req_id, client_ip, &params).await
}

pub(super) async fn doctors_nearby(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ClientIp(client_ip): ClientIp,
    Query(params): Query<NearbyParams>,
) -> Result<Json<ApiResponse<NearbyResponse>>, ApiError> {
    nearby(&state, ProviderKind::Doctor, req_id, client_ip, &params).await
}

async fn nearby(
    state: &AppState,
    kind: ProviderKind,
    req_id: RequestId,
    client_ip: Option<String>,
    params: &NearbyParams,
) -> Result<Json<ApiResponse<NearbyResponse>>, ApiError> {
    let request = parse_request(params, state.limits, &state.mapper)
        .map_err(|message| ApiError::validation(req_id.0.clone(), message))?;

    let location = state.locate(&request.location_input(client_ip)).await;
    let outcome = state
        .engine(kind)
        .find_nearby(
            &location,
            request.radius_km,
            &request.specialties,
            request.limit,
        )
        .await
        .map_err(|e| map_search_error(req_id.0.clone(), &e))?;

    tracing::info!(
        kind = %kind,
        source = ?location.source,
        search_method = %outcome.search_method,
        count = outcome.results.len(),
        "nearby search served"
    );

    Ok(Json(ApiResponse {
        data: NearbyResponse::new(kind, &outcome, &location, request.radius_km),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Hospitals and doctors around one resolved location.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CombinedNearby {
    hospitals: Vec<FormattedProvider>,
    doctors: Vec<FormattedProvider>,
    user_location: UserLocation,
    search_radius: f64,
    count: usize,
    search_method: SearchTier,
    doctor_search_method: SearchTier,
    specialty_filter_relaxed: bool,
}

pub(super) async fn providers_nearby(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ClientIp(client_ip): ClientIp,
    Query(params): Query<NearbyParams>,
) -> Result<Json<ApiResponse<CombinedNearby>>, ApiError> {
    let request = parse_request(&params, state.limits, &state.mapper)
        .map_err(|message| ApiError::validation(req_id.0.clone(), message))?;

    let location = state.locate(&request.location_input(client_ip)).await;
    let (hospitals, doctors) = tokio::join!(
        state.hospitals.find_nearby(
            &location,
            request.radius_km,
            &request.specialties,
            request.limit
        ),
        state.doctors.find_nearby(
            &location,
            request.radius_km,
            &request.specialties,
            request.limit
        ),
    );
    let hospitals = hospitals.map_err(|e| map_search_error(req_id.0.clone(), &e))?;
    let doctors = doctors.map_err(|e| map_search_error(req_id.0.clone(), &e))?;

    let data = CombinedNearby {
        count: hospitals.results.len() + doctors.results.len(),
        hospitals: format_results(&hospitals.results),
        doctors: format_results(&doctors.results),
        user_location: UserLocation::from(&location),
        search_radius: request.radius_km,
        search_method: hospitals.search_method,
        doctor_search_method: doctors.search_method,
        specialty_filter_relaxed: hospitals.specialty_filter_relaxed
            || doctors.specialty_filter_relaxed,
    };

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
