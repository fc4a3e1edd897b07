//! JSON API over the satellite catalog

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use orbital_toolkit::propagator::grid_len;
use orbital_toolkit::{
    ElementRecord, Epoch, Error, GeodeticCoords, KeplerianElements, MeanElements, PropagatedState,
    SatKey,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{debug, info, instrument, warn};

use crate::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/satellites", get(list_satellites).post(load_satellite))
        .route(
            "/satellites/:key",
            get(get_satellite).delete(remove_satellite),
        )
        .route("/satellites/:key/state", get(satellite_state))
        .route("/satellites/:key/ephemeris", get(satellite_ephemeris))
        .route("/states", get(all_states))
        .route("/ephemeris", get(all_ephemerides))
        .route("/catalog", get(catalog_text))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Failure of an API call, rendered as `{ "error": code, "message": text }`.
#[derive(Debug)]
pub enum ApiError {
    Core(Error),
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError::Core(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(err) => match err {
                Error::Validation { .. }
                | Error::TleFormat { .. }
                | Error::BadElement { .. }
                | Error::OutOfOrder { .. } => StatusCode::BAD_REQUEST,
                Error::BadKey { .. } => StatusCode::NOT_FOUND,
                Error::DuplicateKey { .. } => StatusCode::CONFLICT,
                Error::Initialization { .. }
                | Error::Propagation { .. }
                | Error::DegenerateOrbit { .. }
                | Error::UnsupportedModel { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            ApiError::Core(err) => ErrorBody {
                error: err.code().to_string(),
                message: err.to_string(),
            },
            ApiError::Internal(message) => ErrorBody {
                error: "internal".to_string(),
                message: message.clone(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct LoadRequest {
    pub line1: String,
    pub line2: String,
}

#[derive(Debug, Serialize)]
pub struct SatelliteSummary {
    pub key: SatKey,
    pub satellite_id: u32,
}

#[derive(Debug, Serialize)]
pub struct SatelliteDetail {
    pub key: SatKey,
    pub record: ElementRecord,
    pub line1: String,
    pub line2: String,
}

#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub epoch: DateTime<Utc>,
    pub minutes_since_epoch: f64,
    pub position_km: [f64; 3],
    pub velocity_km_s: [f64; 3],
    pub geodetic: GeodeticCoords,
    pub revolution_number: i64,
    pub nodal_period_min: f64,
    pub mean: MeanElements,
    pub osculating: KeplerianElements,
}

impl From<&PropagatedState> for StateResponse {
    fn from(state: &PropagatedState) -> Self {
        let [x, y, z, vx, vy, vz] = state.cartesian.to_array();
        Self {
            epoch: state.epoch.to_datetime(),
            minutes_since_epoch: state.minutes_since_epoch,
            position_km: [x, y, z],
            velocity_km_s: [vx, vy, vz],
            geodetic: state.geodetic,
            revolution_number: state.revolution_number,
            nodal_period_min: state.nodal_period,
            mean: state.mean,
            osculating: state.osculating,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EphemerisResponse {
    pub key: SatKey,
    pub points: Vec<StateResponse>,
}

#[derive(Debug, Serialize)]
pub struct KeyedState {
    pub key: SatKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<StateResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Serialize)]
pub struct KeyedEphemeris {
    pub key: SatKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<StateResponse>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
pub struct EpochQuery {
    pub epoch: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
    /// Seconds between points.
    pub step: f64,
}

/// Runs CPU-bound catalog work off the async executor.
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> orbital_toolkit::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(ApiError::from)
}

fn observe<T>(state: &AppState, route: &str, start: Instant, ok: StatusCode, result: &Result<T, ApiError>) {
    let status = match result {
        Ok(_) => ok,
        Err(err) => {
            warn!(route, error = ?err, "Request failed");
            err.status()
        }
    };
    state.metrics.record_request(route, status, start.elapsed());
    state.metrics.set_loaded(state.engine.catalog().count());
}

#[instrument(skip(state, request))]
async fn load_satellite(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoadRequest>,
) -> Result<(StatusCode, Json<SatelliteSummary>), ApiError> {
    let start = Instant::now();
    let engine = state.engine.clone();
    let result = blocking(move || {
        let record = ElementRecord::parse(&request.line1, &request.line2)?;
        let key = engine.load(&record)?;
        Ok(SatelliteSummary {
            key,
            satellite_id: record.satellite_id(),
        })
    })
    .await;
    observe(&state, "load", start, StatusCode::CREATED, &result);

    let summary = result?;
    info!(key = %summary.key, satellite_id = summary.satellite_id, "Satellite loaded");
    Ok((StatusCode::CREATED, Json(summary)))
}

async fn list_satellites(State(state): State<Arc<AppState>>) -> Json<Vec<SatelliteSummary>> {
    let catalog = state.engine.catalog();
    let satellites = catalog
        .list_keys()
        .into_iter()
        .filter_map(|key| {
            catalog.get(key).ok().map(|record| SatelliteSummary {
                key,
                satellite_id: record.satellite_id(),
            })
        })
        .collect();
    Json(satellites)
}

async fn get_satellite(
    State(state): State<Arc<AppState>>,
    Path(key): Path<u64>,
) -> Result<Json<SatelliteDetail>, ApiError> {
    let key = SatKey::from(key);
    let record = state.engine.catalog().get(key)?;
    let (line1, line2) = record.lines()?;
    Ok(Json(SatelliteDetail {
        key,
        record,
        line1,
        line2,
    }))
}

#[instrument(skip(state))]
async fn remove_satellite(State(state): State<Arc<AppState>>, Path(key): Path<u64>) -> StatusCode {
    let start = Instant::now();
    state.engine.catalog().remove(SatKey::from(key));
    let result: Result<(), ApiError> = Ok(());
    observe(&state, "remove", start, StatusCode::NO_CONTENT, &result);
    debug!(key, "Satellite removed");
    StatusCode::NO_CONTENT
}

#[instrument(skip(state))]
async fn satellite_state(
    State(state): State<Arc<AppState>>,
    Path(key): Path<u64>,
    Query(query): Query<EpochQuery>,
) -> Result<Json<StateResponse>, ApiError> {
    let start = Instant::now();
    let engine = state.engine.clone();
    let epoch = Epoch::from_datetime(query.epoch);
    let result = blocking(move || engine.propagate(SatKey::from(key), epoch)).await;
    observe(&state, "state", start, StatusCode::OK, &result);
    Ok(Json(StateResponse::from(&result?)))
}

#[instrument(skip(state))]
async fn satellite_ephemeris(
    State(state): State<Arc<AppState>>,
    Path(key): Path<u64>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<EphemerisResponse>, ApiError> {
    let start = Instant::now();
    let first = Epoch::from_datetime(query.start);
    let last = Epoch::from_datetime(query.stop);
    let max_points = state.max_ephemeris_points;
    let engine = state.engine.clone();

    let result = blocking(move || {
        let points = grid_len(first, last, query.step)?;
        if points > max_points {
            return Err(Error::Validation {
                field: "ephemeris_points",
                value: format!("{points} exceeds {max_points}"),
            });
        }
        engine.propagate_range(SatKey::from(key), first, last, query.step)
    })
    .await;
    observe(&state, "ephemeris", start, StatusCode::OK, &result);

    let ephemeris = result?;
    state.metrics.record_ephemeris(ephemeris.len());
    Ok(Json(EphemerisResponse {
        key: SatKey::from(key),
        points: ephemeris.iter().map(StateResponse::from).collect(),
    }))
}

#[instrument(skip(state))]
async fn all_states(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EpochQuery>,
) -> Result<Json<Vec<KeyedState>>, ApiError> {
    let start = Instant::now();
    let engine = state.engine.clone();
    let epoch = Epoch::from_datetime(query.epoch);
    let result = blocking(move || Ok(engine.propagate_all(epoch))).await;
    observe(&state, "states", start, StatusCode::OK, &result);

    let states = result?
        .into_iter()
        .map(|(key, outcome)| match outcome {
            Ok(propagated) => KeyedState {
                key,
                state: Some(StateResponse::from(&propagated)),
                error: None,
            },
            Err(err) => KeyedState {
                key,
                state: None,
                error: Some(ApiError::from(err).body()),
            },
        })
        .collect();
    Ok(Json(states))
}

#[instrument(skip(state))]
async fn all_ephemerides(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<KeyedEphemeris>>, ApiError> {
    let start = Instant::now();
    let first = Epoch::from_datetime(query.start);
    let last = Epoch::from_datetime(query.stop);
    let max_points = state.max_ephemeris_points;
    let engine = state.engine.clone();

    let result = blocking(move || {
        let points = grid_len(first, last, query.step)?;
        let total = points.saturating_mul(engine.catalog().count());
        if total > max_points {
            return Err(Error::Validation {
                field: "ephemeris_points",
                value: format!("{total} exceeds {max_points}"),
            });
        }
        engine.propagate_all_range(first, last, query.step)
    })
    .await;
    observe(&state, "ephemerides", start, StatusCode::OK, &result);

    let ranges = result?;
    let mut generated = 0;
    let body = ranges
        .into_iter()
        .map(|(key, outcome)| match outcome {
            Ok(ephemeris) => {
                generated += ephemeris.len();
                KeyedEphemeris {
                    key,
                    points: Some(ephemeris.iter().map(StateResponse::from).collect()),
                    error: None,
                }
            }
            Err(err) => KeyedEphemeris {
                key,
                points: None,
                error: Some(ApiError::from(err).body()),
            },
        })
        .collect();
    state.metrics.record_ephemeris(generated);
    Ok(Json(body))
}

async fn catalog_text(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let mut buffer = Vec::new();
    state.engine.catalog().write_catalog(&mut buffer)?;
    let text = String::from_utf8(buffer).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text))
}
