//! HTTP request handlers for the calculation endpoints.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lilit_astro::{ascendant, parse_date_time, parse_tz_offset, planetary_positions, AstroError};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use time::macros::format_description;
use time::OffsetDateTime;

use super::state::AppState;

/// Body of `/` requests.
pub(crate) const SERVICE_MESSAGE: &str = "LILIT's astrological API";

/// Rounding of degrees on `/planets` and `/ascendant`.
const PRECISE_DECIMALS: u32 = 4;

/// Rounding of degrees on `/planetary-positions`.
const LEGACY_DECIMALS: u32 = 2;

/// Optional body of the position endpoints.
#[derive(Debug, Default, Deserialize)]
struct DateTimeRequest {
    #[serde(default)]
    date_time: Option<String>,
}

/// Body of `/ascendant`.
#[derive(Debug, Deserialize)]
struct LocationRequest {
    date_time: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    tz_offset: Option<String>,
}

fn unprocessable(message: &str) -> Response {
    super::json_detail(StatusCode::UNPROCESSABLE_ENTITY, message).into_response()
}

/// Calculation-input error rendered as 422.
struct AstroErrorResponse(AstroError);

impl From<AstroError> for AstroErrorResponse {
    fn from(err: AstroError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AstroErrorResponse {
    fn into_response(self) -> Response {
        unprocessable(&self.0.to_string())
    }
}

/// Decode a JSON body. An empty (or all-whitespace) body yields `None`.
fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<Option<T>, Response> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| unprocessable(&format!("invalid request body: {e}")))
}

/// GET / -- service banner.
pub(crate) async fn handle_root() -> impl IntoResponse {
    Json(json!({ "message": SERVICE_MESSAGE }))
}

/// GET|POST /planets
pub(crate) async fn handle_planets(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    positions_response(&state, &body, PRECISE_DECIMALS)
}

/// GET|POST /planetary-positions
pub(crate) async fn handle_planetary_positions(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Response {
    positions_response(&state, &body, LEGACY_DECIMALS)
}

/// Positions of every body, keyed by body name. Without a `date_time` the
/// current moment is used.
fn positions_response(state: &AppState, body: &[u8], decimals: u32) -> Response {
    let request: DateTimeRequest = match decode_body(body) {
        Ok(request) => request.unwrap_or_default(),
        Err(response) => return response,
    };
    let at = match request.date_time.as_deref() {
        Some(raw) => match parse_date_time(raw).and_then(|input| input.to_utc(None)) {
            Ok(at) => at,
            Err(e) => return AstroErrorResponse(e).into_response(),
        },
        None => OffsetDateTime::now_utc(),
    };

    let positions: Map<String, Value> = planetary_positions(state.ephemeris.as_ref(), at, decimals)
        .into_iter()
        .map(|p| {
            (
                p.body.name().to_string(),
                json!({ "sign": p.sign, "degrees": p.degrees }),
            )
        })
        .collect();
    Json(Value::Object(positions)).into_response()
}

/// POST /ascendant
pub(crate) async fn handle_ascendant(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let request: LocationRequest = match decode_body(&body) {
        Ok(Some(request)) => request,
        Ok(None) => return unprocessable("request body required"),
        Err(response) => return response,
    };
    match compute_ascendant(&state, &request) {
        Ok(value) => Json(value).into_response(),
        Err(e) => e.into_response(),
    }
}

fn compute_ascendant(
    state: &AppState,
    request: &LocationRequest,
) -> Result<Value, AstroErrorResponse> {
    let input = parse_date_time(&request.date_time)?;
    let fallback = request
        .tz_offset
        .as_deref()
        .filter(|raw| !raw.trim().is_empty())
        .map(parse_tz_offset)
        .transpose()?;
    let at = input.to_utc(fallback)?;

    let report = ascendant(
        state.ephemeris.as_ref(),
        at,
        request.latitude,
        request.longitude,
        PRECISE_DECIMALS,
    )?;

    Ok(json!({
        "sign": report.sign,
        "degrees": report.degrees,
        "debug": {
            "input_datetime": request.date_time,
            "datetime_utc": format_utc(report.at_utc),
            "longitude": request.longitude,
            "latitude": request.latitude,
            "ascendant": report.longitude,
        },
    }))
}

fn format_utc(at: OffsetDateTime) -> String {
    at.format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
        .unwrap_or_else(|_| at.to_string())
}

/// Fallback handler for unknown routes.
pub(crate) async fn handle_not_found() -> impl IntoResponse {
    super::json_detail(StatusCode::NOT_FOUND, "not found")
}
