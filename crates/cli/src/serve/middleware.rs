//! HTTP middleware: access gateway in front of every route.

use std::borrow::Cow;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Query, State};
use axum::http::{HeaderValue, Request, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use lilit_gateway::{client_identity, AccessRequest, Rejection};

use super::state::AppState;

/// Access middleware. Runs the gateway decision before routing.
///
/// The client identity is the peer IP. Both credential sources are
/// extracted here; the gateway decides which one the path allows.
pub(crate) async fn access_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let identity = client_identity(peer);
    let verdict = {
        let query_credential = query_param(request.uri(), state.gateway.key_name());
        let header_credential = request
            .headers()
            .get(&state.credential_header)
            .map(header_text);
        state.gateway.check(&AccessRequest {
            path: request.uri().path(),
            identity: &identity,
            query_credential: query_credential.as_deref(),
            header_credential: header_credential.as_deref(),
        })
    };

    match verdict {
        Ok(_) => next.run(request).await,
        Err(rejection) => rejection_response(rejection),
    }
}

/// Value of query parameter `name`, if the query string parses.
fn query_param(uri: &Uri, name: &str) -> Option<String> {
    let Query(mut params) = Query::<HashMap<String, String>>::try_from_uri(uri).ok()?;
    params.remove(name)
}

/// Header value as text. Bytes outside visible ASCII are read as Latin-1,
/// so a present but unusual value still counts as a presented credential.
fn header_text(value: &HeaderValue) -> Cow<'_, str> {
    match value.to_str() {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(value.as_bytes().iter().map(|&b| char::from(b)).collect()),
    }
}

fn rejection_response(rejection: Rejection) -> Response {
    let status = StatusCode::from_u16(rejection.status_code()).unwrap_or(StatusCode::FORBIDDEN);
    super::json_detail(status, &rejection.to_string()).into_response()
}
