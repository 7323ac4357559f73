//! OpenAPI document and the interactive reference page.

use std::sync::Arc;

use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::Json;
use serde_json::{json, Value};

use super::handlers::SERVICE_MESSAGE;
use super::state::AppState;

const DOCS_HTML: &str = r#"<!doctype html>
<html>
  <head>
    <title>LILIT API Documentation</title>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <style>
      body {
        margin: 0;
      }
    </style>
  </head>
  <body>
    <script
      id="api-reference"
      type="application/json"
      data-configuration='{
        "theme": "default",
        "layout": "modern",
        "spec": {
          "url": "/openapi.json"
        }
      }'
    ></script>
    <script src="https://cdn.jsdelivr.net/npm/@scalar/api-reference"></script>
  </body>
</html>
"#;

/// GET /docs
pub(crate) async fn handle_docs() -> impl IntoResponse {
    Html(DOCS_HTML)
}

/// GET /openapi.json
pub(crate) async fn handle_openapi(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(openapi_document(state.gateway.key_name()))
}

/// OpenAPI 3.0 description of the API. `key_name` is the credential header
/// (and, on `/planets`, query parameter) name.
pub(crate) fn openapi_document(key_name: &str) -> Value {
    let header_only = json!([{ "ApiKeyHeader": [] }]);
    let header_or_query = json!([{ "ApiKeyHeader": [] }, { "ApiKeyQuery": [] }]);
    let positions = json!({
        "200": {
            "description": "Sign and degrees of each body",
            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Positions" } } }
        },
        "403": { "$ref": "#/components/responses/Forbidden" },
        "422": { "$ref": "#/components/responses/Unprocessable" },
        "429": { "$ref": "#/components/responses/TooManyRequests" }
    });
    let optional_date_time = json!({
        "required": false,
        "content": { "application/json": { "schema": { "$ref": "#/components/schemas/DateTimeRequest" } } }
    });

    let ascendant = json!({
        "post": {
            "summary": "Ascendant for a moment and place",
            "security": header_only,
            "requestBody": {
                "required": true,
                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/LocationRequest" } } }
            },
            "responses": {
                "200": {
                    "description": "Ascendant sign and degrees",
                    "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Ascendant" } } }
                },
                "403": { "$ref": "#/components/responses/Forbidden" },
                "422": { "$ref": "#/components/responses/Unprocessable" },
                "429": { "$ref": "#/components/responses/TooManyRequests" }
            }
        }
    });

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "LILIT",
            "description": SERVICE_MESSAGE,
            "version": env!("CARGO_PKG_VERSION"),
        },
        "paths": {
            "/": {
                "get": {
                    "summary": "Service banner",
                    "security": [],
                    "responses": { "200": { "description": "Banner message" } }
                }
            },
            "/planets": {
                "get": {
                    "summary": "Planetary positions, 4 decimal places",
                    "security": header_or_query,
                    "requestBody": optional_date_time,
                    "responses": positions,
                },
                "post": {
                    "summary": "Planetary positions, 4 decimal places",
                    "security": header_or_query,
                    "requestBody": optional_date_time,
                    "responses": positions,
                }
            },
            "/planetary-positions": {
                "get": {
                    "summary": "Planetary positions, 2 decimal places",
                    "security": header_only,
                    "requestBody": optional_date_time,
                    "responses": positions,
                },
                "post": {
                    "summary": "Planetary positions, 2 decimal places",
                    "security": header_only,
                    "requestBody": optional_date_time,
                    "responses": positions,
                }
            },
            "/ascendant": ascendant
        },
        "components": components(key_name),
    })
}

fn components(key_name: &str) -> Value {
    let detail = json!({ "application/json": { "schema": { "$ref": "#/components/schemas/Detail" } } });
    json!({
        "securitySchemes": {
            "ApiKeyHeader": { "type": "apiKey", "in": "header", "name": key_name },
            "ApiKeyQuery": { "type": "apiKey", "in": "query", "name": key_name }
        },
        "schemas": {
            "Detail": {
                "type": "object",
                "required": ["detail"],
                "properties": { "detail": { "type": "string" } }
            },
            "DateTimeRequest": {
                "type": "object",
                "properties": {
                    "date_time": {
                        "type": "string",
                        "nullable": true,
                        "description": "ISO 8601 date-time; omitted means now (UTC)"
                    }
                }
            },
            "LocationRequest": {
                "type": "object",
                "required": ["date_time", "latitude", "longitude"],
                "properties": {
                    "date_time": { "type": "string" },
                    "latitude": { "type": "number", "minimum": -90, "maximum": 90 },
                    "longitude": { "type": "number", "minimum": -180, "maximum": 180 },
                    "tz_offset": {
                        "type": "string",
                        "nullable": true,
                        "description": "Applied when date_time carries no offset, e.g. +02:00"
                    }
                }
            },
            "Position": {
                "type": "object",
                "properties": {
                    "sign": { "type": "string" },
                    "degrees": { "type": "number" }
                }
            },
            "Positions": {
                "type": "object",
                "additionalProperties": { "$ref": "#/components/schemas/Position" }
            },
            "Ascendant": {
                "type": "object",
                "properties": {
                    "sign": { "type": "string" },
                    "degrees": { "type": "number" },
                    "debug": { "type": "object" }
                }
            }
        },
        "responses": {
            "Forbidden": {
                "description": "Credential missing or invalid",
                "content": detail
            },
            "Unprocessable": {
                "description": "Malformed input",
                "content": detail
            },
            "TooManyRequests": {
                "description": "Request budget exhausted or client temporarily blocked",
                "content": detail
            }
        }
    })
}
