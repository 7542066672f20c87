//! Axum handlers for the generic resource routes

use crate::core::credential::ApiKeyAuthenticator;
use crate::core::error::{ApiError, ApiResult};
use crate::core::query::QueryParams;
use crate::server::dispatcher::{Caller, Dispatcher};
use crate::server::telemetry::{ErrorReporter, request_span};
use axum::Json;
use axum::body::Bytes;
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use std::any::Any;
use std::sync::Arc;
use tracing::Instrument;

/// Shared state of the resource routes
#[derive(Clone)]
pub struct ApiState {
    pub dispatcher: Arc<Dispatcher>,
    pub authenticator: ApiKeyAuthenticator,
    pub reporter: Arc<dyn ErrorReporter>,
}

impl ApiState {
    /// Render a dispatcher result, reporting server-side faults
    pub fn render(&self, result: ApiResult<Value>) -> Response {
        match result {
            Ok(body) => (StatusCode::OK, Json(body)).into_response(),
            Err(err) => self.reject(err),
        }
    }

    pub fn reject(&self, err: ApiError) -> Response {
        if err.is_internal() {
            self.reporter.report(&err);
        }
        err.into_response()
    }
}

impl FromRequestParts<ApiState> for Caller {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &ApiState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        state
            .authenticator
            .authenticate(header)
            .await
            .map(Caller::from)
            .map_err(|err| state.reject(err))
    }
}

/// Query string extractor whose rejections render in the error envelope
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Path extractor whose rejections render in the error envelope
#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Response for a panic anywhere below the router: the generic 500 envelope
pub fn panic_responder(
    reporter: Arc<dyn ErrorReporter>,
) -> impl Fn(Box<dyn Any + Send + 'static>) -> Response + Clone + Send + Sync + 'static {
    move |panic: Box<dyn Any + Send + 'static>| {
        let detail = panic
            .downcast_ref::<String>()
            .cloned()
            .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
            .unwrap_or_else(|| "unknown panic payload".to_string());
        let err = ApiError::Internal(format!("request panicked: {}", detail));
        reporter.report(&err);
        err.into_response()
    }
}

fn parse_body(body: &Bytes) -> ApiResult<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(json!({}));
    }
    Ok(serde_json::from_slice(body)?)
}

/// GET /{resource}
pub async fn list_resources(
    State(state): State<ApiState>,
    caller: Caller,
    ApiPath(resource): ApiPath<String>,
    ApiQuery(params): ApiQuery<QueryParams>,
) -> Response {
    let span = request_span(&caller, &resource, "index");
    async {
        let result = state.dispatcher.list(&caller, &resource, &params).await;
        state.render(result)
    }
    .instrument(span)
    .await
}

/// GET /{resource}/{id}
pub async fn show_resource(
    State(state): State<ApiState>,
    caller: Caller,
    ApiPath((resource, id)): ApiPath<(String, String)>,
    ApiQuery(params): ApiQuery<QueryParams>,
) -> Response {
    let span = request_span(&caller, &resource, "show");
    async {
        let result = state.dispatcher.show(&caller, &resource, &id, &params).await;
        state.render(result)
    }
    .instrument(span)
    .await
}

/// POST /{resource}
pub async fn create_resource(
    State(state): State<ApiState>,
    caller: Caller,
    ApiPath(resource): ApiPath<String>,
    body: Bytes,
) -> Response {
    let span = request_span(&caller, &resource, "create");
    async {
        let result = match parse_body(&body) {
            Ok(body) => state.dispatcher.create(&caller, &resource, body).await,
            Err(err) => Err(err),
        };
        state.render(result)
    }
    .instrument(span)
    .await
}

/// PUT|PATCH /{resource}/{id}
pub async fn update_resource(
    State(state): State<ApiState>,
    caller: Caller,
    ApiPath((resource, id)): ApiPath<(String, String)>,
    body: Bytes,
) -> Response {
    let span = request_span(&caller, &resource, "update");
    async {
        let result = match parse_body(&body) {
            Ok(body) => state.dispatcher.update(&caller, &resource, &id, body).await,
            Err(err) => Err(err),
        };
        state.render(result)
    }
    .instrument(span)
    .await
}

/// DELETE /{resource}/{id}
pub async fn destroy_resource(
    State(state): State<ApiState>,
    caller: Caller,
    ApiPath((resource, id)): ApiPath<(String, String)>,
) -> Response {
    let span = request_span(&caller, &resource, "destroy");
    async {
        let result = state.dispatcher.destroy(&caller, &resource, &id).await;
        state.render(result)
    }
    .instrument(span)
    .await
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "data": "ok" }))
}

/// Any unmatched route
pub async fn url_not_found() -> Response {
    ApiError::url_not_found().into_response()
}
