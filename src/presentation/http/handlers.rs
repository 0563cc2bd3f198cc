//! Request Handlers
//!
//! GraphQL execution, the GraphiQL playground, and the health check.

use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::State,
    http::{HeaderMap, Method, Uri},
    response::Html,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::graphql::{RequestContext, RequestMeta};
use crate::startup::AppState;

/// Execute a GraphQL request.
///
/// Builds a fresh [`RequestContext`] from the incoming request metadata and
/// the shared bus, and attaches it to the execution.
pub async fn graphql_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    request: GraphQLRequest,
) -> GraphQLResponse {
    let context = RequestContext::new(
        RequestMeta {
            method,
            uri,
            headers,
        },
        Arc::clone(&state.pubsub),
    );

    state
        .schema
        .execute(request.into_inner().data(context))
        .await
        .into()
}

/// Serve the GraphiQL playground.
pub async fn graphiql() -> Html<String> {
    Html(
        GraphiQLSource::build()
            .endpoint("/")
            .subscription_endpoint("/ws")
            .finish(),
    )
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Basic health check endpoint.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}
