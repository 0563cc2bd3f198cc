//! Route Configuration
//!
//! Configures the GraphQL endpoint, the subscription websocket, and the
//! health check.

use async_graphql_axum::GraphQLSubscription;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use crate::config::PRODUCTION_ENV;
use crate::startup::AppState;

/// Create the main router.
///
/// The GraphiQL playground is mounted on `GET /` only outside production;
/// the execute endpoint and the websocket route are always present.
pub fn create_router(state: AppState) -> Router {
    let mut graphql_route = post(handlers::graphql_handler);
    if state.environment != PRODUCTION_ENV {
        graphql_route = graphql_route.get(handlers::graphiql);
    }

    Router::new()
        .route("/", graphql_route)
        .route_service("/ws", GraphQLSubscription::new(state.schema.clone()))
        .route("/health", get(handlers::health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
