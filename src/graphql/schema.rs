//! Schema Roots
//!
//! The shipped roots are a composition seam: a service info query, a topic
//! publish mutation, and a topic event subscription. Domain resolvers mount
//! alongside these without touching the bootstrap path.

use async_graphql::{
    Context, Json, Object, Result as GqlResult, Schema, SimpleObject, Subscription,
};
use futures::{Stream, StreamExt};
use serde_json::Value;
use std::sync::Arc;

use super::context::RequestContext;
use crate::infrastructure::cache::RedisCache;
use crate::infrastructure::pubsub::PubSub;

pub type AppSchema = Schema<QueryRoot, MutationRoot, SubscriptionRoot>;

/// Build the schema with the shared bus and cache attached as schema data.
pub fn build_schema(pubsub: Arc<PubSub>, cache: RedisCache) -> AppSchema {
    Schema::build(QueryRoot, MutationRoot, SubscriptionRoot)
        .data(pubsub)
        .data(cache)
        .finish()
}

#[derive(Debug, SimpleObject)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub status: String,
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Name, version, and status of the running service.
    async fn service(&self) -> ServiceInfo {
        ServiceInfo {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            status: "running".to_string(),
        }
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Publish a payload to a topic.
    ///
    /// Returns the number of live subscribers that received the payload.
    async fn publish(
        &self,
        ctx: &Context<'_>,
        topic: String,
        payload: Json<Value>,
    ) -> GqlResult<u64> {
        let request = ctx.data::<RequestContext>()?;
        Ok(request.pubsub.publish(&topic, payload.0) as u64)
    }
}

pub struct SubscriptionRoot;

#[Subscription]
impl SubscriptionRoot {
    /// Stream every payload published to a topic after subscribing.
    async fn events(
        &self,
        ctx: &Context<'_>,
        topic: String,
    ) -> async_graphql::Result<impl Stream<Item = Json<Value>>> {
        let bus = ctx.data::<Arc<PubSub>>()?;
        Ok(bus.subscribe(&topic).map(Json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphql::RequestMeta;
    use async_graphql::Request;
    use axum::http::{HeaderMap, Method};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;

    fn test_schema(pubsub: Arc<PubSub>) -> AppSchema {
        let cache = RedisCache::connect("redis://127.0.0.1:6379").unwrap();
        build_schema(pubsub, cache)
    }

    fn request_context(pubsub: Arc<PubSub>) -> RequestContext {
        let meta = RequestMeta {
            method: Method::POST,
            uri: "/".parse().unwrap(),
            headers: HeaderMap::new(),
        };
        RequestContext::new(meta, pubsub)
    }

    #[tokio::test]
    async fn service_query_reports_name_and_version() {
        let schema = test_schema(Arc::new(PubSub::new()));

        let response = schema
            .execute("{ service { name version status } }")
            .await;

        assert!(response.errors.is_empty());
        assert_eq!(
            response.data.into_json().unwrap(),
            json!({
                "service": {
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION"),
                    "status": "running",
                }
            })
        );
    }

    #[tokio::test]
    async fn publish_mutation_reports_subscriber_count() {
        let bus = Arc::new(PubSub::new());
        let schema = test_schema(Arc::clone(&bus));
        let _subscriber = Box::pin(bus.subscribe("events"));

        let request = Request::new(r#"mutation { publish(topic: "events", payload: 42) }"#)
            .data(request_context(Arc::clone(&bus)));
        let response = schema.execute(request).await;

        assert!(response.errors.is_empty());
        assert_eq!(
            response.data.into_json().unwrap(),
            json!({ "publish": 1 })
        );
    }

    #[tokio::test]
    async fn publish_without_request_context_is_an_error() {
        let schema = test_schema(Arc::new(PubSub::new()));

        let response = schema
            .execute(r#"mutation { publish(topic: "events", payload: 42) }"#)
            .await;

        assert!(!response.errors.is_empty());
    }

    #[tokio::test]
    async fn events_subscription_streams_published_payloads() {
        let bus = Arc::new(PubSub::new());
        let schema = test_schema(Arc::clone(&bus));

        let mut stream =
            schema.execute_stream(r#"subscription { events(topic: "events") }"#);

        // The subscription attaches on first poll; publish until it is seen.
        let publisher = tokio::spawn(async move {
            loop {
                bus.publish("events", json!({ "n": 1 }));
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        });

        let response = stream.next().await.expect("one event");
        publisher.abort();

        assert!(response.errors.is_empty());
        assert_eq!(
            response.data.into_json().unwrap(),
            json!({ "events": { "n": 1 } })
        );
    }
}
