//! Per-request GraphQL context.

use axum::http::{HeaderMap, Method, Uri};
use std::sync::Arc;

use crate::infrastructure::pubsub::PubSub;

/// Metadata captured from the incoming HTTP request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestMeta {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
}

/// Context attached to each GraphQL execution.
///
/// Carries the raw request metadata and a shared handle to the
/// publish/subscribe bus. The bus is the process-wide instance; the factory
/// never copies it.
pub struct RequestContext {
    pub request: RequestMeta,
    pub pubsub: Arc<PubSub>,
}

impl RequestContext {
    pub fn new(request: RequestMeta, pubsub: Arc<PubSub>) -> Self {
        Self { request, pubsub }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_meta() -> RequestMeta {
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", "abc-123".parse().unwrap());
        RequestMeta {
            method: Method::POST,
            uri: "/graphql?op=test".parse().unwrap(),
            headers,
        }
    }

    #[test]
    fn factory_shares_the_bus_by_reference() {
        let bus = Arc::new(PubSub::new());

        let context = RequestContext::new(sample_meta(), Arc::clone(&bus));

        assert!(Arc::ptr_eq(&context.pubsub, &bus));
    }

    #[test]
    fn factory_leaves_request_metadata_untouched() {
        let bus = Arc::new(PubSub::new());
        let meta = sample_meta();

        let context = RequestContext::new(meta.clone(), bus);

        assert_eq!(context.request, meta);
    }
}
