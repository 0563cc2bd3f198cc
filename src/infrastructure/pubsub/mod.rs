//! In-Process Publish/Subscribe Bus
//!
//! Topic-keyed fan-out used by GraphQL subscriptions. Publishers send JSON
//! payloads to a named topic; every live subscriber of that topic receives
//! its own copy. Topics are created on first use by either side.

use dashmap::DashMap;
use futures::Stream;
use serde_json::Value;
use tokio::sync::broadcast;

/// Buffered events per topic before slow subscribers start missing messages.
const TOPIC_CAPACITY: usize = 256;

/// Topic-keyed publish/subscribe bus.
///
/// One instance is shared across the whole process; cloning the `Arc` that
/// wraps it is the intended way to hand it to request contexts.
#[derive(Debug)]
pub struct PubSub {
    topics: DashMap<String, broadcast::Sender<Value>>,
}

impl PubSub {
    pub fn new() -> Self {
        Self {
            topics: DashMap::new(),
        }
    }

    /// Publish a payload to a topic.
    ///
    /// Returns the number of subscribers that received the payload. A topic
    /// with no subscribers swallows the payload and returns zero; publishing
    /// is never an error.
    pub fn publish(&self, topic: &str, payload: Value) -> usize {
        let sender = self.sender(topic);
        let delivered = sender.send(payload).unwrap_or(0);
        tracing::debug!(topic, delivered, "Event published");
        delivered
    }

    /// Subscribe to a topic.
    ///
    /// The returned stream yields every payload published after this call.
    /// A subscriber that falls more than [`TOPIC_CAPACITY`] events behind
    /// skips the missed events and continues with the most recent ones.
    pub fn subscribe(&self, topic: &str) -> impl Stream<Item = Value> {
        let receiver = self.sender(topic).subscribe();
        futures::stream::unfold(receiver, |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(payload) => return Some((payload, receiver)),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "Subscriber lagged, events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        })
    }

    /// Number of topics that have been touched by a publish or subscribe.
    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    /// Number of live subscribers on a topic.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .get(topic)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    fn sender(&self, topic: &str) -> broadcast::Sender<Value> {
        if let Some(sender) = self.topics.get(topic) {
            return sender.clone();
        }
        self.topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .clone()
    }
}

impl Default for PubSub {
    fn default() -> Self {
        Self::new()
    }
}
