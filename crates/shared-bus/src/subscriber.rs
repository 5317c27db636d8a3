//! # Subscriptions
//!
//! Defines the consuming side of the bus.

use crate::message::BusMessage;
use crate::publisher::{release_member, TopicMap};
use crate::BusError;
use async_trait::async_trait;
use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Weak};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

/// Anything a consumer loop can pull messages from.
///
/// Lets dispatcher and server loops run against a real broker client as well
/// as the in-memory `Subscription`.
#[async_trait]
pub trait MessageStream: Send {
    /// Wait for the next message. `None` means the stream has ended.
    async fn next_message(&mut self) -> Option<BusMessage>;
}

/// Anything that can hand out group memberships on a topic.
pub trait MessageSubscriber: Send + Sync {
    /// The stream type a subscription yields.
    type Stream: MessageStream + 'static;

    /// Join consumer group `group` on `topic`.
    fn subscribe(&self, topic: &str, group: &str) -> Result<Self::Stream, BusError>;
}

/// A membership in one consumer group of one topic.
///
/// When dropped, the membership is released. The last member to leave takes
/// the group and anything still queued for it with it.
pub struct Subscription {
    topic: String,
    group: String,
    /// Queue shared with the other members of the group.
    receiver: Arc<Mutex<mpsc::Receiver<BusMessage>>>,
    /// Live member count of the group.
    members: Arc<AtomicUsize>,
    /// Owning broker's topic map.
    topics: Weak<TopicMap>,
}

impl Subscription {
    pub(crate) fn new(
        topic: String,
        group: String,
        receiver: Arc<Mutex<mpsc::Receiver<BusMessage>>>,
        members: Arc<AtomicUsize>,
        topics: Weak<TopicMap>,
    ) -> Self {
        Self {
            topic,
            group,
            receiver,
            members,
            topics,
        }
    }

    /// Receive the next message for this group.
    ///
    /// # Returns
    ///
    /// - `Some(message)` - The next message
    /// - `None` - The broker was shut down and the queue is drained
    pub async fn recv(&mut self) -> Option<BusMessage> {
        let mut receiver = self.receiver.lock().await;
        receiver.recv().await
    }

    /// Try to receive the next message without waiting.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(message))` - A message was available
    /// - `Ok(None)` - Nothing queued, or another member is receiving
    /// - `Err(BusError::Closed)` - The broker was shut down and the queue is drained
    pub fn try_recv(&mut self) -> Result<Option<BusMessage>, BusError> {
        let Ok(mut receiver) = self.receiver.try_lock() else {
            return Ok(None);
        };
        match receiver.try_recv() {
            Ok(message) => Ok(Some(message)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(BusError::Closed),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn group(&self) -> &str {
        &self.group
    }
}

#[async_trait]
impl MessageStream for Subscription {
    async fn next_message(&mut self) -> Option<BusMessage> {
        self.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        release_member(&self.topics, &self.topic, &self.group, &self.members);
        debug!(topic = %self.topic, group = %self.group, "Subscription dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::{InMemoryBroker, MessagePublisher};
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_subscription_recv() {
        let broker = InMemoryBroker::new();
        let mut sub = broker.subscribe("media", "media-service").unwrap();

        broker.publish(BusMessage::new("media", "payload")).await.unwrap();

        let received = timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout")
            .expect("message");
        assert_eq!(received.body.as_ref(), b"payload");
        assert_eq!(sub.topic(), "media");
        assert_eq!(sub.group(), "media-service");
    }

    #[tokio::test]
    async fn test_try_recv_empty() {
        let broker = InMemoryBroker::new();
        let mut sub = broker.subscribe("media", "g").unwrap();

        assert!(matches!(sub.try_recv(), Ok(None)));
    }

    #[tokio::test]
    async fn test_messages_queue_while_no_member_receives() {
        let broker = InMemoryBroker::new();
        let mut sub = broker.subscribe("media", "g").unwrap();

        broker.publish(BusMessage::new("media", "1")).await.unwrap();
        broker.publish(BusMessage::new("media", "2")).await.unwrap();

        assert_eq!(sub.next_message().await.unwrap().body.as_ref(), b"1");
        assert_eq!(sub.next_message().await.unwrap().body.as_ref(), b"2");
    }

    #[tokio::test]
    async fn test_try_recv_after_shutdown() {
        let broker = InMemoryBroker::new();
        let mut sub = broker.subscribe("media", "g").unwrap();
        broker.shutdown();

        assert_eq!(sub.try_recv(), Err(BusError::Closed));
    }
}
