//! # Message Publisher
//!
//! Defines the publishing side of the bus and the in-memory broker.

use crate::message::BusMessage;
use crate::subscriber::{MessageSubscriber, Subscription};
use crate::{BusError, DEFAULT_CHANNEL_CAPACITY};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

/// Trait for publishing messages to the bus.
///
/// Implementations must be safe to share between many concurrent callers.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Publish a message to its topic.
    ///
    /// # Returns
    ///
    /// The number of consumer groups the message was queued for. Zero is not
    /// an error: the broker accepted the message but nobody is listening.
    async fn publish(&self, message: BusMessage) -> Result<usize, BusError>;

    /// Get the total number of messages published.
    fn messages_published(&self) -> u64;
}

/// Queue shared by all members of one consumer group.
pub(crate) struct ConsumerGroup {
    sender: mpsc::Sender<BusMessage>,
    receiver: Arc<Mutex<mpsc::Receiver<BusMessage>>>,
    members: Arc<AtomicUsize>,
}

/// topic -> group id -> queue
pub(crate) type TopicMap = RwLock<HashMap<String, HashMap<String, ConsumerGroup>>>;

/// Leave a consumer group. The last member out removes the group, and the
/// topic once it has no groups left.
pub(crate) fn release_member(
    topics: &Weak<TopicMap>,
    topic: &str,
    group: &str,
    members: &Arc<AtomicUsize>,
) {
    let Some(map) = topics.upgrade() else {
        members.fetch_sub(1, Ordering::Relaxed);
        return;
    };
    // Decremented under the write lock: a concurrent subscribe to this group
    // either finds it alive or creates a fresh one.
    let mut topics = map.write();
    if members.fetch_sub(1, Ordering::Relaxed) != 1 {
        return;
    }
    let Some(groups) = topics.get_mut(topic) else {
        return;
    };
    let is_ours = groups
        .get(group)
        .is_some_and(|g| Arc::ptr_eq(&g.members, members));
    if is_ours {
        groups.remove(group);
        debug!(topic = topic, group = group, "Consumer group removed (no members left)");
    }
    if groups.is_empty() {
        topics.remove(topic);
    }
}

/// In-memory implementation of the broker.
///
/// Every topic holds a set of consumer groups. A published message is queued
/// once per group; members of a group pull from the same queue, so each
/// message is handled by exactly one member. Suitable for single-process
/// deployments and tests; distributed deployments plug a real broker in
/// behind `MessagePublisher`.
pub struct InMemoryBroker {
    /// Shared with subscriptions so the last member can remove its group.
    topics: Arc<TopicMap>,

    /// Set once by `shutdown`.
    closed: AtomicBool,

    /// Total messages published.
    messages_published: AtomicU64,

    /// Queue capacity per consumer group.
    capacity: usize,
}

impl InMemoryBroker {
    /// Create a broker with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a broker with the given per-group capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            topics: Arc::new(RwLock::new(HashMap::new())),
            closed: AtomicBool::new(false),
            messages_published: AtomicU64::new(0),
            capacity: capacity.max(1),
        }
    }

    /// Join consumer group `group` on `topic`.
    pub fn subscribe(&self, topic: &str, group: &str) -> Result<Subscription, BusError> {
        if self.is_closed() {
            return Err(BusError::Closed);
        }
        if topic.trim().is_empty() {
            return Err(BusError::InvalidTopic("topic name cannot be empty".into()));
        }

        let mut topics = self.topics.write();
        let groups = topics.entry(topic.to_string()).or_default();
        let consumer_group = groups.entry(group.to_string()).or_insert_with(|| {
            let (sender, receiver) = mpsc::channel(self.capacity);
            ConsumerGroup {
                sender,
                receiver: Arc::new(Mutex::new(receiver)),
                members: Arc::new(AtomicUsize::new(0)),
            }
        });
        consumer_group.members.fetch_add(1, Ordering::Relaxed);

        debug!(topic = topic, group = group, "New subscription created");

        Ok(Subscription::new(
            topic.to_string(),
            group.to_string(),
            Arc::clone(&consumer_group.receiver),
            Arc::clone(&consumer_group.members),
            Arc::downgrade(&self.topics),
        ))
    }

    /// Close the broker.
    ///
    /// Publishing fails from now on; subscriptions drain what is queued and
    /// then end.
    pub fn shutdown(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.topics.write().clear();
            info!("Broker shut down");
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of consumer groups on a topic.
    #[must_use]
    pub fn group_count(&self, topic: &str) -> usize {
        self.topics.read().get(topic).map_or(0, HashMap::len)
    }

    /// Number of live subscriptions across every topic and group.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.topics
            .read()
            .values()
            .flat_map(HashMap::values)
            .map(|group| group.members.load(Ordering::Relaxed))
            .sum()
    }

    /// Get the per-group capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageSubscriber for InMemoryBroker {
    type Stream = Subscription;

    fn subscribe(&self, topic: &str, group: &str) -> Result<Subscription, BusError> {
        InMemoryBroker::subscribe(self, topic, group)
    }
}

#[async_trait]
impl MessagePublisher for InMemoryBroker {
    async fn publish(&self, message: BusMessage) -> Result<usize, BusError> {
        if self.is_closed() {
            return Err(BusError::Closed);
        }
        if message.topic.trim().is_empty() {
            return Err(BusError::InvalidTopic("topic name cannot be empty".into()));
        }

        self.messages_published.fetch_add(1, Ordering::Relaxed);

        let topics = self.topics.read();
        let Some(groups) = topics.get(&message.topic) else {
            warn!(
                topic = %message.topic,
                source = message.source().unwrap_or("-"),
                "Message dropped (no subscribers)"
            );
            return Ok(0);
        };

        let mut delivered = 0;
        for (group, consumer_group) in groups {
            match consumer_group.sender.try_send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(
                        topic = %message.topic,
                        group = %group,
                        error = %e,
                        "Consumer group queue rejected message"
                    );
                }
            }
        }

        debug!(
            topic = %message.topic,
            source = message.source().unwrap_or("-"),
            groups = delivered,
            "Message published"
        );

        Ok(delivered)
    }

    fn messages_published(&self) -> u64 {
        self.messages_published.load(Ordering::Relaxed)
    }
}
