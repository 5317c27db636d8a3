//! Correlation Registry - the substrate of every outstanding call.
//!
//! Maps correlation ids to the single-use slot a waiting caller listens on.
//!
//! Flow:
//! 1. The client calls `register()` and gets an id plus a oneshot receiver
//! 2. The client publishes the request carrying the id
//! 3. The reply dispatcher calls `resolve()` when the reply arrives
//! 4. If the client's deadline passes first it calls `expire()`
//!
//! Removal from the map is the single point of truth: whichever of
//! `resolve`, `expire` or `cancel` removes the entry wins, the others see
//! nothing and return `false`.

use crate::error::RegistryError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;
use shared_types::{CorrelationId, Response};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, warn};

/// What a pending call is resolved with.
pub type Reply = Response<Value>;

/// One outstanding call.
struct PendingCall {
    /// Single-resolution slot
    sender: oneshot::Sender<Reply>,
    /// When the call was registered
    created_at: Instant,
    /// Past this point the entry is eligible for sweeping
    deadline: Instant,
    /// Operation name (for logging)
    operation: String,
}

/// Lifetime counters for the registry.
#[derive(Debug, Default)]
pub struct RegistryStats {
    /// Calls registered
    pub registered: AtomicU64,
    /// Calls resolved by a reply
    pub resolved: AtomicU64,
    /// Calls removed by timeout (client expiry or sweep)
    pub expired: AtomicU64,
    /// Calls removed by caller cancellation
    pub cancelled: AtomicU64,
    /// Replies that found no pending call
    pub discarded: AtomicU64,
}

/// Concurrent table of outstanding calls.
///
/// Constructed once per process and shared by `Arc` between the client and
/// every reply dispatcher.
#[derive(Default)]
pub struct CorrelationRegistry {
    pending: DashMap<CorrelationId, PendingCall>,
    stats: RegistryStats,
}

impl CorrelationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an outstanding call under a fresh correlation id.
    ///
    /// Returns the id and the receiver its reply will be delivered on.
    pub fn register(
        &self,
        operation: &str,
        timeout: Duration,
    ) -> (CorrelationId, oneshot::Receiver<Reply>) {
        loop {
            let correlation_id = CorrelationId::new();
            if let Ok(rx) = self.register_with_id(correlation_id, operation, timeout) {
                return (correlation_id, rx);
            }
        }
    }

    /// Register an outstanding call under a caller-chosen id.
    ///
    /// Fails if the id is already pending.
    pub fn register_with_id(
        &self,
        correlation_id: CorrelationId,
        operation: &str,
        timeout: Duration,
    ) -> Result<oneshot::Receiver<Reply>, RegistryError> {
        let slot = match self.pending.entry(correlation_id) {
            Entry::Occupied(_) => {
                return Err(RegistryError::DuplicateCorrelationId(correlation_id));
            }
            Entry::Vacant(slot) => slot,
        };

        let (tx, rx) = oneshot::channel();
        let now = Instant::now();
        slot.insert(PendingCall {
            sender: tx,
            created_at: now,
            deadline: now + timeout,
            operation: operation.to_string(),
        });
        self.stats.registered.fetch_add(1, Ordering::Relaxed);

        debug!(
            correlation_id = %correlation_id,
            operation = operation,
            timeout_ms = timeout.as_millis(),
            "Registered pending call"
        );

        Ok(rx)
    }

    /// Deliver a reply to the call waiting on `correlation_id`.
    ///
    /// Returns false when nothing was waiting: a late reply, an unknown id, or
    /// a caller that already went away. That is a normal outcome.
    pub fn resolve(&self, correlation_id: CorrelationId, reply: Reply) -> bool {
        let Some((_, call)) = self.pending.remove(&correlation_id) else {
            self.stats.discarded.fetch_add(1, Ordering::Relaxed);
            debug!(
                correlation_id = %correlation_id,
                status = %reply.status(),
                "Reply for unknown or expired correlation id discarded"
            );
            return false;
        };

        let elapsed = call.created_at.elapsed();
        match call.sender.send(reply) {
            Ok(()) => {
                self.stats.resolved.fetch_add(1, Ordering::Relaxed);
                debug!(
                    correlation_id = %correlation_id,
                    operation = call.operation,
                    response_time_ms = elapsed.as_millis(),
                    "Resolved pending call"
                );
                true
            }
            Err(_) => {
                // Receiver dropped without cancelling
                self.stats.discarded.fetch_add(1, Ordering::Relaxed);
                debug!(
                    correlation_id = %correlation_id,
                    operation = call.operation,
                    "Pending call receiver dropped"
                );
                false
            }
        }
    }

    /// Give up on a call whose deadline passed.
    ///
    /// Returns true only if a live entry was removed. False means a reply won
    /// the race and is already on its way to the receiver.
    pub fn expire(&self, correlation_id: &CorrelationId) -> bool {
        let Some((_, call)) = self.pending.remove(correlation_id) else {
            return false;
        };
        self.stats.expired.fetch_add(1, Ordering::Relaxed);
        warn!(
            correlation_id = %correlation_id,
            operation = call.operation,
            elapsed_ms = call.created_at.elapsed().as_millis(),
            "Pending call expired"
        );
        true
    }

    /// Remove a call whose caller no longer wants the reply.
    pub fn cancel(&self, correlation_id: &CorrelationId) -> bool {
        if self.pending.remove(correlation_id).is_some() {
            self.stats.cancelled.fetch_add(1, Ordering::Relaxed);
            debug!(correlation_id = %correlation_id, "Pending call cancelled");
            true
        } else {
            false
        }
    }

    /// Remove entries past their deadline.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;

        self.pending.retain(|id, call| {
            if now < call.deadline {
                return true;
            }
            warn!(
                correlation_id = %id,
                operation = call.operation,
                elapsed_ms = now.duration_since(call.created_at).as_millis(),
                "Sweeping expired pending call"
            );
            removed += 1;
            false
        });

        if removed > 0 {
            self.stats
                .expired
                .fetch_add(removed as u64, Ordering::Relaxed);
        }
        removed
    }

    /// Get number of currently pending calls
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, correlation_id: &CorrelationId) -> bool {
        self.pending.contains_key(correlation_id)
    }

    pub fn stats(&self) -> &RegistryStats {
        &self.stats
    }
}

/// Cancels its call on drop unless disarmed.
///
/// Held by the client across the wait, so a caller future dropped mid-call
/// (an aborted HTTP request, a `select!` that lost) does not leave its entry
/// behind.
pub struct PendingCallGuard<'a> {
    registry: &'a CorrelationRegistry,
    correlation_id: CorrelationId,
    armed: bool,
}

impl<'a> PendingCallGuard<'a> {
    pub fn new(registry: &'a CorrelationRegistry, correlation_id: CorrelationId) -> Self {
        Self {
            registry,
            correlation_id,
            armed: true,
        }
    }

    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    /// The call settled; nothing to clean up.
    pub fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingCallGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.registry.cancel(&self.correlation_id);
        }
    }
}

/// Background task sweeping calls whose callers vanished without cleanup.
pub async fn cleanup_task(registry: Arc<CorrelationRegistry>, interval: Duration) {
    let mut cleanup_interval = tokio::time::interval(interval);
    cleanup_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        cleanup_interval.tick().await;
        let removed = registry.sweep_expired();
        if removed > 0 {
            debug!(removed = removed, "Cleaned up expired pending calls");
        }
    }
}
