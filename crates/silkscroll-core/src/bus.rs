#![forbid(unsafe_code)]

//! Typed broadcast of the eased scroll value.
//!
//! An explicit publish/subscribe interface in place of a loosely-typed DOM
//! custom event: any number of independent consumers subscribe, every render
//! step publishes one [`ScrollSignal`] per live subscription, and consumers
//! drain their bounded queues explicitly.
//!
//! Queues drop oldest-first when full and count what they dropped, so a slow
//! consumer degrades by losing history, never by stalling the render loop or
//! growing without bound.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default per-subscription buffer length.
pub const DEFAULT_SUBSCRIPTION_BUFFER: usize = 512;
/// Hard cap on a requested buffer length.
pub const MAX_SUBSCRIPTION_BUFFER: usize = 8192;
/// Hard cap on concurrently live subscriptions.
pub const MAX_SUBSCRIPTIONS: usize = 256;

/// The broadcast payload: the eased scroll offset for one render step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollSignal {
    pub scroll: f64,
}

/// One queued broadcast record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalRecord {
    /// Monotonically increasing publish sequence, shared across subscribers.
    pub seq: u64,
    /// The payload.
    #[serde(flatten)]
    pub signal: ScrollSignal,
    /// Queue depth after this record was enqueued.
    pub queue_depth_after: u32,
    /// Cumulative records this subscription has dropped to stay bounded.
    pub dropped_total: u64,
}

/// Queue depth and throughput counters for host observability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubscriptionState {
    pub id: u32,
    pub queue_depth: usize,
    pub max_buffered: usize,
    pub emitted_total: u64,
    pub drained_total: u64,
    pub dropped_total: u64,
}

/// Subscription bookkeeping errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The live-subscription cap was reached.
    SubscriptionLimit,
    /// No subscription with this id exists.
    UnknownSubscription(u32),
}

impl core::fmt::Display for BusError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::SubscriptionLimit => write!(
                f,
                "subscription limit reached (max {MAX_SUBSCRIPTIONS} active subscriptions)"
            ),
            Self::UnknownSubscription(id) => write!(f, "unknown subscription id {id}"),
        }
    }
}

impl std::error::Error for BusError {}

#[derive(Debug, Clone)]
struct Subscription {
    max_buffered: usize,
    queue: Vec<SignalRecord>,
    emitted_total: u64,
    drained_total: u64,
    dropped_total: u64,
}

impl Subscription {
    fn push_bounded(&mut self, seq: u64, signal: ScrollSignal) {
        if self.queue.len() >= self.max_buffered {
            let overflow = self.queue.len() - self.max_buffered + 1;
            self.queue.drain(..overflow);
            self.dropped_total += overflow as u64;
        }
        self.emitted_total += 1;
        let record = SignalRecord {
            seq,
            signal,
            queue_depth_after: (self.queue.len() + 1) as u32,
            dropped_total: self.dropped_total,
        };
        self.queue.push(record);
    }
}

/// The scroll broadcast fan-out.
#[derive(Debug, Clone, Default)]
pub struct ScrollBus {
    subscriptions: HashMap<u32, Subscription>,
    next_id: u32,
    next_seq: u64,
}

impl ScrollBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscriptions: HashMap::new(),
            next_id: 1,
            next_seq: 1,
        }
    }

    /// Register a subscriber with a bounded buffer.
    ///
    /// The requested length is clamped into `[1, MAX_SUBSCRIPTION_BUFFER]`.
    /// Returns the subscription id used for draining.
    pub fn subscribe(&mut self, max_buffered: usize) -> Result<u32, BusError> {
        if self.subscriptions.len() >= MAX_SUBSCRIPTIONS {
            return Err(BusError::SubscriptionLimit);
        }
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        self.subscriptions.insert(
            id,
            Subscription {
                max_buffered: max_buffered.clamp(1, MAX_SUBSCRIPTION_BUFFER),
                queue: Vec::new(),
                emitted_total: 0,
                drained_total: 0,
                dropped_total: 0,
            },
        );
        debug!(
            target: "silkscroll_core::bus",
            subscription_id = id,
            active_subscriptions = self.subscriptions.len(),
            "subscription created"
        );
        Ok(id)
    }

    /// Dispose a subscription and release its queued records.
    pub fn unsubscribe(&mut self, id: u32) -> bool {
        let removed = self.subscriptions.remove(&id);
        if let Some(subscription) = &removed {
            debug!(
                target: "silkscroll_core::bus",
                subscription_id = id,
                emitted_total = subscription.emitted_total,
                drained_total = subscription.drained_total,
                dropped_total = subscription.dropped_total,
                "subscription closed"
            );
        }
        removed.is_some()
    }

    /// Broadcast one signal to every live subscription.
    ///
    /// Called at most once per render step, after the step's state update.
    pub fn publish(&mut self, signal: ScrollSignal) {
        let seq = self.next_seq;
        self.next_seq += 1;
        for subscription in self.subscriptions.values_mut() {
            subscription.push_bounded(seq, signal);
        }
    }

    /// Drain a subscription's queued records, oldest first.
    pub fn drain(&mut self, id: u32) -> Result<Vec<SignalRecord>, BusError> {
        let subscription = self
            .subscriptions
            .get_mut(&id)
            .ok_or(BusError::UnknownSubscription(id))?;
        let drained: Vec<SignalRecord> = subscription.queue.drain(..).collect();
        subscription.drained_total += drained.len() as u64;
        Ok(drained)
    }

    /// Snapshot a subscription's counters; `None` for unknown ids.
    #[must_use]
    pub fn state(&self, id: u32) -> Option<SubscriptionState> {
        self.subscriptions.get(&id).map(|s| SubscriptionState {
            id,
            queue_depth: s.queue.len(),
            max_buffered: s.max_buffered,
            emitted_total: s.emitted_total,
            drained_total: s.drained_total,
            dropped_total: s.dropped_total,
        })
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- Fan-out --

    #[test]
    fn publish_reaches_every_subscriber_once() {
        let mut bus = ScrollBus::new();
        let a = bus.subscribe(DEFAULT_SUBSCRIPTION_BUFFER).unwrap();
        let b = bus.subscribe(DEFAULT_SUBSCRIPTION_BUFFER).unwrap();
        bus.publish(ScrollSignal { scroll: 120.0 });

        let drained_a = bus.drain(a).unwrap();
        let drained_b = bus.drain(b).unwrap();
        assert_eq!(drained_a.len(), 1);
        assert_eq!(drained_b.len(), 1);
        assert_eq!(drained_a[0].signal.scroll, 120.0);
        assert_eq!(drained_a[0].seq, drained_b[0].seq);
    }

    #[test]
    fn sequence_numbers_are_monotonic() {
        let mut bus = ScrollBus::new();
        let id = bus.subscribe(16).unwrap();
        for i in 0..5 {
            bus.publish(ScrollSignal {
                scroll: f64::from(i),
            });
        }
        let records = bus.drain(id).unwrap();
        let seqs: Vec<u64> = records.iter().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn drain_empties_queue() {
        let mut bus = ScrollBus::new();
        let id = bus.subscribe(16).unwrap();
        bus.publish(ScrollSignal { scroll: 1.0 });
        assert_eq!(bus.drain(id).unwrap().len(), 1);
        assert!(bus.drain(id).unwrap().is_empty());
    }

    // -- Bounds --

    #[test]
    fn full_queue_drops_oldest_and_counts() {
        let mut bus = ScrollBus::new();
        let id = bus.subscribe(2).unwrap();
        for i in 0..5 {
            bus.publish(ScrollSignal {
                scroll: f64::from(i),
            });
        }
        let records = bus.drain(id).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].signal.scroll, 3.0);
        assert_eq!(records[1].signal.scroll, 4.0);
        assert_eq!(records[1].dropped_total, 3);

        let state = bus.state(id).unwrap();
        assert_eq!(state.emitted_total, 5);
        assert_eq!(state.drained_total, 2);
        assert_eq!(state.dropped_total, 3);
    }

    #[test]
    fn buffer_request_is_clamped() {
        let mut bus = ScrollBus::new();
        let id = bus.subscribe(0).unwrap();
        assert_eq!(bus.state(id).unwrap().max_buffered, 1);
        let id = bus.subscribe(usize::MAX).unwrap();
        assert_eq!(bus.state(id).unwrap().max_buffered, MAX_SUBSCRIPTION_BUFFER);
    }

    #[test]
    fn subscription_cap_is_enforced() {
        let mut bus = ScrollBus::new();
        for _ in 0..MAX_SUBSCRIPTIONS {
            bus.subscribe(1).unwrap();
        }
        assert_eq!(bus.subscribe(1), Err(BusError::SubscriptionLimit));
    }

    // -- Lifecycle --

    #[test]
    fn unsubscribe_releases_slot() {
        let mut bus = ScrollBus::new();
        let id = bus.subscribe(1).unwrap();
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert_eq!(bus.drain(id), Err(BusError::UnknownSubscription(id)));
        assert!(bus.state(id).is_none());
    }

    // -- Serialization --

    #[test]
    fn record_json_shape_is_flat() {
        let record = SignalRecord {
            seq: 7,
            signal: ScrollSignal { scroll: 42.5 },
            queue_depth_after: 1,
            dropped_total: 0,
        };
        let json = serde_json::to_value(record).unwrap();
        assert_eq!(json["seq"], 7);
        assert_eq!(json["scroll"], 42.5);
        assert_eq!(json["queue_depth_after"], 1);
    }
}
