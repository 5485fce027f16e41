//! Counted observer list shared by sensors.
//!
//! An [`EventSource`] keeps an ordered list of subscriber keys. Notifying
//! walks a snapshot of that list and hands every key, together with the
//! identity of the notifying source, to a dispatch closure. The closure plays
//! the role of the subscriber callback: the owner of the subscribers (a
//! [`BehaviorMachine`](crate::components::behaviormachine::BehaviorMachine),
//! the damage system) routes each key to its handler.
//!
//! Keys are plain handles (`StateId`, `Entity`), so sources never own their
//! subscribers and no reference cycles appear between states and sensors.

use smallvec::SmallVec;
use std::fmt::Debug;

use crate::error::BehaviorError;

/// Ordered list of subscribers with underflow-checked removal.
#[derive(Debug, Clone)]
pub struct EventSource<K> {
    subscribers: Vec<K>,
}

impl<K> Default for EventSource<K> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }
}

impl<K: Clone + PartialEq + Debug> EventSource<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber. The same key may be registered more than once.
    pub fn subscribe(&mut self, key: K) {
        self.subscribers.push(key);
    }

    /// Remove one registration of `key`.
    ///
    /// Fails with [`BehaviorError::SubscriptionUnderflow`] when nobody is
    /// subscribed, which means the caller's subscribe/unsubscribe pairing is
    /// broken.
    pub fn unsubscribe(&mut self, key: &K) -> Result<(), BehaviorError> {
        if self.subscribers.is_empty() {
            return Err(BehaviorError::SubscriptionUnderflow);
        }
        match self.subscribers.iter().position(|k| k == key) {
            Some(index) => {
                self.subscribers.remove(index);
                Ok(())
            }
            None => Err(BehaviorError::UnknownSubscriber(format!("{:?}", key))),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_subscribed(&self, key: &K) -> bool {
        self.subscribers.contains(key)
    }

    /// Deliver `origin` to every current subscriber, in subscription order.
    ///
    /// Iterates over a snapshot, so the list seen by this call is fixed even
    /// if the dispatcher subscribes or unsubscribes on another path.
    /// Returns how many subscribers were notified.
    pub fn notify<O: Copy>(&self, origin: O, mut deliver: impl FnMut(&K, O)) -> usize {
        let snapshot: SmallVec<[K; 4]> = self.subscribers.iter().cloned().collect();
        for key in &snapshot {
            deliver(key, origin);
        }
        snapshot.len()
    }
}
