//! # Keyed Single-Slot Debounce
//!
//! `arm(key, payload)` either schedules a fire for `key` or replaces the
//! payload of the one already waiting, restarting its quiet period. Exactly
//! one timer is alive per key: the previous one is aborted before the next
//! is spawned.
//!
//! A timer that already fired may still have its wake-up queued when the key
//! is re-armed. Each arm therefore gets a [`FireToken`], and [`take_due`]
//! only releases the payload to the token of the current arm.
//!
//! [`take_due`]: Debouncer::take_due

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Identifies one arm of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FireToken(u64);

/// Outcome of [`Debouncer::arm`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Armed {
    /// No fire was pending for the key
    Scheduled,
    /// An unfired payload was replaced
    Replaced,
}

struct Slot<P> {
    payload: P,
    token: FireToken,
    timer: JoinHandle<()>,
}

pub struct Debouncer<K, P> {
    delay: Duration,
    slots: HashMap<K, Slot<P>>,
    next_token: u64,
}

impl<K, P> Debouncer<K, P>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            slots: HashMap::new(),
            next_token: 0,
        }
    }

    /// Schedule `on_fire(key, token)` after the quiet period
    ///
    /// Must be called from within a tokio runtime.
    pub fn arm<F>(&mut self, key: K, payload: P, on_fire: F) -> Armed
    where
        F: FnOnce(K, FireToken) + Send + 'static,
    {
        let armed = match self.slots.remove(&key) {
            Some(previous) => {
                previous.timer.abort();
                Armed::Replaced
            }
            None => Armed::Scheduled,
        };

        self.next_token += 1;
        let token = FireToken(self.next_token);
        let delay = self.delay;
        let fire_key = key.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_fire(fire_key, token);
        });

        self.slots.insert(
            key,
            Slot {
                payload,
                token,
                timer,
            },
        );
        armed
    }

    /// Release the payload if `token` belongs to the current arm of `key`
    pub fn take_due(&mut self, key: &K, token: FireToken) -> Option<P> {
        match self.slots.get(key) {
            Some(slot) if slot.token == token => self.slots.remove(key).map(|slot| slot.payload),
            _ => None,
        }
    }

    /// Disarm `key`, handing back its payload
    pub fn cancel(&mut self, key: &K) -> Option<P> {
        self.slots.remove(key).map(|slot| {
            slot.timer.abort();
            slot.payload
        })
    }

    /// Disarm every key
    pub fn drain(&mut self) -> Vec<(K, P)> {
        self.slots
            .drain()
            .map(|(key, slot)| {
                slot.timer.abort();
                (key, slot.payload)
            })
            .collect()
    }

    pub fn pending(&self, key: &K) -> Option<&P> {
        self.slots.get(key).map(|slot| &slot.payload)
    }

    pub fn is_armed(&self, key: &K) -> bool {
        self.slots.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<K, P> Drop for Debouncer<K, P> {
    fn drop(&mut self) {
        for slot in self.slots.values() {
            slot.timer.abort();
        }
    }
}
