/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::trace;

type Observer<E> = Arc<dyn Fn(&E) + Send + Sync + 'static>;

/// Identifies one subscription on an [`EventStream`], returned by
/// [`EventStream::subscribe`] and consumed by [`EventStream::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A minimal multicast notification primitive.
///
/// Events are delivered synchronously, in emission order, to every observer
/// subscribed at the moment of emission. There is no buffering: an observer
/// subscribed after an emission never sees it. Observers are treated as
/// trusted, fire-and-forget callbacks; a panicking observer propagates into
/// the emitter.
pub struct EventStream<E> {
    /// A thread-safe map of observers, keyed by subscription id.
    observers: DashMap<u64, Observer<E>>,
    next_id: AtomicU64,
}

impl<E> Default for EventStream<E> {
    fn default() -> Self {
        Self {
            observers: DashMap::new(),
            next_id: AtomicU64::new(0),
        }
    }
}

impl<E> fmt::Debug for EventStream<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl<E> EventStream<E> {
    /// Creates an event stream with no observers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `observer` to be invoked once per subsequently emitted event.
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.observers.insert(id, Arc::new(observer));
        trace!(subscription = id, "observer subscribed");
        SubscriptionId(id)
    }

    /// Removes a subscription; future emissions are no longer delivered to it.
    ///
    /// Unsubscribing an id that was already removed is a no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        if self.observers.remove(&id.0).is_some() {
            trace!(subscription = id.0, "observer unsubscribed");
        }
    }

    /// Delivers `event` synchronously to every currently-subscribed observer.
    pub fn emit(&self, event: &E) {
        // Snapshot so an observer may subscribe or unsubscribe re-entrantly.
        let observers: Vec<Observer<E>> = self
            .observers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        for observer in observers {
            observer(event);
        }
    }

    /// The number of currently-subscribed observers.
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}
