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

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::{Notify, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::message::AgentError;
use crate::traits::AgentMessage;

/// A cancellable, optionally-bounded FIFO queue with one consumer.
///
/// Producers [`post`](Self::post) concurrently; the single consumer drains
/// via [`receive`](Self::receive) or [`try_receive`](Self::try_receive).
/// Two signals close the mailbox: the cancellation token supplied at
/// construction and the explicit [`stop`](Self::stop). Both release every
/// current and future waiter.
///
/// Once a message is accepted by `post` it is delivered to at most one
/// `receive`; a rejected `post` never leaves the message behind.
pub struct Mailbox<T> {
    queue: Mutex<VecDeque<T>>,
    /// Capacity permits when bounded; closed on `stop` to release blocked
    /// posters.
    slots: Option<Semaphore>,
    capacity: Option<usize>,
    /// Wakes the consumer when a message lands.
    readable: Notify,
    /// Flipped by `stop()`.
    closed: CancellationToken,
    /// The agent-scoped cancellation signal.
    cancel: CancellationToken,
}

impl<T: AgentMessage> fmt::Debug for Mailbox<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailbox")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<T: AgentMessage> Mailbox<T> {
    /// Creates a mailbox observing `cancel`; `capacity` of `None` means
    /// unbounded.
    pub fn new(capacity: Option<usize>, cancel: CancellationToken) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            slots: capacity.map(Semaphore::new),
            capacity,
            readable: Notify::new(),
            closed: CancellationToken::new(),
            cancel,
        }
    }

    /// Enqueues `msg`, suspending while a bounded mailbox is full.
    ///
    /// # Errors
    ///
    /// Fails with [`AgentError::Closed`] once the mailbox has been stopped,
    /// or [`AgentError::Cancelled`] if the governing cancellation signal
    /// fires while waiting for space.
    pub async fn post(&self, msg: T) -> Result<(), AgentError> {
        if let Some(slots) = &self.slots {
            let permit = tokio::select! {
                biased;
                () = self.closed.cancelled() => return Err(AgentError::Closed),
                () = self.cancel.cancelled() => return Err(AgentError::Cancelled),
                acquired = slots.acquire() => match acquired {
                    Ok(permit) => permit,
                    // Semaphore closed by `stop()`.
                    Err(_) => return Err(AgentError::Closed),
                },
            };
            // A stop may have raced the acquire.
            if self.closed.is_cancelled() {
                return Err(AgentError::Closed);
            }
            // The slot stays consumed until the consumer pops the message.
            permit.forget();
        } else {
            if self.closed.is_cancelled() {
                return Err(AgentError::Closed);
            }
            if self.cancel.is_cancelled() {
                return Err(AgentError::Cancelled);
            }
        }

        self.queue().push_back(msg);
        self.readable.notify_one();
        Ok(())
    }

    /// Removes and returns the oldest message, suspending until one is
    /// available.
    ///
    /// Messages already queued when the mailbox closes are still drained;
    /// only an empty, closed mailbox reports an error.
    ///
    /// # Errors
    ///
    /// Fails with [`AgentError::Closed`] when stopped with no pending
    /// messages, or [`AgentError::Cancelled`] if the cancellation signal
    /// fires while waiting.
    pub async fn receive(&self) -> Result<T, AgentError> {
        loop {
            let readable = self.readable.notified();
            if let Some(msg) = self.pop() {
                return Ok(msg);
            }
            if self.closed.is_cancelled() {
                return Err(AgentError::Closed);
            }
            if self.cancel.is_cancelled() {
                return Err(AgentError::Cancelled);
            }
            // Every branch re-runs the checks above, so a message that
            // raced a close is still picked up first.
            tokio::select! {
                () = readable => {}
                () = self.closed.cancelled() => {}
                () = self.cancel.cancelled() => {}
            }
        }
    }

    /// Non-suspending receive: returns the oldest message if one is queued,
    /// `None` otherwise. Used for draining without blocking.
    pub fn try_receive(&self) -> Option<T> {
        self.pop()
    }

    /// Closes the mailbox, releasing all current and future waiters.
    /// Idempotent.
    pub fn stop(&self) {
        if self.closed.is_cancelled() {
            return;
        }
        trace!("stopping mailbox");
        self.closed.cancel();
        if let Some(slots) = &self.slots {
            slots.close();
        }
        self.readable.notify_waiters();
    }

    /// Whether `stop()` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// The number of currently queued messages.
    pub fn len(&self) -> usize {
        self.queue().len()
    }

    /// Whether no messages are queued.
    pub fn is_empty(&self) -> bool {
        self.queue().is_empty()
    }

    /// The maximum capacity, `None` when unbounded.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    fn pop(&self) -> Option<T> {
        let msg = self.queue().pop_front();
        if msg.is_some() {
            if let Some(slots) = &self.slots {
                slots.add_permits(1);
            }
        }
        msg
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
