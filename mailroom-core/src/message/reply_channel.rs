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
use std::sync::{Mutex, PoisonError};

use tokio::sync::oneshot;
use tracing::trace;

/// A write-once reply slot carried inside a message.
///
/// Created by [`Agent::post_and_reply`](crate::agent::Agent::post_and_reply),
/// handed to the message builder, and resolved by the agent body while it
/// processes the message. The poster awaits the consumer half; the channel
/// itself is only the resolving capability.
///
/// Resolution follows "try" semantics: the first write wins and any later
/// [`resolve`](Self::resolve) call is a no-op.
pub struct ReplyChannel<R> {
    slot: Mutex<Option<oneshot::Sender<R>>>,
}

impl<R> fmt::Debug for ReplyChannel<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplyChannel")
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

impl<R> ReplyChannel<R> {
    /// Creates the resolving capability plus the consumer half awaited by
    /// the poster.
    pub(crate) fn new() -> (Self, oneshot::Receiver<R>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                slot: Mutex::new(Some(tx)),
            },
            rx,
        )
    }

    /// Delivers `reply` to the waiting poster. First write wins; resolving
    /// an already-resolved channel is a no-op, as is resolving after the
    /// poster stopped waiting (timeout or cancellation).
    pub fn resolve(&self, reply: R) {
        let sender = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match sender {
            Some(tx) => {
                if tx.send(reply).is_err() {
                    trace!("reply dropped; poster is no longer waiting");
                }
            }
            None => trace!("reply channel already resolved; ignoring"),
        }
    }

    /// Whether the slot has already been written.
    pub fn is_resolved(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}
