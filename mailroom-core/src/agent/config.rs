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

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::common::CONFIG;

/// Construction-time options for an [`Agent`](super::Agent).
///
/// Defaults come from the global [`CONFIG`]: unbounded mailbox, no reply
/// timeout, and a fresh root cancellation scope.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    capacity: Option<usize>,
    cancellation: CancellationToken,
    reply_timeout: Option<Duration>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            capacity: CONFIG.default_mailbox_capacity(),
            cancellation: CancellationToken::new(),
            reply_timeout: CONFIG.default_reply_timeout(),
        }
    }
}

impl AgentConfig {
    /// Equivalent to [`AgentConfig::default`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds the mailbox at `capacity` messages; posters suspend when full.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Removes any mailbox bound.
    pub fn unbounded(mut self) -> Self {
        self.capacity = None;
        self
    }

    /// Parents the agent's cancellation scope under `token`; cancelling the
    /// parent cancels the agent.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Sets the default `post_and_reply` timeout.
    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = Some(timeout);
        self
    }

    /// Clears the default `post_and_reply` timeout; replies wait without a
    /// deadline unless a per-call timeout is given.
    pub fn without_reply_timeout(mut self) -> Self {
        self.reply_timeout = None;
        self
    }

    pub(crate) fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub(crate) fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub(crate) fn reply_timeout(&self) -> Option<Duration> {
        self.reply_timeout
    }
}
