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

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by mailbox and agent operations.
///
/// The enum is `Clone` so a single body fault can be broadcast on the
/// agent's error stream and still be carried by the worker task's outcome.
#[derive(Debug, Clone, Error)]
pub enum AgentError {
    /// The mailbox was stopped; the operation can never complete.
    #[error("mailbox is closed")]
    Closed,

    /// The governing cancellation scope fired while the operation was
    /// pending, or the agent was no longer running when it failed.
    #[error("operation cancelled")]
    Cancelled,

    /// `start()` was called while the agent was already running. The
    /// original worker is unaffected.
    #[error("agent already started")]
    AlreadyStarted,

    /// `post_and_reply` exceeded its effective timeout without a resolution.
    #[error("reply timed out after {0:?}")]
    TimedOut(Duration),

    /// A failure escaped the agent body while the agent was still running.
    #[error("agent body failed: {0}")]
    Fault(Arc<anyhow::Error>),
}

impl AgentError {
    /// Wraps an arbitrary body failure.
    pub fn fault(err: anyhow::Error) -> Self {
        Self::Fault(Arc::new(err))
    }

    /// True for the outcomes that are expected artifacts of shutdown rather
    /// than genuine faults.
    pub fn is_shutdown(&self) -> bool {
        matches!(self, Self::Closed | Self::Cancelled)
    }
}
