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

#![forbid(unsafe_code)]
// #![warn(missing_docs)]
//! Mailroom Core Library
//!
//! This library provides the core functionality for the Mailroom agent
//! library: cancellable mailboxes, the agent lifecycle state machine,
//! one-shot reply channels, and the unhandled-error event stream.

/// The agent lifecycle state machine and its configuration.
pub(crate) mod agent;

/// Common utilities shared across the crate (event stream, global config).
pub(crate) mod common;

pub(crate) mod mailbox;
pub(crate) mod message;
/// Trait definitions used by the Mailroom library.
pub(crate) mod traits;

/// Prelude module for convenient imports.
///
/// Re-exports the public surface of the crate along with the cancellation
/// token type threaded through mailboxes and agents.
pub mod prelude {
    pub use tokio_util::sync::CancellationToken;

    pub use crate::agent::{Agent, AgentConfig};
    pub use crate::common::{EventStream, MailroomConfig, SubscriptionId, CONFIG};
    pub use crate::mailbox::Mailbox;
    pub use crate::message::{AgentError, ReplyChannel};
    pub use crate::traits::AgentMessage;
}
