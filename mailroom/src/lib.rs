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
#![forbid(missing_docs)]

//! # Mailroom
//!
//! A single-consumer agent library built on Tokio: a background worker with
//! a private mailbox of messages, which other tasks post into asynchronously
//! and which the worker drains one at a time inside a user-supplied body
//! coroutine.
//!
//! ## Key Concepts
//!
//! - **Agent**: owns a mailbox and the body coroutine; manages the
//!   `Idle`/`Running` lifecycle and exposes `post`, `post_and_reply`,
//!   `receive`, and `try_receive`.
//! - **Mailbox**: a cancellable, optionally-bounded FIFO queue with exactly
//!   one consumer.
//! - **ReplyChannel**: a write-once slot a message carries so the body can
//!   deliver a reply back to the specific poster that requested it.
//! - **EventStream**: a multicast stream broadcasting unhandled body faults
//!   to subscribed observers.
//! - **Cancellation**: a `CancellationToken` scoped to the agent at
//!   construction governs the mailbox and every derived reply wait.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mailroom::prelude::*;
//!
//! enum Counter {
//!     Add(u64),
//!     Total(ReplyChannel<u64>),
//! }
//!
//! let agent = Agent::new(AgentConfig::default(), |agent: Agent<Counter>| async move {
//!     let mut total = 0;
//!     loop {
//!         match agent.receive().await? {
//!             Counter::Add(n) => total += n,
//!             Counter::Total(reply) => reply.resolve(total),
//!         }
//!     }
//! });
//! agent.start()?;
//! agent.post(Counter::Add(2)).await?;
//! let total = agent.post_and_reply(Counter::Total).await?;
//! agent.stop().await?;
//! ```

/// Re-exports the public surface of the Mailroom library.
pub mod prelude {
    pub use mailroom_core::prelude::*;
}
