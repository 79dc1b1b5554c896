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

//! Internal type aliases shared across the crate.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::agent::Agent;

/// Crate-internal: the pinned, boxed future produced by one invocation of an
/// agent body.
pub(crate) type BodyFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'static>>;

/// Crate-internal: the user-supplied body coroutine, stored so it can be
/// invoked once per successful `start()` with a fresh handle clone.
pub(crate) type AgentBody<T> = Arc<dyn Fn(Agent<T>) -> BodyFuture + Send + Sync + 'static>;
