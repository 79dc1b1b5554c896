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

/// Marker trait for types that can travel through a [`Mailbox`](crate::mailbox::Mailbox).
///
/// A message only needs to be sendable across tasks and free of borrowed
/// data; any such type qualifies automatically through the blanket
/// implementation, so user code never implements this trait by hand.
pub trait AgentMessage: Send + 'static {}

impl<T> AgentMessage for T where T: Send + 'static {}
