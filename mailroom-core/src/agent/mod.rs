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
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::anyhow;
use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, instrument, trace, warn};

pub use config::AgentConfig;

use crate::common::{AgentBody, BodyFuture, EventStream, CONFIG};
use crate::mailbox::Mailbox;
use crate::message::{AgentError, ReplyChannel};
use crate::traits::AgentMessage;

mod config;

const IDLE: u8 = 0;
const RUNNING: u8 = 1;

/// A single-consumer agent: a private [`Mailbox`] drained by a user-supplied
/// body coroutine running on its own worker task.
///
/// The handle is cheap to clone; every clone refers to the same agent. One
/// clone is passed into the body on each start so the body can call
/// [`receive`](Self::receive)/[`try_receive`](Self::try_receive) (and post
/// to itself if it wants to).
///
/// Lifecycle: `Idle` → [`start`](Self::start) → `Running` →
/// [`stop`](Self::stop) (or body completion/fault) → `Idle`. At most one
/// worker task is active at any time; the transition in either direction is
/// a single atomic compare-and-set.
pub struct Agent<T: AgentMessage> {
    inner: Arc<AgentInner<T>>,
}

impl<T: AgentMessage> Clone for Agent<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: AgentMessage> fmt::Debug for Agent<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("running", &self.is_running())
            .field("mailbox", &self.inner.mailbox)
            .finish()
    }
}

struct AgentInner<T: AgentMessage> {
    mailbox: Mailbox<T>,
    body: AgentBody<T>,
    /// `IDLE` or `RUNNING`; mutated only by compare-and-set.
    state: AtomicU8,
    /// Incremented on every successful `start()`; tags the stored worker
    /// handle so a finished worker never clears a successor's handle.
    epoch: AtomicU64,
    worker: Mutex<Option<WorkerTask>>,
    cancel: CancellationToken,
    errors: EventStream<AgentError>,
    reply_timeout: Option<Duration>,
    tracker: TaskTracker,
}

struct WorkerTask {
    epoch: u64,
    handle: JoinHandle<Result<(), AgentError>>,
}

impl<T: AgentMessage> Agent<T> {
    /// Creates an idle agent from `config` and a body coroutine.
    ///
    /// The body is invoked with a clone of this handle each time the agent
    /// starts; a typical body loops on [`receive`](Self::receive) until it
    /// fails on shutdown.
    pub fn new<F, Fut>(config: AgentConfig, body: F) -> Self
    where
        F: Fn(Agent<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let cancel = config.cancellation().child_token();
        let body: AgentBody<T> = Arc::new(move |agent| -> BodyFuture { Box::pin(body(agent)) });
        Self {
            inner: Arc::new(AgentInner {
                mailbox: Mailbox::new(config.capacity(), cancel.clone()),
                body,
                state: AtomicU8::new(IDLE),
                epoch: AtomicU64::new(0),
                worker: Mutex::new(None),
                cancel,
                errors: EventStream::new(),
                reply_timeout: config.reply_timeout(),
                tracker: TaskTracker::new(),
            }),
        }
    }

    /// Transitions `Idle` → `Running` and spawns the worker task.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Fails with [`AgentError::AlreadyStarted`] if the agent is not idle;
    /// the running worker is unaffected and no partial effects occur.
    #[instrument(skip(self))]
    pub fn start(&self) -> Result<(), AgentError> {
        // Hold the worker slot across the spawn so the new task cannot
        // observe it before the handle is stored.
        let mut slot = self.inner.worker_slot();
        self.inner
            .state
            .compare_exchange(IDLE, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AgentError::AlreadyStarted)?;
        let epoch = self.inner.epoch.fetch_add(1, Ordering::Relaxed) + 1;
        trace!(epoch, "starting agent worker");

        let agent = self.clone();
        let handle = self.inner.tracker.spawn(async move {
            let body = agent.inner.body.clone();
            let outcome = AssertUnwindSafe(body(agent.clone())).catch_unwind().await;
            let result = match outcome {
                Ok(Ok(())) => Ok(()),
                Ok(Err(err)) => Err(classify(err)),
                Err(panic) => Err(AgentError::fault(anyhow!(
                    "agent body panicked: {}",
                    panic_message(panic.as_ref())
                ))),
            };
            agent.finish(epoch, &result);
            result
        });
        *slot = Some(WorkerTask { epoch, handle });
        Ok(())
    }

    /// Completion continuation: runs exactly once per start, at the tail of
    /// the worker task, regardless of success, failure, or cancellation.
    fn finish(&self, epoch: u64, result: &Result<(), AgentError>) {
        if let Err(err) = result {
            if !err.is_shutdown() {
                error!(%err, "agent body failed");
                self.inner.errors.emit(err);
            }
        }
        {
            let mut slot = self.inner.worker_slot();
            if slot.as_ref().is_some_and(|task| task.epoch == epoch) {
                *slot = None;
            }
        }
        let _ = self
            .inner
            .state
            .compare_exchange(RUNNING, IDLE, Ordering::AcqRel, Ordering::Acquire);
        trace!(epoch, "agent worker finished");
    }

    /// Transitions `Running` → `Idle`, closes the mailbox, and waits for the
    /// worker task to finish.
    ///
    /// Calling `stop` on an agent that is not running is a silent no-op, so
    /// concurrent stops are safe: exactly one performs the transition.
    ///
    /// # Errors
    ///
    /// A worker that ends with a shutdown outcome (`Cancelled`/`Closed`) is
    /// the expected path and is swallowed; any other failure propagates.
    #[instrument(skip(self))]
    pub async fn stop(&self) -> anyhow::Result<()> {
        if self
            .inner
            .state
            .compare_exchange(RUNNING, IDLE, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            trace!("stop on a non-running agent is a no-op");
            return Ok(());
        }
        self.inner.mailbox.stop();
        let task = self.inner.worker_slot().take();
        if let Some(task) = task {
            trace!(epoch = task.epoch, "waiting for agent worker");
            match task.handle.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) if err.is_shutdown() => {}
                Ok(Err(err)) => return Err(err.into()),
                Err(join_err) if join_err.is_cancelled() => {}
                Err(join_err) => return Err(join_err.into()),
            }
        }
        Ok(())
    }

    /// True iff the agent is `Running` and its cancellation scope has not
    /// fired. A cancelled-but-not-yet-cleaned-up agent reports not running.
    pub fn is_running(&self) -> bool {
        self.inner.state.load(Ordering::Acquire) == RUNNING && !self.inner.cancel.is_cancelled()
    }

    /// Posts a message into the agent's mailbox, suspending while a bounded
    /// mailbox is full.
    ///
    /// # Errors
    ///
    /// If the underlying mailbox operation fails while the agent is not
    /// running, the failure is reported as [`AgentError::Cancelled`]:
    /// shutdown is shutdown, regardless of the precise internal cause. A
    /// failure while still running is a genuine fault and surfaces
    /// unchanged.
    pub async fn post(&self, msg: T) -> Result<(), AgentError> {
        self.inner
            .mailbox
            .post(msg)
            .await
            .map_err(|err| self.translate(err))
    }

    /// Receives the next message, suspending until one is available. Subject
    /// to the same error translation as [`post`](Self::post).
    pub async fn receive(&self) -> Result<T, AgentError> {
        self.inner
            .mailbox
            .receive()
            .await
            .map_err(|err| self.translate(err))
    }

    /// Non-suspending receive; `None` when the mailbox is empty.
    pub fn try_receive(&self) -> Option<T> {
        self.inner.mailbox.try_receive()
    }

    /// Posts a message carrying a fresh [`ReplyChannel`] and awaits its
    /// resolution, bounded by the agent's default reply timeout.
    ///
    /// `build` receives the channel and produces the message to post; the
    /// body resolves the channel while processing that message. The wait is
    /// entirely decoupled from the message loop.
    pub async fn post_and_reply<R, F>(&self, build: F) -> Result<R, AgentError>
    where
        R: Send + 'static,
        F: FnOnce(ReplyChannel<R>) -> T,
    {
        self.post_and_reply_within(build, self.inner.reply_timeout)
            .await
    }

    /// [`post_and_reply`](Self::post_and_reply) with an explicit timeout;
    /// `None` waits without a deadline.
    ///
    /// The deadline governs the whole invocation: a post blocked on a full
    /// mailbox counts against it, not just the wait for the reply.
    ///
    /// # Errors
    ///
    /// Fails with [`AgentError::TimedOut`] past the deadline, or
    /// [`AgentError::Cancelled`] when the agent's cancellation scope fires
    /// or the channel is dropped unresolved. The post itself is subject to
    /// the standard translation rule.
    pub async fn post_and_reply_within<R, F>(
        &self,
        build: F,
        timeout: Option<Duration>,
    ) -> Result<R, AgentError>
    where
        R: Send + 'static,
        F: FnOnce(ReplyChannel<R>) -> T,
    {
        let (channel, slot) = ReplyChannel::new();
        // Derived scope: fires on agent cancellation, independent of other
        // in-flight replies.
        let scope = self.inner.cancel.child_token();
        let exchange = async {
            self.post(build(channel)).await?;
            tokio::select! {
                reply = slot => reply.map_err(|_| AgentError::Cancelled),
                () = scope.cancelled() => Err(AgentError::Cancelled),
            }
        };
        match timeout {
            Some(limit) => match tokio::time::timeout(limit, exchange).await {
                Ok(outcome) => outcome,
                Err(_) => Err(AgentError::TimedOut(limit)),
            },
            None => exchange.await,
        }
    }

    /// The agent's unhandled-error stream. Body faults are emitted here
    /// exactly once each, before the lifecycle transition back to `Idle`.
    pub fn errors(&self) -> &EventStream<AgentError> {
        &self.inner.errors
    }

    /// The agent-scoped cancellation token; fires on [`dispose`](Self::dispose)
    /// or when the parent scope supplied at construction is cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    /// Best-effort teardown: stops the agent and waits for every spawned
    /// worker task, bounded by the configured grace period, then fires the
    /// cancellation scope. Always returns.
    #[instrument(skip(self))]
    pub async fn dispose(&self) {
        let grace = CONFIG.dispose_grace();
        let teardown = async {
            if let Err(err) = self.stop().await {
                error!(%err, "agent worker failed during dispose");
            }
            // Covers workers a concurrent stop() already detached from the
            // handle slot.
            self.inner.tracker.close();
            self.inner.tracker.wait().await;
        };
        if tokio::time::timeout(grace, teardown).await.is_err() {
            warn!(
                grace_ms = grace.as_millis() as u64,
                "agent did not stop within the dispose grace period"
            );
        }
        self.inner.cancel.cancel();
    }

    fn translate(&self, err: AgentError) -> AgentError {
        if self.is_running() {
            err
        } else {
            AgentError::Cancelled
        }
    }
}

impl<T: AgentMessage> AgentInner<T> {
    fn worker_slot(&self) -> MutexGuard<'_, Option<WorkerTask>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Maps a body failure onto the taxonomy: shutdown artifacts pass through,
/// anything else is a fault.
fn classify(err: anyhow::Error) -> AgentError {
    match err.downcast::<AgentError>() {
        Ok(known) => known,
        Err(other) => AgentError::fault(other),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
