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
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use mailroom::prelude::*;
use tokio::time::{sleep, timeout};

use crate::setup::initialize_tracing;

mod setup;

/// Messages posted before any receive are drained in FIFO order.
#[tokio::test]
async fn test_mailbox_delivers_in_fifo_order() -> anyhow::Result<()> {
    initialize_tracing();
    let mailbox: Mailbox<u32> = Mailbox::new(None, CancellationToken::new());

    for n in 0..10 {
        mailbox.post(n).await?;
    }
    for n in 0..10 {
        assert_eq!(mailbox.receive().await?, n);
    }
    Ok(())
}

/// Bounded mailbox of capacity 1: post "A" succeeds immediately, a second
/// post suspends, and receiving "A" releases it.
#[tokio::test]
async fn test_bounded_post_suspends_until_space_frees() -> anyhow::Result<()> {
    initialize_tracing();
    let mailbox = Arc::new(Mailbox::new(Some(1), CancellationToken::new()));

    mailbox.post("A").await?;

    let producer = {
        let mailbox = mailbox.clone();
        tokio::spawn(async move { mailbox.post("B").await })
    };

    // Give the second post time to reach its suspension point.
    sleep(Duration::from_millis(50)).await;
    assert!(!producer.is_finished(), "post should block while full");

    assert_eq!(mailbox.receive().await?, "A");
    timeout(Duration::from_secs(1), producer).await???;
    assert_eq!(mailbox.receive().await?, "B");
    Ok(())
}

/// `stop()` releases a receiver blocked on an empty mailbox with `Closed`.
#[tokio::test]
async fn test_stop_releases_blocked_receiver() -> anyhow::Result<()> {
    initialize_tracing();
    let mailbox: Arc<Mailbox<u32>> = Arc::new(Mailbox::new(None, CancellationToken::new()));

    let consumer = {
        let mailbox = mailbox.clone();
        tokio::spawn(async move { mailbox.receive().await })
    };
    sleep(Duration::from_millis(20)).await;

    mailbox.stop();
    let outcome = timeout(Duration::from_secs(1), consumer).await??;
    assert!(matches!(outcome, Err(AgentError::Closed)));
    Ok(())
}

/// `stop()` releases a poster blocked on a full mailbox with `Closed`.
#[tokio::test]
async fn test_stop_releases_blocked_poster() -> anyhow::Result<()> {
    initialize_tracing();
    let mailbox = Arc::new(Mailbox::new(Some(1), CancellationToken::new()));
    mailbox.post(1u32).await?;

    let producer = {
        let mailbox = mailbox.clone();
        tokio::spawn(async move { mailbox.post(2).await })
    };
    sleep(Duration::from_millis(20)).await;

    mailbox.stop();
    let outcome = timeout(Duration::from_secs(1), producer).await??;
    assert!(matches!(outcome, Err(AgentError::Closed)));
    Ok(())
}

/// After `stop()`, new posts are rejected but already-queued messages are
/// still drained before `receive` reports `Closed`. `stop()` is idempotent.
#[tokio::test]
async fn test_stop_rejects_posts_but_drains_backlog() -> anyhow::Result<()> {
    initialize_tracing();
    let mailbox: Mailbox<u32> = Mailbox::new(None, CancellationToken::new());
    mailbox.post(1).await?;
    mailbox.post(2).await?;

    mailbox.stop();
    mailbox.stop();
    assert!(mailbox.is_closed());

    assert!(matches!(mailbox.post(3).await, Err(AgentError::Closed)));
    assert_eq!(mailbox.receive().await?, 1);
    assert_eq!(mailbox.receive().await?, 2);
    assert!(matches!(mailbox.receive().await, Err(AgentError::Closed)));
    Ok(())
}

/// `try_receive` drains without blocking and reports an empty mailbox as
/// `None` rather than an error.
#[tokio::test]
async fn test_try_receive_drains_without_blocking() -> anyhow::Result<()> {
    initialize_tracing();
    let mailbox: Mailbox<u32> = Mailbox::new(None, CancellationToken::new());
    assert_eq!(mailbox.try_receive(), None);

    mailbox.post(7).await?;
    mailbox.post(8).await?;
    assert_eq!(mailbox.try_receive(), Some(7));
    assert_eq!(mailbox.try_receive(), Some(8));
    assert_eq!(mailbox.try_receive(), None);
    Ok(())
}

/// The governing cancellation token releases pending operations with
/// `Cancelled`.
#[tokio::test]
async fn test_cancellation_releases_waiters() -> anyhow::Result<()> {
    initialize_tracing();
    let token = CancellationToken::new();
    let mailbox: Arc<Mailbox<u32>> = Arc::new(Mailbox::new(None, token.clone()));

    let consumer = {
        let mailbox = mailbox.clone();
        tokio::spawn(async move { mailbox.receive().await })
    };
    sleep(Duration::from_millis(20)).await;

    token.cancel();
    let outcome = timeout(Duration::from_secs(1), consumer).await??;
    assert!(matches!(outcome, Err(AgentError::Cancelled)));
    assert!(matches!(mailbox.post(1).await, Err(AgentError::Cancelled)));
    Ok(())
}

/// Concurrent producers each keep their own relative order and no message
/// is lost.
#[tokio::test]
async fn test_concurrent_producers_lose_nothing() -> anyhow::Result<()> {
    initialize_tracing();
    let mailbox: Arc<Mailbox<(u32, u32)>> = Arc::new(Mailbox::new(Some(4), CancellationToken::new()));

    let producers: Vec<_> = (0..4u32)
        .map(|producer| {
            let mailbox = mailbox.clone();
            tokio::spawn(async move {
                for seq in 0..25u32 {
                    mailbox.post((producer, seq)).await?;
                }
                Ok::<_, AgentError>(())
            })
        })
        .collect();

    let mut received = Vec::new();
    for _ in 0..100 {
        received.push(timeout(Duration::from_secs(1), mailbox.receive()).await??);
    }
    for producer in producers {
        producer.await??;
    }

    assert_eq!(received.len(), 100);
    for producer in 0..4u32 {
        let sequence: Vec<u32> = received
            .iter()
            .filter(|(p, _)| *p == producer)
            .map(|(_, seq)| *seq)
            .collect();
        assert_eq!(sequence, (0..25).collect::<Vec<_>>());
    }
    Ok(())
}
