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

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use mailroom::prelude::*;
use tokio::time::sleep;

use crate::setup::initialize_tracing;

mod setup;

async fn eventually(cond: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if cond() {
            return true;
        }
        sleep(Duration::from_millis(5)).await;
    }
    false
}

/// Observers see every event emitted while subscribed and nothing after
/// unsubscribing.
#[tokio::test]
async fn test_subscribe_emit_unsubscribe() -> anyhow::Result<()> {
    initialize_tracing();
    let stream: EventStream<String> = EventStream::new();

    let first = Arc::new(Mutex::new(Vec::new()));
    let second = Arc::new(Mutex::new(Vec::new()));
    let first_sub = stream.subscribe({
        let first = first.clone();
        move |event: &String| first.lock().unwrap().push(event.clone())
    });
    let _second_sub = stream.subscribe({
        let second = second.clone();
        move |event: &String| second.lock().unwrap().push(event.clone())
    });
    assert_eq!(stream.observer_count(), 2);

    stream.emit(&"one".to_string());
    stream.emit(&"two".to_string());
    stream.unsubscribe(first_sub);
    stream.emit(&"three".to_string());

    assert_eq!(*first.lock().unwrap(), vec!["one", "two"]);
    assert_eq!(*second.lock().unwrap(), vec!["one", "two", "three"]);
    Ok(())
}

/// An observer subscribed after an emission never sees it; there is no
/// buffering.
#[tokio::test]
async fn test_no_delivery_before_subscription() -> anyhow::Result<()> {
    initialize_tracing();
    let stream: EventStream<u32> = EventStream::new();
    stream.emit(&1);

    let seen = Arc::new(Mutex::new(Vec::new()));
    stream.subscribe({
        let seen = seen.clone();
        move |event: &u32| seen.lock().unwrap().push(*event)
    });
    stream.emit(&2);

    assert_eq!(*seen.lock().unwrap(), vec![2]);
    Ok(())
}

/// An unhandled body fault is delivered to every subscriber exactly once,
/// and the agent is restartable afterwards.
#[tokio::test]
async fn test_body_fault_broadcast_exactly_once() -> anyhow::Result<()> {
    initialize_tracing();
    let agent = Agent::new(AgentConfig::default(), |agent: Agent<&'static str>| async move {
        loop {
            let msg = agent.receive().await?;
            if msg == "boom" {
                return Err(anyhow!("boom"));
            }
        }
    });

    let first = Arc::new(Mutex::new(Vec::new()));
    let second = Arc::new(Mutex::new(Vec::new()));
    agent.errors().subscribe({
        let first = first.clone();
        move |err: &AgentError| first.lock().unwrap().push(err.to_string())
    });
    agent.errors().subscribe({
        let second = second.clone();
        move |err: &AgentError| second.lock().unwrap().push(err.to_string())
    });

    agent.start()?;
    agent.post("boom").await?;

    assert!(eventually(|| first.lock().unwrap().len() == 1).await);
    assert!(eventually(|| !agent.is_running()).await);
    // Exactly once: no duplicate delivery shows up later.
    sleep(Duration::from_millis(50)).await;
    assert_eq!(first.lock().unwrap().len(), 1);
    assert_eq!(second.lock().unwrap().len(), 1);
    assert!(first.lock().unwrap()[0].contains("boom"));

    agent.start()?;
    assert!(agent.is_running());
    agent.stop().await?;
    Ok(())
}

/// A clean `stop()` emits nothing: shutdown outcomes are not faults.
#[tokio::test]
async fn test_clean_stop_emits_no_errors() -> anyhow::Result<()> {
    initialize_tracing();
    let agent = Agent::new(AgentConfig::default(), |agent: Agent<u32>| async move {
        loop {
            agent.receive().await?;
        }
    });

    let seen = Arc::new(Mutex::new(Vec::new()));
    agent.errors().subscribe({
        let seen = seen.clone();
        move |err: &AgentError| seen.lock().unwrap().push(err.to_string())
    });

    agent.start()?;
    agent.post(1).await?;
    agent.stop().await?;

    sleep(Duration::from_millis(50)).await;
    assert!(seen.lock().unwrap().is_empty());
    Ok(())
}
