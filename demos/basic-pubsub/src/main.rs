// Copyright (c) 2023 Contributors to the Eclipse Foundation
//
// See the NOTICE file(s) distributed with this work for additional
// information regarding copyright ownership.
//
// This program and the accompanying materials are made available under the
// terms of the Apache Software License 2.0 which is available at
// https://www.apache.org/licenses/LICENSE-2.0, or the MIT license
// which is available at https://opensource.org/licenses/MIT.
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A two-topic scenario: a slow `count` topic carrying a string and a
//! counter, published once a second,
//! and a fast `systick` topic carrying a tick count, published on every
//! iteration of the publisher loop. Each topic is subscribed to with a
//! different style, so the three ways of finding out about new data sit
//! side by side:
//!
//! - `count`: asynchronous callback, invoked inline from `publish`. The
//!   callback unsubscribes itself after its first invocation.
//! - `systick`: synchronous wait on a wakeup event, with a one-shot
//!   `poll_sync` on the main thread.
//! - Both topics also get an echo function, installed at `advertise` time,
//!   the same mechanism the `mcn echo` shell command drives.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use umcn::{define_topic, EchoError, Event, SubscriberHandle, TopicHub};

const COUNT_STR_LEN: usize = 20;
const COUNT_TOPIC_SIZE: usize = COUNT_STR_LEN + 8;
const SYSTICK_TOPIC_SIZE: usize = 8;

define_topic!(COUNT, COUNT_TOPIC_SIZE);
define_topic!(SYSTICK, SYSTICK_TOPIC_SIZE);

struct CountTopic {
    text: [u8; COUNT_STR_LEN],
    count: u64,
}

impl CountTopic {
    fn new(text: &str) -> Self {
        let mut buf = [0u8; COUNT_STR_LEN];
        let bytes = text.as_bytes();
        let n = bytes.len().min(COUNT_STR_LEN);
        buf[..n].copy_from_slice(&bytes[..n]);
        Self { text: buf, count: 0 }
    }

    fn to_bytes(&self) -> [u8; COUNT_TOPIC_SIZE] {
        let mut out = [0u8; COUNT_TOPIC_SIZE];
        out[..COUNT_STR_LEN].copy_from_slice(&self.text);
        out[COUNT_STR_LEN..].copy_from_slice(&self.count.to_le_bytes());
        out
    }

    fn from_bytes(buf: &[u8]) -> Self {
        let mut text = [0u8; COUNT_STR_LEN];
        text.copy_from_slice(&buf[..COUNT_STR_LEN]);
        let count = u64::from_le_bytes(buf[COUNT_STR_LEN..].try_into().unwrap());
        Self { text, count }
    }

    fn text(&self) -> &str {
        let nul = self.text.iter().position(|&b| b == 0).unwrap_or(COUNT_STR_LEN);
        core::str::from_utf8(&self.text[..nul]).unwrap_or("<invalid>")
    }
}

fn count_topic_echo(hub: &TopicHub) -> Result<(), EchoError> {
    let mut buf = [0u8; COUNT_TOPIC_SIZE];
    hub.copy_from_hub(&mut buf)?;
    let topic = CountTopic::from_bytes(&buf);
    println!("string:{} count:{}", topic.text(), topic.count);
    Ok(())
}

fn systick_topic_echo(hub: &TopicHub) -> Result<(), EchoError> {
    let mut buf = [0u8; SYSTICK_TOPIC_SIZE];
    hub.copy_from_hub(&mut buf)?;
    let tick = u64::from_le_bytes(buf);
    println!("tick:{tick}");
    Ok(())
}

/// Publishes `systick` on every loop iteration and `count` once per second,
/// for `duration` before returning. Mirrors `test_entry`'s tick loop.
fn publisher_loop(duration: Duration) {
    let tick_period = Duration::from_millis(1);
    let ticks_per_second = Duration::from_secs(1).as_millis() / tick_period.as_millis();

    let mut count_topic = CountTopic::new("Hello uMCN!");
    let mut elapsed = Duration::ZERO;
    let mut ticks_since_last_second: u128 = 0;
    let mut tick: u64 = 0;

    while elapsed < duration {
        tick += 1;
        let systick_bytes = tick.to_le_bytes();
        if SYSTICK.publish(&systick_bytes).is_err() {
            log::warn!("uMCN: systick publish failed");
        }

        ticks_since_last_second += 1;
        if ticks_since_last_second >= ticks_per_second {
            ticks_since_last_second = 0;
            count_topic.count += 1;
            if COUNT.publish(&count_topic.to_bytes()).is_err() {
                log::warn!("uMCN: count publish failed");
            }
        }

        std::thread::sleep(tick_period);
        elapsed += tick_period;
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    umcn::init();

    COUNT.advertise(Some(count_topic_echo)).expect("count advertises once");
    SYSTICK
        .advertise(Some(systick_topic_echo))
        .expect("systick advertises once");

    // Asynchronous callback subscription: invoked inline from `publish`,
    // unsubscribes its own node after the first delivery.
    let count_handle_slot: Arc<Mutex<Option<SubscriberHandle>>> = Arc::new(Mutex::new(None));
    let slot_for_callback = count_handle_slot.clone();
    let count_handle = COUNT
        .subscribe(
            None,
            Some(Box::new(move |data: &[u8]| {
                let topic = CountTopic::from_bytes(data);
                println!("publish callback, string:{} count:{}", topic.text(), topic.count);

                if let Some(handle) = slot_for_callback.lock().unwrap().take() {
                    if let Err(e) = COUNT.unsubscribe(handle) {
                        log::warn!("uMCN: failed to unsubscribe count callback: {e}");
                    }
                }
            })),
        )
        .expect("capacity available for the first subscriber");
    *count_handle_slot.lock().unwrap() = Some(count_handle);

    // Synchronous subscription: the main thread blocks on the wakeup event.
    let event = Arc::new(Event::new());
    let systick_handle = SYSTICK
        .subscribe(Some(event), None)
        .expect("capacity available for the first subscriber");

    let publisher = std::thread::Builder::new()
        .name("mcn_test".to_string())
        .spawn(|| publisher_loop(Duration::from_secs(5)))
        .expect("failed to spawn publisher thread");

    if systick_handle.poll_sync(Duration::from_secs(2)) {
        let mut buf = [0u8; SYSTICK_TOPIC_SIZE];
        systick_handle.copy(&mut buf).expect("systick has published by now");
        println!("got sync topic, tick={}", u64::from_le_bytes(buf));
    } else {
        log::warn!("uMCN: timed out waiting for the first systick publish");
    }

    let _ = publisher.join();
    let _ = SYSTICK.unsubscribe(systick_handle);
}
