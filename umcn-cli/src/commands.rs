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

//! Implementations of the `mcn` subcommands: topic lookup by name, with
//! user-facing error strings treated as part of the CLI's observable
//! behavior rather than free to reword.

use anyhow::{anyhow, bail, Result};
use log::warn;
use std::time::Duration;

pub fn list() {
    let mut hubs = Vec::new();
    umcn::registry::for_each(|hub| hubs.push(hub));

    let max_len = hubs
        .iter()
        .map(|hub| hub.name().len())
        .max()
        .unwrap_or(0)
        .max("Topic".len());

    println!(
        "{:<width$}    #SUB   Freq(Hz)   Echo   Suspend",
        "Topic",
        width = max_len
    );
    println!("{}", "-".repeat(max_len + 2));

    for hub in hubs {
        println!(
            "{:<width$}    {:^6} {:^10.1} {:^6} {:^9}",
            hub.name(),
            hub.subscriber_count(),
            hub.frequency_hz(),
            hub.has_echo(),
            hub.is_suspended(),
            width = max_len,
        );
    }
}

pub fn echo(topic: &str, period_ms: u64, mut count: u32) -> Result<()> {
    let hub = umcn::find(topic).ok_or_else(|| anyhow!("can not find topic {topic}"))?;

    if !hub.has_echo() {
        bail!("there is no topic echo function defined!");
    }

    let handle = hub.subscribe(None, None).ok_or_else(|| anyhow!("mcn subscribe fail"))?;

    while count > 0 {
        if handle.poll() {
            if let Err(e) = hub.invoke_echo() {
                warn!("uMCN: echo function for '{topic}' failed: {e}");
            }
            handle.clear();
            count -= 1;
        }

        if period_ms > 0 {
            std::thread::sleep(Duration::from_millis(period_ms));
        }
    }

    hub.unsubscribe(handle)
        .map_err(|_| anyhow!("mcn unsubscribe fail"))
}

pub fn suspend(topic: &str) -> Result<()> {
    let hub = umcn::find(topic).ok_or_else(|| anyhow!("can not find topic {topic}"))?;
    hub.suspend();
    Ok(())
}

pub fn resume(topic: &str) -> Result<()> {
    let hub = umcn::find(topic).ok_or_else(|| anyhow!("can not find topic {topic}"))?;
    hub.resume();
    Ok(())
}
