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

//! Periodic soft timer: fires on its own task rather than in interrupt
//! context. On a hosted target the natural equivalent is a dedicated
//! background thread.

use log::error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// A running periodic timer. Dropping it stops the background thread and
/// joins it.
pub struct PeriodicTimer {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTimer {
    /// Spawns a background thread that calls `tick` once per `period` until
    /// the returned [`PeriodicTimer`] is dropped.
    pub fn start<F>(name: &str, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();
        let handle = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                while !stop_flag.load(Ordering::Relaxed) {
                    std::thread::sleep(period);
                    if stop_flag.load(Ordering::Relaxed) {
                        break;
                    }
                    tick();
                }
            });

        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                error!("failed to spawn uMCN periodic timer '{name}': {e}");
                None
            }
        };

        Self { stop, handle }
    }
}

impl Drop for PeriodicTimer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn tick_fires_periodically_until_dropped() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let timer = PeriodicTimer::start("test_timer", Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        std::thread::sleep(Duration::from_millis(55));
        drop(timer);

        assert!(count.load(Ordering::SeqCst) >= 3);
    }
}
