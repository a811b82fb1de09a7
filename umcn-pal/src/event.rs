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

//! Coalescing, level-triggered wakeup primitive.
//!
//! A counting semaphore can approximate "at most one pending wakeup" by
//! peeking at its internal count before signaling, but that means reaching
//! into a primitive that isn't meant to be inspected. [`Event`] carries an
//! explicit dirty flag instead and never exposes a count, so coalescing
//! falls out of the type rather than out of inspecting a borrowed one.

use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// A binary, coalescing wakeup event. Multiple [`Event::signal`] calls
/// between two [`Event::wait_timeout`] calls are indistinguishable from a
/// single call: the event either is pending or it isn't.
pub struct Event {
    dirty: Mutex<bool>,
    condvar: Condvar,
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}

impl Event {
    pub fn new() -> Self {
        Self {
            dirty: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    /// Marks the event as signaled and wakes one waiter. A no-op if the
    /// event is already pending.
    pub fn signal(&self) {
        let mut dirty = self.dirty.lock().unwrap_or_else(|p| p.into_inner());
        if !*dirty {
            *dirty = true;
            self.condvar.notify_one();
        }
    }

    /// Waits up to `timeout` for [`Event::signal`]. Returns `true` and
    /// clears the event if it was signaled within the timeout; returns
    /// `false` and leaves the event unchanged on timeout. `timeout` of
    /// [`Duration::ZERO`] polls the current state without blocking.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let dirty = self.dirty.lock().unwrap_or_else(|p| p.into_inner());
        let (mut dirty, _) = self
            .condvar
            .wait_timeout_while(dirty, timeout, |d| !*d)
            .unwrap_or_else(|p| p.into_inner());

        if *dirty {
            *dirty = false;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn wait_times_out_when_never_signaled() {
        let event = Event::new();
        assert!(!event.wait_timeout(Duration::from_millis(20)));
    }

    #[test]
    fn wait_returns_true_immediately_after_signal() {
        let event = Event::new();
        event.signal();
        assert!(event.wait_timeout(Duration::ZERO));
    }

    #[test]
    fn repeated_signals_coalesce_into_one_pending_wakeup() {
        let event = Arc::new(Event::new());
        event.signal();
        event.signal();
        event.signal();

        assert!(event.wait_timeout(Duration::ZERO));
        // the three signals collapsed into a single pending wakeup
        assert!(!event.wait_timeout(Duration::ZERO));
    }

    #[test]
    fn signal_wakes_a_blocked_waiter() {
        let event = Arc::new(Event::new());
        let waiter_event = event.clone();
        let handle = thread::spawn(move || waiter_event.wait_timeout(Duration::from_secs(5)));

        thread::sleep(Duration::from_millis(20));
        event.signal();

        assert!(handle.join().unwrap());
    }
}
