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

//! Global critical-section primitive.
//!
//! uMCN's concurrency contract assumes one scheduler-wide disable/enable
//! primitive, not a per-object lock. On a hosted target the closest
//! equivalent is a single process-wide mutex: every hub mutation
//! serializes through it, exactly as every hub mutation on a bare-metal
//! target would serialize through the scheduler lock.

use std::sync::{Mutex, MutexGuard};

static GLOBAL_LOCK: Mutex<()> = Mutex::new(());

/// Proof that the global critical section is currently held.
///
/// Code that reaches into hub-internal state behind an `UnsafeCell` takes a
/// `&CriticalSection` argument so the locking discipline is part of the
/// function signature instead of a convention. The only way to produce one
/// is [`CriticalSection::enter`].
pub struct CriticalSection(());

/// RAII guard returned by [`CriticalSection::enter`]; releases the critical
/// section on drop.
pub struct CriticalSectionGuard<'a> {
    _lock: MutexGuard<'a, ()>,
    token: CriticalSection,
}

impl core::ops::Deref for CriticalSectionGuard<'_> {
    type Target = CriticalSection;

    fn deref(&self) -> &CriticalSection {
        &self.token
    }
}

impl CriticalSection {
    /// Enters the global critical section, blocking until no other task is
    /// inside it.
    ///
    /// The section must be held only briefly: no blocking calls and no
    /// callbacks may run while it is held.
    pub fn enter() -> CriticalSectionGuard<'static> {
        let lock = GLOBAL_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        CriticalSectionGuard {
            _lock: lock,
            token: CriticalSection(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn only_one_task_is_inside_the_section_at_a_time() {
        let concurrent = Arc::new(AtomicUsize::new(0));
        let max_concurrent = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let concurrent = concurrent.clone();
                let max_concurrent = max_concurrent.clone();
                thread::spawn(move || {
                    for _ in 0..200 {
                        let _guard = CriticalSection::enter();
                        let now = concurrent.fetch_add(1, Ordering::SeqCst) + 1;
                        max_concurrent.fetch_max(now, Ordering::SeqCst);
                        concurrent.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(max_concurrent.load(Ordering::SeqCst), 1);
    }
}
