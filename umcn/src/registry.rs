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

//! The topic registry: every advertised hub, in advertise order.
//!
//! An intrusive link living inside `TopicHub` itself would need `advertise`
//! to splice the hub into a list protected by the same critical section as
//! its own subscriber list, but `TopicHub::new` is a `const fn` with no safe
//! way to thread such a link through at compile time. A
//! `Mutex<Vec<&'static TopicHub>>` gives the same guarantee instead: one
//! serialization point, ordered by advertise time.

use crate::hub::TopicHub;
use std::sync::Mutex;
use umcn_pal::CriticalSection;

static REGISTRY: Mutex<Vec<&'static TopicHub>> = Mutex::new(Vec::new());

/// Appends `hub` to the registry. Only called from `advertise`, which
/// passes proof the critical section is held so registration and the
/// hub's own state transition observe the same ordering.
pub(crate) fn register(hub: &'static TopicHub, _cs: &CriticalSection) {
    let mut registry = REGISTRY.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    registry.push(hub);
}

/// A cursor over the registry, yielding hubs in advertise order.
pub struct RegistryCursor {
    index: usize,
}

impl RegistryCursor {
    /// Returns the next hub, or `None` once the cursor has walked past the
    /// last advertised topic.
    pub fn next(&mut self) -> Option<&'static TopicHub> {
        let registry = REGISTRY.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let hub = registry.get(self.index).copied();
        self.index += 1;
        hub
    }
}

/// Returns a cursor positioned before the first advertised topic.
pub fn list_cursor() -> RegistryCursor {
    RegistryCursor { index: 0 }
}

/// Invokes `f` once per currently-registered hub, in advertise order.
pub fn for_each(mut f: impl FnMut(&'static TopicHub)) {
    let mut cursor = list_cursor();
    while let Some(hub) = cursor.next() {
        f(hub);
    }
}

/// Looks up an advertised topic by name. Used by the `mcn` shell command,
/// which addresses topics by their `define_topic!` name rather than by a
/// handle.
pub fn find(name: &str) -> Option<&'static TopicHub> {
    let mut result = None;
    for_each(|hub| {
        if result.is_none() && hub.name() == name {
            result = Some(hub);
        }
    });
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::define_topic;

    define_topic!(REGISTRY_TEST_TOPIC, 1);

    #[test]
    fn list_cursor_yields_none_past_the_end() {
        REGISTRY_TEST_TOPIC.advertise(None).unwrap();
        let mut cursor = list_cursor();
        let mut seen_our_topic = false;
        loop {
            match cursor.next() {
                Some(hub) if core::ptr::eq(hub, &REGISTRY_TEST_TOPIC) => seen_our_topic = true,
                Some(_) => continue,
                None => break,
            }
        }
        assert!(seen_our_topic);
    }

    define_topic!(ORDER_A, 1);
    define_topic!(ORDER_B, 1);
    define_topic!(ORDER_C, 1);

    #[test]
    fn enumeration_follows_advertise_order() {
        ORDER_A.advertise(None).unwrap();
        ORDER_B.advertise(None).unwrap();
        ORDER_C.advertise(None).unwrap();

        // Other tests advertise their own hubs into the same process-wide
        // registry, so filter down to the three declared above before
        // checking their relative order.
        let mut seen = Vec::new();
        for_each(|hub| {
            if core::ptr::eq(hub, &ORDER_A) || core::ptr::eq(hub, &ORDER_B) || core::ptr::eq(hub, &ORDER_C) {
                seen.push(hub.name());
            }
        });

        assert_eq!(seen, vec!["ORDER_A", "ORDER_B", "ORDER_C"]);

        // a fresh cursor re-reads the same order
        let mut cursor = list_cursor();
        let mut seen_again = Vec::new();
        while let Some(hub) = cursor.next() {
            if core::ptr::eq(hub, &ORDER_A) || core::ptr::eq(hub, &ORDER_B) || core::ptr::eq(hub, &ORDER_C) {
                seen_again.push(hub.name());
            }
        }
        assert_eq!(seen, seen_again);
    }
}
