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

//! Subscriber node and the handle returned to callers by `subscribe`.

use crate::error::CopyError;
use crate::hub::TopicHub;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use umcn_pal::Event;

/// A caller-supplied function invoked from inside `publish`'s second,
/// critical-section-free walk of the subscriber list.
pub type PublishCallback = Box<dyn Fn(&[u8]) + Send + Sync>;

/// One entry in a topic's intrusive, singly linked subscriber list.
///
/// Linked in as a raw pointer rather than behind `Arc`/`Box` ownership on
/// the hub side: the hub only ever borrows the node for the lifetime of a
/// critical section, and the corresponding [`SubscriberHandle`] is the sole
/// owner, freed by `unsubscribe`.
pub(crate) struct SubscriberNode {
    pub(crate) renewal: AtomicBool,
    pub(crate) event: Option<Arc<Event>>,
    pub(crate) pub_cb: Option<PublishCallback>,
    pub(crate) next: *mut SubscriberNode,
}

impl SubscriberNode {
    pub(crate) fn new(event: Option<Arc<Event>>, pub_cb: Option<PublishCallback>) -> Box<Self> {
        Box::new(Self {
            renewal: AtomicBool::new(false),
            event,
            pub_cb,
            next: core::ptr::null_mut(),
        })
    }
}

// SAFETY: a `SubscriberNode` is only ever reached through a hub's critical
// section or through the `SubscriberHandle` that owns it; nothing relies on
// thread-local state.
unsafe impl Send for SubscriberNode {}
unsafe impl Sync for SubscriberNode {}

/// An opaque subscription, returned by [`TopicHub::subscribe`].
///
/// Consumed by [`TopicHub::unsubscribe`]; every other operation borrows it.
pub struct SubscriberHandle {
    pub(crate) hub: &'static TopicHub,
    pub(crate) node: *mut SubscriberNode,
}

// SAFETY: the handle is a thin reference to heap state that is itself
// `Send + Sync` (see `SubscriberNode` above).
unsafe impl Send for SubscriberHandle {}
unsafe impl Sync for SubscriberHandle {}

impl SubscriberHandle {
    /// The topic this subscription belongs to.
    pub fn hub(&self) -> &'static TopicHub {
        self.hub
    }

    /// Non-blocking poll of the renewal flag: `true` if the topic has been
    /// published since the last `copy`/`clear`.
    pub fn poll(&self) -> bool {
        unsafe { &*self.node }.renewal.load(Ordering::Acquire)
    }

    /// Blocks up to `timeout` for a publish to land on this subscription.
    ///
    /// # Panics
    ///
    /// Panics if this subscription was not created with a wakeup event
    /// (i.e. `subscribe` was called with `event: None`); waiting
    /// synchronously on a callback-only subscription is a programmer error.
    pub fn poll_sync(&self, timeout: Duration) -> bool {
        let event = unsafe { &*self.node }
            .event
            .as_ref()
            .expect("poll_sync requires a subscription created with a wakeup event");
        event.wait_timeout(timeout)
    }

    /// Copies the topic's current payload into `buf` and clears the renewal
    /// flag. `buf` must be exactly the topic's payload size.
    pub fn copy(&self, buf: &mut [u8]) -> Result<(), CopyError> {
        self.hub.copy(self, buf)
    }

    /// Clears the renewal flag without reading the payload.
    pub fn clear(&self) {
        unsafe { &*self.node }.renewal.store(false, Ordering::Release);
    }
}
