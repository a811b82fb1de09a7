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

//! The topic hub: a statically allocated publish/subscribe channel.

use crate::error::{AdvertiseError, CopyError, EchoError, PublishError, UnsubscribeError};
use crate::limits::{MAX_LINK_NUM, WINDOW_LEN};
use crate::node::{PublishCallback, SubscriberHandle, SubscriberNode};
use crate::registry;
use log::warn;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use umcn_pal::{CriticalSection, Event};

/// A topic's echo function: formats and prints (or otherwise surfaces) the
/// topic's current payload. Installed at `advertise` time, invoked by
/// `invoke_echo`.
pub type EchoFn = fn(&TopicHub) -> Result<(), EchoError>;

struct HubState {
    payload: Option<Box<[u8]>>,
    head: *mut SubscriberNode,
    tail: *mut SubscriberNode,
    count: u32,
    echo: Option<EchoFn>,
}

/// A statically declared topic.
///
/// Every field that participates in the publish/subscribe protocol lives
/// behind either an atomic (for the handful of fields that only ever need
/// to be read racily and advisorially: `suspended`, a node's `renewal`
/// flag, the per-second frequency buckets) or an [`UnsafeCell`] reached
/// only through a held [`CriticalSection`]. There is no per-hub lock: every hub
/// in the process serializes through the same global critical section,
/// mirroring a single scheduler-disable primitive rather than per-object
/// mutexes.
pub struct TopicHub {
    name: &'static str,
    payload_size: usize,
    advertised: AtomicBool,
    suspended: AtomicBool,
    published_once: AtomicBool,
    freq_window: [AtomicU16; WINDOW_LEN],
    freq_index: AtomicUsize,
    freq_hz_bits: AtomicU32,
    state: UnsafeCell<HubState>,
}

// SAFETY: every access to `state` goes through `state_mut`, which requires
// a `&CriticalSection` proving the global lock is held.
unsafe impl Sync for TopicHub {}

impl std::fmt::Debug for TopicHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicHub")
            .field("name", &self.name)
            .field("payload_size", &self.payload_size)
            .field("advertised", &self.is_advertised())
            .field("suspended", &self.is_suspended())
            .finish()
    }
}

// `WINDOW_LEN` is a fixed constant, not runtime configuration, so the
// window array is spelled out rather than built generically.
const _: () = assert!(WINDOW_LEN == 5, "freq_window literal must match WINDOW_LEN");

impl TopicHub {
    /// Builds a topic hub in its initial, unadvertised state. `const fn` so
    /// a hub can be declared as a `static`; see [`crate::define_topic`].
    pub const fn new(name: &'static str, payload_size: usize) -> Self {
        Self {
            name,
            payload_size,
            advertised: AtomicBool::new(false),
            suspended: AtomicBool::new(false),
            published_once: AtomicBool::new(false),
            freq_window: [
                AtomicU16::new(0),
                AtomicU16::new(0),
                AtomicU16::new(0),
                AtomicU16::new(0),
                AtomicU16::new(0),
            ],
            freq_index: AtomicUsize::new(0),
            freq_hz_bits: AtomicU32::new(0),
            state: UnsafeCell::new(HubState {
                payload: None,
                head: core::ptr::null_mut(),
                tail: core::ptr::null_mut(),
                count: 0,
                echo: None,
            }),
        }
    }

    /// # Safety (not literally `unsafe`, but invariant-bearing)
    ///
    /// Access to hub-internal state is only ever granted alongside proof
    /// that the global critical section is held.
    fn state_mut(&self, _cs: &CriticalSection) -> &mut HubState {
        unsafe { &mut *self.state.get() }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn payload_size(&self) -> usize {
        self.payload_size
    }

    pub fn is_advertised(&self) -> bool {
        self.advertised.load(Ordering::Acquire)
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::Relaxed)
    }

    pub fn has_published(&self) -> bool {
        self.published_once.load(Ordering::Acquire)
    }

    /// Current estimate of publish rate in Hz, averaged over the last
    /// [`WINDOW_LEN`] seconds.
    pub fn frequency_hz(&self) -> f32 {
        f32::from_bits(self.freq_hz_bits.load(Ordering::Relaxed))
    }

    pub fn subscriber_count(&self) -> u32 {
        let cs = CriticalSection::enter();
        self.state_mut(&cs).count
    }

    pub fn has_echo(&self) -> bool {
        let cs = CriticalSection::enter();
        self.state_mut(&cs).echo.is_some()
    }

    /// Allocates the payload buffer and installs the (optional) echo
    /// function. May only succeed once per hub.
    pub fn advertise(&'static self, echo: Option<EchoFn>) -> Result<(), AdvertiseError> {
        if self.advertised.load(Ordering::Acquire) {
            return Err(AdvertiseError::Already);
        }

        // Allocated outside the critical section so a failed or slow
        // allocation never holds up every other hub in the process.
        let payload = vec![0u8; self.payload_size].into_boxed_slice();

        let cs = CriticalSection::enter();
        if self.advertised.load(Ordering::Acquire) {
            return Err(AdvertiseError::Already);
        }

        let state = self.state_mut(&cs);
        state.payload = Some(payload);
        state.echo = echo;
        for bucket in &self.freq_window {
            bucket.store(0, Ordering::Relaxed);
        }
        self.freq_index.store(0, Ordering::Relaxed);
        self.freq_hz_bits.store(0, Ordering::Relaxed);

        registry::register(self, &cs);
        self.advertised.store(true, Ordering::Release);

        Ok(())
    }

    /// Links a new subscriber node into the list. At least one of `event`
    /// or `pub_cb` should be provided for the subscription to be useful,
    /// but neither is required: a subscriber that only ever calls `poll`
    /// needs neither.
    ///
    /// Returns `None` if the topic already has [`MAX_LINK_NUM`] subscribers.
    ///
    /// If the topic has already been published at least once, the new
    /// subscriber catches up immediately: its renewal flag is set and, if
    /// it has a callback, the callback is invoked with the current payload
    /// before `subscribe` returns.
    pub fn subscribe(
        &'static self,
        event: Option<Arc<Event>>,
        pub_cb: Option<PublishCallback>,
    ) -> Option<SubscriberHandle> {
        let cs = CriticalSection::enter();
        let state = self.state_mut(&cs);

        if state.count >= MAX_LINK_NUM {
            drop(cs);
            warn!(
                "uMCN: topic '{}' already has {} subscribers, rejecting subscribe",
                self.name, MAX_LINK_NUM
            );
            return None;
        }

        let node = Box::into_raw(SubscriberNode::new(event, pub_cb));
        if state.tail.is_null() {
            state.head = node;
            state.tail = node;
        } else {
            unsafe { (*state.tail).next = node };
            state.tail = node;
        }
        state.count += 1;
        drop(cs);

        let handle = SubscriberHandle { hub: self, node };

        if self.published_once.load(Ordering::Acquire) {
            let snapshot = {
                let cs = CriticalSection::enter();
                let state = self.state_mut(&cs);
                state
                    .payload
                    .as_deref()
                    .expect("published_once implies payload present")
                    .to_vec()
            };

            let node_ref = unsafe { &*node };
            node_ref.renewal.store(true, Ordering::Release);
            if let Some(event) = node_ref.event.as_ref() {
                event.signal();
            }
            if let Some(cb) = node_ref.pub_cb.as_ref() {
                cb(&snapshot);
            }
        }

        Some(handle)
    }

    /// Unlinks and frees a subscriber node. Returns
    /// [`UnsubscribeError::NotFound`], leaving the list unchanged, if the
    /// handle is not (or no longer) linked into this hub - calling
    /// `unsubscribe` twice on the same handle is the common way to observe
    /// this.
    pub fn unsubscribe(&'static self, handle: SubscriberHandle) -> Result<(), UnsubscribeError> {
        assert!(
            core::ptr::eq(handle.hub, self),
            "subscriber handle does not belong to this topic"
        );
        let target = handle.node;

        let cs = CriticalSection::enter();
        let state = self.state_mut(&cs);

        let mut prev: *mut SubscriberNode = core::ptr::null_mut();
        let mut cur = state.head;
        while !cur.is_null() && cur != target {
            prev = cur;
            cur = unsafe { (*cur).next };
        }

        if cur.is_null() {
            return Err(UnsubscribeError::NotFound);
        }

        let next = unsafe { (*cur).next };
        if prev.is_null() {
            state.head = next;
        } else {
            unsafe { (*prev).next = next };
        }
        if state.tail == cur {
            state.tail = prev;
        }
        state.count -= 1;
        drop(cs);

        // SAFETY: `cur` was just unlinked from the list above, so this is
        // the only remaining reference to it.
        drop(unsafe { Box::from_raw(cur) });

        Ok(())
    }

    /// Copies `data` into the hub's payload and marks every subscriber
    /// renewed. Callback subscribers are invoked afterwards, outside the
    /// critical section, with the just-published bytes - a callback may
    /// unsubscribe its own node but must not otherwise mutate the list.
    pub fn publish(&self, data: &[u8]) -> Result<(), PublishError> {
        debug_assert_eq!(
            data.len(),
            self.payload_size,
            "publish buffer must match the topic's declared payload size"
        );

        if !self.advertised.load(Ordering::Acquire) {
            return Err(PublishError::NotAdvertised);
        }
        if self.suspended.load(Ordering::Acquire) {
            return Err(PublishError::Suspended);
        }

        // Advisory frequency counter, bumped before the critical section:
        // racy with the estimator's own window advance by design, kept
        // atomic so the race stays advisory instead of undefined.
        let index = self.freq_index.load(Ordering::Relaxed);
        self.freq_window[index].fetch_add(1, Ordering::Relaxed);

        let cs = CriticalSection::enter();
        if self.suspended.load(Ordering::Acquire) {
            return Err(PublishError::Suspended);
        }

        let state = self.state_mut(&cs);
        let payload = state
            .payload
            .as_deref_mut()
            .expect("advertised implies payload is allocated");
        payload.copy_from_slice(data);

        let mut node = state.head;
        while !node.is_null() {
            let n = unsafe { &*node };
            n.renewal.store(true, Ordering::Release);
            if let Some(event) = n.event.as_ref() {
                event.signal();
            }
            node = n.next;
        }

        self.published_once.store(true, Ordering::Release);
        let first = state.head;
        drop(cs);

        let mut node = first;
        while !node.is_null() {
            let n = unsafe { &*node };
            let next = n.next;
            if let Some(cb) = n.pub_cb.as_ref() {
                cb(data);
            }
            node = next;
        }

        Ok(())
    }

    pub(crate) fn copy(&self, handle: &SubscriberHandle, buf: &mut [u8]) -> Result<(), CopyError> {
        assert!(
            core::ptr::eq(handle.hub, self),
            "subscriber handle does not belong to this topic"
        );

        let cs = CriticalSection::enter();
        if !self.published_once.load(Ordering::Acquire) {
            return Err(CopyError::NotReady);
        }
        let state = self.state_mut(&cs);
        let payload = state
            .payload
            .as_deref()
            .expect("published_once implies payload present");
        buf.copy_from_slice(payload);
        unsafe { &*handle.node }
            .renewal
            .store(false, Ordering::Release);

        Ok(())
    }

    /// Copies the current payload into `buf` without going through a
    /// subscription. Used by `invoke_echo` and by callers (e.g. the CLI)
    /// that only ever poll the latest value.
    pub fn copy_from_hub(&self, buf: &mut [u8]) -> Result<(), CopyError> {
        let cs = CriticalSection::enter();
        if !self.published_once.load(Ordering::Acquire) {
            return Err(CopyError::NotReady);
        }
        let state = self.state_mut(&cs);
        let payload = state
            .payload
            .as_deref()
            .expect("published_once implies payload present");
        buf.copy_from_slice(payload);
        Ok(())
    }

    /// Stops delivering publishes: `publish` returns
    /// [`PublishError::Suspended`] and subscribers see no renewals until
    /// [`TopicHub::resume`].
    pub fn suspend(&self) {
        self.suspended.store(true, Ordering::Release);
    }

    pub fn resume(&self) {
        self.suspended.store(false, Ordering::Release);
    }

    /// Runs the topic's installed echo function, if any.
    pub fn invoke_echo(&self) -> Result<(), EchoError> {
        let echo_fn = {
            let cs = CriticalSection::enter();
            self.state_mut(&cs).echo
        };
        match echo_fn {
            Some(f) => f(self),
            None => Err(EchoError::NotConfigured),
        }
    }

    /// Recomputes `frequency_hz` from the current window and advances the
    /// window by one bucket. Called once per second by
    /// [`crate::runtime::init`]'s background timer; exposed at `pub(crate)`
    /// visibility only for the estimator and its tests.
    pub(crate) fn advance_frequency_window(&self) {
        let count: u32 = self
            .freq_window
            .iter()
            .map(|bucket| bucket.load(Ordering::Relaxed) as u32)
            .sum();
        let hz = count as f32 / WINDOW_LEN as f32;
        self.freq_hz_bits.store(hz.to_bits(), Ordering::Relaxed);

        let index = self.freq_index.load(Ordering::Relaxed);
        let next = (index + 1) % WINDOW_LEN;
        self.freq_window[next].store(0, Ordering::Relaxed);
        self.freq_index.store(next, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::define_topic;
    use std::sync::atomic::AtomicU32 as TestCounter;
    use std::sync::Mutex;
    use std::time::Duration;

    define_topic!(TEST_SCALAR, 4);

    fn encode(v: u32) -> [u8; 4] {
        v.to_le_bytes()
    }

    fn decode(buf: &[u8]) -> u32 {
        u32::from_le_bytes(buf.try_into().unwrap())
    }

    #[test]
    fn publish_before_advertise_fails() {
        define_topic!(NOT_ADVERTISED, 4);
        assert_eq!(
            NOT_ADVERTISED.publish(&encode(1)),
            Err(PublishError::NotAdvertised)
        );
    }

    #[test]
    fn copy_before_any_publish_is_not_ready() {
        define_topic!(NEVER_PUBLISHED, 4);
        NEVER_PUBLISHED.advertise(None).unwrap();
        let handle = NEVER_PUBLISHED.subscribe(None, None).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(handle.copy(&mut buf), Err(CopyError::NotReady));
    }

    #[test]
    fn subscribe_catches_up_on_last_published_value() {
        define_topic!(CATCH_UP, 4);
        CATCH_UP.advertise(None).unwrap();
        CATCH_UP.publish(&encode(42)).unwrap();

        let handle = CATCH_UP.subscribe(None, None).unwrap();
        assert!(handle.poll());
        let mut buf = [0u8; 4];
        handle.copy(&mut buf).unwrap();
        assert_eq!(decode(&buf), 42);
    }

    #[test]
    fn copy_clears_the_renewal_flag() {
        define_topic!(CLEAR_ON_COPY, 4);
        CLEAR_ON_COPY.advertise(None).unwrap();
        let handle = CLEAR_ON_COPY.subscribe(None, None).unwrap();
        CLEAR_ON_COPY.publish(&encode(7)).unwrap();

        assert!(handle.poll());
        let mut buf = [0u8; 4];
        handle.copy(&mut buf).unwrap();
        assert!(!handle.poll());
    }

    #[test]
    fn suspend_drops_publishes_until_resumed() {
        define_topic!(SUSPENDABLE, 4);
        SUSPENDABLE.advertise(None).unwrap();
        SUSPENDABLE.suspend();

        assert_eq!(SUSPENDABLE.publish(&encode(1)), Err(PublishError::Suspended));
        assert!(!SUSPENDABLE.has_published());

        SUSPENDABLE.resume();
        assert!(SUSPENDABLE.publish(&encode(1)).is_ok());
    }

    #[test]
    fn unsubscribe_shrinks_the_subscriber_count() {
        define_topic!(SHRINKING, 4);
        SHRINKING.advertise(None).unwrap();
        let h1 = SHRINKING.subscribe(None, None).unwrap();
        let _h2 = SHRINKING.subscribe(None, None).unwrap();
        assert_eq!(SHRINKING.subscriber_count(), 2);

        SHRINKING.unsubscribe(h1).unwrap();
        assert_eq!(SHRINKING.subscriber_count(), 1);
    }

    #[test]
    fn subscribe_rejects_past_capacity() {
        define_topic!(AT_CAPACITY, 4);
        AT_CAPACITY.advertise(None).unwrap();

        let mut handles = Vec::new();
        for _ in 0..MAX_LINK_NUM {
            handles.push(AT_CAPACITY.subscribe(None, None).unwrap());
        }
        assert!(AT_CAPACITY.subscribe(None, None).is_none());

        // capacity frees up again after an unsubscribe
        let freed = handles.pop().unwrap();
        AT_CAPACITY.unsubscribe(freed).unwrap();
        assert!(AT_CAPACITY.subscribe(None, None).is_some());
    }

    #[test]
    fn publish_callback_receives_the_published_bytes() {
        define_topic!(CALLBACK_TOPIC, 4);
        CALLBACK_TOPIC.advertise(None).unwrap();

        let seen = Arc::new(TestCounter::new(0));
        let seen_cb = seen.clone();
        let _handle = CALLBACK_TOPIC
            .subscribe(
                None,
                Some(Box::new(move |data: &[u8]| {
                    seen_cb.store(decode(data), Ordering::SeqCst);
                })),
            )
            .unwrap();

        CALLBACK_TOPIC.publish(&encode(99)).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 99);
    }

    #[test]
    fn callback_can_unsubscribe_itself_during_publish() {
        define_topic!(SELF_UNSUB, 4);
        SELF_UNSUB.advertise(None).unwrap();

        // The self-unsubscribing subscriber stashes its own handle in a
        // slot right after `subscribe` returns, the same pattern used by
        // the `count` topic callback in `demos/basic-pubsub`, so the
        // closure can reach back into the handle it was given.
        let self_handle: Arc<Mutex<Option<SubscriberHandle>>> = Arc::new(Mutex::new(None));
        let slot = self_handle.clone();
        let self_unsub_hub = &SELF_UNSUB;

        let seen_self = Arc::new(TestCounter::new(0));
        let seen_other = Arc::new(TestCounter::new(0));
        let a = seen_self.clone();
        let b = seen_other.clone();

        let h1 = SELF_UNSUB
            .subscribe(
                None,
                Some(Box::new(move |d| {
                    a.fetch_add(1, Ordering::SeqCst);
                    assert_eq!(decode(d), 5);
                    if let Some(handle) = slot.lock().unwrap().take() {
                        self_unsub_hub.unsubscribe(handle).unwrap();
                    }
                })),
            )
            .unwrap();
        *self_handle.lock().unwrap() = Some(h1);

        let _h2 = SELF_UNSUB
            .subscribe(None, Some(Box::new(move |d| b.store(decode(d), Ordering::SeqCst))))
            .unwrap();

        assert_eq!(SELF_UNSUB.subscriber_count(), 2);

        SELF_UNSUB.publish(&encode(5)).unwrap();
        assert_eq!(seen_self.load(Ordering::SeqCst), 1);
        assert_eq!(seen_other.load(Ordering::SeqCst), 5);

        // the self-unsubscribing node is gone; the other subscriber is not
        assert_eq!(SELF_UNSUB.subscriber_count(), 1);

        // a second publish must not invoke the now-unsubscribed callback again
        SELF_UNSUB.publish(&encode(9)).unwrap();
        assert_eq!(seen_self.load(Ordering::SeqCst), 1);
        assert_eq!(seen_other.load(Ordering::SeqCst), 9);
    }

    #[test]
    fn late_callback_subscriber_catches_up_exactly_once() {
        define_topic!(LATE_CALLBACK, 4);
        LATE_CALLBACK.advertise(None).unwrap();
        LATE_CALLBACK.publish(&encode(11)).unwrap();

        let invocations = Arc::new(TestCounter::new(0));
        let seen = invocations.clone();
        let handle = LATE_CALLBACK
            .subscribe(
                None,
                Some(Box::new(move |data: &[u8]| {
                    invocations.fetch_add(1, Ordering::SeqCst);
                    assert_eq!(decode(data), 11);
                })),
            )
            .unwrap();

        assert!(handle.poll());
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn event_is_signaled_on_publish() {
        define_topic!(EVENT_TOPIC, 4);
        EVENT_TOPIC.advertise(None).unwrap();

        let event = Arc::new(Event::new());
        let handle = EVENT_TOPIC.subscribe(Some(event), None).unwrap();

        EVENT_TOPIC.publish(&encode(1)).unwrap();
        assert!(handle.poll_sync(Duration::from_millis(50)));
    }

    #[test]
    fn frequency_window_advances_and_averages() {
        define_topic!(FREQ_TOPIC, 4);
        FREQ_TOPIC.advertise(None).unwrap();

        for i in 0..10u32 {
            FREQ_TOPIC.publish(&encode(i)).unwrap();
            FREQ_TOPIC.advance_frequency_window();
        }

        // 10 publishes spread over a 5-bucket window advanced once per
        // publish: each bucket sees exactly one publish's worth before
        // being zeroed again, so the running sum settles at 1/window.
        assert!(FREQ_TOPIC.frequency_hz() > 0.0);
    }

    #[test]
    fn registering_a_topic_makes_it_visible_to_the_estimator() {
        TEST_SCALAR.advertise(None).unwrap();
        TEST_SCALAR.publish(&encode(1)).unwrap();
        let mut found = false;
        registry::for_each(|hub| {
            if core::ptr::eq(hub, &TEST_SCALAR) {
                found = true;
            }
        });
        assert!(found);
    }
}
