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

//! uMCN: an in-process publish/subscribe topic bus for embedded real-time
//! systems.
//!
//! A small, fixed set of topics is declared at compile time with
//! [`define_topic`], each becoming a module-scope [`TopicHub`]. A topic is
//! [`TopicHub::advertise`]d once, then published to and subscribed from any
//! number of tasks. Subscribers choose how they want to find out about new
//! data: poll a renewal flag, block on a wakeup event with a timeout, or
//! register a callback invoked inline from the publisher.
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use umcn::define_topic;
//!
//! define_topic!(TEMPERATURE_C, 4);
//!
//! TEMPERATURE_C.advertise(None).unwrap();
//!
//! let event = Arc::new(umcn::Event::new());
//! let subscriber = TEMPERATURE_C.subscribe(Some(event), None).unwrap();
//!
//! TEMPERATURE_C.publish(&21.5f32.to_le_bytes()).unwrap();
//! assert!(subscriber.poll_sync(Duration::from_millis(100)));
//!
//! let mut buf = [0u8; 4];
//! subscriber.copy(&mut buf).unwrap();
//! assert_eq!(f32::from_le_bytes(buf), 21.5);
//! ```

pub mod error;
pub mod frequency;
mod hub;
mod macros;
mod node;
pub mod registry;
pub mod runtime;

pub mod limits;

pub use error::{AdvertiseError, CopyError, EchoError, PublishError, UnsubscribeError};
pub use hub::{EchoFn, TopicHub};
pub use node::{PublishCallback, SubscriberHandle};
pub use registry::{find, RegistryCursor};
pub use runtime::init;
pub use umcn_pal::Event;

/// Re-exports the commonly used names in one place for `use umcn::prelude::*;`.
pub mod prelude {
    pub use crate::error::{AdvertiseError, CopyError, EchoError, PublishError, UnsubscribeError};
    pub use crate::hub::{EchoFn, TopicHub};
    pub use crate::node::{PublishCallback, SubscriberHandle};
    pub use crate::registry::{self, find, RegistryCursor};
    pub use crate::runtime::init;
    pub use crate::define_topic;
    pub use umcn_pal::Event;
}
