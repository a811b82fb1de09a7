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

/// Declares a topic as a module-scope `static`.
///
/// There is no separate lookup macro for an already-declared topic: the
/// static item this macro declares *is* the handle, addressable by name
/// at the call site.
///
/// ```
/// umcn::define_topic!(COUNTER, 4);
///
/// COUNTER.advertise(None).unwrap();
/// COUNTER.publish(&42u32.to_le_bytes()).unwrap();
/// ```
#[macro_export]
macro_rules! define_topic {
    ($name:ident, $size:expr) => {
        pub static $name: $crate::TopicHub = $crate::TopicHub::new(stringify!($name), $size);
    };
}
