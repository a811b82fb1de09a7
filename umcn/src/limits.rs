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

//! Compile-time tunables.
//!
//! `MAX_LINK_NUM` and `WINDOW_LEN` stay plain constants rather than runtime
//! configuration because hub storage is sized against them at definition
//! time, not at `advertise` time.

/// Maximum number of simultaneous subscribers per topic.
pub const MAX_LINK_NUM: u32 = 30;

/// Number of one-second buckets the frequency estimator averages over.
pub const WINDOW_LEN: usize = 5;
