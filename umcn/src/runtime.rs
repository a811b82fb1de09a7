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

//! Process-wide bus startup.

use crate::frequency;
use std::sync::OnceLock;
use std::time::Duration;
use umcn_pal::PeriodicTimer;

static ESTIMATOR: OnceLock<PeriodicTimer> = OnceLock::new();

/// Starts the frequency estimator's one-second periodic timer.
///
/// Idempotent: only the first call across the process has any effect.
/// Call this once during startup, before relying on
/// [`crate::hub::TopicHub::frequency_hz`].
pub fn init() {
    ESTIMATOR.get_or_init(|| PeriodicTimer::start("mcn_freq_est", Duration::from_secs(1), frequency::tick));
}
