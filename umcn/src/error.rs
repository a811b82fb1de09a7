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

//! Error types returned by the uMCN control surface.
//!
//! Every fallible operation returns one of these small `Copy` enums rather
//! than throwing: a hand-written `Display` plus an empty `impl
//! std::error::Error` rather than a derive macro crate.

use core::fmt;

/// Failure modes of [`crate::hub::TopicHub::advertise`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertiseError {
    /// The hub was already advertised; `advertise` may only succeed once.
    Already,
    /// The payload buffer could not be allocated. Unreachable with Rust's
    /// global allocator, which aborts the process on allocation failure
    /// instead of returning an error; kept so the interface still matches
    /// targets whose allocator can report `OutOfMemory`.
    OutOfMemory,
}

impl fmt::Display for AdvertiseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Already => write!(f, "topic is already advertised"),
            Self::OutOfMemory => write!(f, "out of memory while advertising topic"),
        }
    }
}

impl std::error::Error for AdvertiseError {}

/// Failure modes of [`crate::hub::TopicHub::publish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishError {
    /// The hub has not been advertised yet.
    NotAdvertised,
    /// The hub is currently suspended; the publish was dropped.
    Suspended,
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAdvertised => write!(f, "topic is not advertised"),
            Self::Suspended => write!(f, "topic is suspended"),
        }
    }
}

impl std::error::Error for PublishError {}

/// Failure modes of [`crate::hub::TopicHub::copy`] and
/// [`crate::hub::TopicHub::copy_from_hub`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyError {
    /// The topic has never been published, or is not advertised.
    NotReady,
}

impl fmt::Display for CopyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady => write!(f, "topic has not been published yet"),
        }
    }
}

impl std::error::Error for CopyError {}

/// Failure modes of [`crate::hub::TopicHub::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsubscribeError {
    /// The node is not linked into this hub's subscriber list. Idempotent
    /// from the caller's point of view: the list is unchanged.
    NotFound,
}

impl fmt::Display for UnsubscribeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "subscriber node not found on this topic"),
        }
    }
}

impl std::error::Error for UnsubscribeError {}

/// Failure modes of [`crate::hub::TopicHub::invoke_echo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoError {
    /// The hub was advertised without an echo function.
    NotConfigured,
    /// The echo function's own `copy_from_hub` call failed.
    NotReady,
}

impl fmt::Display for EchoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "there is no topic echo function defined"),
            Self::NotReady => write!(f, "topic has not been published yet"),
        }
    }
}

impl std::error::Error for EchoError {}

impl From<CopyError> for EchoError {
    fn from(_: CopyError) -> Self {
        EchoError::NotReady
    }
}
