// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Collector library for XRootD `xrd.report` summary monitoring.
//!
//! Storage servers emit one UDP report per interval; this crate decodes each
//! report into a flat attribute map, filters it, optionally augments it with
//! site-specific tags, computes per-source rates of change, and fans the
//! result out to the configured observers (log, file, search index,
//! time-series database).
//!
//! Delivery is best-effort end to end: UDP is lossy by design, sinks carry
//! short timeouts, and no failure past startup is fatal to the listener.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod augment;
pub mod config;
pub mod decoder;
pub mod delta;
pub mod errors;
pub mod filter;
pub mod hostname;
pub mod keys;
pub mod observer;
pub mod pipeline;
pub mod record;
pub mod server;
