// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Well-known attribute keys of a summary report.

/// Originating server/process, e.g. `host.example.org:1094`.
pub const SRC: &str = "src";
/// Report timestamp, epoch seconds.
pub const TOD: &str = "tod";
/// Reporting program name, e.g. `xrootd`.
pub const PGM: &str = "pgm";
/// Instance name.
pub const INS: &str = "ins";
/// Process id.
pub const PID: &str = "pid";
/// Site name the server belongs to.
pub const SITE: &str = "site";
/// Server version string.
pub const VER: &str = "ver";

pub const INFO_HOST: &str = "info__host";
pub const INFO_PORT: &str = "info__port";
pub const INFO_NAME: &str = "info__name";

/// Keys always treated as dimensional tags by time-series sinks.
pub const TAG_KEYS: [&str; 6] = [INFO_HOST, INFO_PORT, INFO_NAME, SITE, PGM, VER];

/// Keys left out of the field set: the tag set plus keys redundant with it.
pub const FIELD_EXCLUDED_KEYS: [&str; 9] =
    [INFO_HOST, INFO_PORT, INFO_NAME, SITE, PGM, VER, SRC, INS, PID];

/// Elapsed seconds between two reports of the same source.
pub const DELTA_ELAPSED: &str = "delta_s";
/// Prefix of per-key rate-of-change fields.
pub const DELTA_PREFIX: &str = "delta_";
