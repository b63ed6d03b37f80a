// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Resolution of the host name stamped onto outbound records.

use std::env;

use tracing::warn;

/// Get the reporting host name.
///
/// Tries, in order: the `XRD_REPORT_HOSTNAME` override, the standard
/// `HOSTNAME` environment variable, the system hostname, and finally the
/// literal `unknown`.
#[must_use]
pub fn get_hostname() -> String {
    if let Ok(hostname) = env::var("XRD_REPORT_HOSTNAME") {
        if !hostname.is_empty() {
            return hostname;
        }
    }

    if let Ok(hostname) = env::var("HOSTNAME") {
        if !hostname.is_empty() {
            return hostname;
        }
    }

    match nix::unistd::gethostname() {
        Ok(hostname) => {
            if let Some(hostname) = hostname.to_str() {
                if !hostname.is_empty() {
                    return hostname.to_string();
                }
            }
        }
        Err(err) => {
            warn!("failed to get system hostname: {err}");
        }
    }

    warn!("could not determine hostname, using 'unknown'");
    "unknown".to_string()
}
