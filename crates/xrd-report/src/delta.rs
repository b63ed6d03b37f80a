// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Per-source delta/rate computation.
//!
//! The tracker keeps the last record seen from every source and, on each
//! subsequent report, emits `delta_s` (elapsed seconds) plus a
//! `delta_{key}` rate for every numeric key present in both snapshots. The
//! whole read-compare-store sequence for a report runs under one lock, so
//! concurrent reports for the same source can never compute against a
//! baseline another worker is about to replace.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::errors::PipelineError;
use crate::keys;
use crate::record::{Record, Value};

struct Snapshot {
    record: Record,
    seen_at: Instant,
}

/// Shared per-source state. One instance lives for the process lifetime and
/// is shared by every pipeline invocation.
pub struct DeltaTracker {
    state: Mutex<HashMap<String, Snapshot>>,
    stale_after: Option<Duration>,
}

impl DeltaTracker {
    /// `stale_after` enables eviction of sources that have not reported
    /// within the given window; `None` keeps baselines forever, matching the
    /// behavior operators have relied on so far.
    #[must_use]
    pub fn new(stale_after: Option<Duration>) -> Self {
        DeltaTracker {
            state: Mutex::new(HashMap::new()),
            stale_after,
        }
    }

    /// Compute deltas for one report and store it as the source's new
    /// baseline.
    ///
    /// The first report from a source is returned unchanged. Keys present
    /// only in the current report produce no delta field. The stored
    /// baseline is always the input record, never the output with its
    /// `delta_*` additions.
    pub fn compute(&self, current: &Record) -> Result<Record, PipelineError> {
        let src = current
            .get(keys::SRC)
            .ok_or(PipelineError::MissingSourceKey)?
            .to_string();

        #[allow(clippy::expect_used)]
        let mut state = self.state.lock().expect("lock poisoned");

        if let Some(stale_after) = self.stale_after {
            let before = state.len();
            state.retain(|_, snapshot| snapshot.seen_at.elapsed() < stale_after);
            if state.len() < before {
                debug!("evicted {} stale source baselines", before - state.len());
            }
        }

        let output = match state.get(&src) {
            None => current.clone(),
            Some(last) => diff(current, &last.record)?,
        };

        state.insert(
            src,
            Snapshot {
                record: current.clone(),
                seen_at: Instant::now(),
            },
        );
        Ok(output)
    }

    /// Stored baseline for a source, if any. Intended for tests and
    /// diagnostics.
    #[must_use]
    pub fn baseline(&self, src: &str) -> Option<Record> {
        #[allow(clippy::expect_used)]
        let state = self.state.lock().expect("lock poisoned");
        state.get(src).map(|snapshot| snapshot.record.clone())
    }

    /// Number of sources currently tracked.
    #[must_use]
    pub fn tracked_sources(&self) -> usize {
        #[allow(clippy::expect_used)]
        let state = self.state.lock().expect("lock poisoned");
        state.len()
    }
}

fn diff(current: &Record, last: &Record) -> Result<Record, PipelineError> {
    let current_tod = numeric(current, keys::TOD).ok_or(PipelineError::MissingTimestamp)?;
    let last_tod = numeric(last, keys::TOD).ok_or(PipelineError::MissingTimestamp)?;
    let elapsed = current_tod - last_tod;

    let mut output = current.clone();
    output.insert(keys::DELTA_ELAPSED.to_string(), Value::Float(elapsed));

    // Elapsed time of zero still shows up in delta_s; only the divisor is
    // clamped to keep the rates finite.
    let divisor = if elapsed == 0.0 { 1.0 } else { elapsed };

    for (key, value) in current {
        let Some(current_value) = value.as_f64() else {
            continue;
        };
        let Some(last_value) = last.get(key).and_then(Value::as_f64) else {
            continue;
        };
        output.insert(
            format!("{}{key}", keys::DELTA_PREFIX),
            Value::Float((current_value - last_value) / divisor),
        );
    }
    Ok(output)
}

fn numeric(record: &Record, key: &str) -> Option<f64> {
    record.get(key).and_then(Value::as_f64)
}
