// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Summary log sink: a configured key subset on one line per record.

use async_trait::async_trait;

use crate::config::LogLevel;
use crate::errors::SinkError;
use crate::record::Record;

use super::Observer;

/// Subset logged when the configuration names none.
const DEFAULT_FIELDS: [&str; 10] = [
    "src",
    "pgm",
    "ins",
    "link__num",
    "tod",
    "sgen__toe",
    "delta_s",
    "sgen__et",
    "link__in",
    "delta_link__in",
];

/// Placeholder emitted for keys the record does not carry.
const MISSING: &str = "N/A";

pub struct SummaryLoggerObserver {
    level: LogLevel,
    fields: Vec<String>,
}

impl SummaryLoggerObserver {
    #[must_use]
    pub fn new(level: LogLevel, fields: Option<Vec<String>>) -> Self {
        let fields = fields
            .unwrap_or_else(|| DEFAULT_FIELDS.iter().map(|f| (*f).to_string()).collect());
        SummaryLoggerObserver { level, fields }
    }
}

#[async_trait]
impl Observer for SummaryLoggerObserver {
    async fn serve(&self, record: &Record) -> Result<(), SinkError> {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|field| match record.get(field) {
                Some(value) => format!("{field}={value}"),
                None => format!("{field}={MISSING}"),
            })
            .collect();
        self.level.emit(&parts.join(" "));
        Ok(())
    }

    fn describe(&self) -> String {
        format!("SummaryLogger({})", self.level.as_str().to_uppercase())
    }
}
