// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for the collector.
//!
//! Nothing here is fatal to the listener: decode and pipeline errors abort a
//! single datagram, sink errors are scoped to the failing sink. The only
//! fatal class is [`ConfigError`], raised at startup before serving begins.

use std::time::Duration;

/// A report payload could not be decoded into a record.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("report is not well-formed XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("stats section is missing its id attribute")]
    MissingSectionId,

    #[error("element '{0}' has no text content")]
    EmptyElement(String),
}

/// A datagram failed somewhere between decode and dispatch.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to decode report: {0}")]
    Decode(#[from] DecodeError),

    #[error("report is missing the 'src' attribute")]
    MissingSourceKey,

    #[error("report timestamp 'tod' is missing or not numeric")]
    MissingTimestamp,
}

/// A sink failed to accept or transmit a record.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("http submission failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("submission exceeded its {0:?} deadline")]
    Timeout(Duration),

    #[error("failed to encode record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("record cannot be shipped: {0}")]
    MalformedRecord(String),

    #[error("backend rejected submission: {0}")]
    Rejected(String),
}

/// Startup-time configuration problems. These are the only fatal errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid filter pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("observer '{observer}' is missing required parameter '{param}'")]
    MissingParam {
        observer: &'static str,
        param: String,
    },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Load(Box::new(err))
    }
}
