// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Collector configuration.
//!
//! Configuration is layered through Figment: a YAML file (when given) merged
//! with `XRD_`-prefixed environment variables, environment winning. Nested
//! keys use `__` in the environment, e.g. `XRD_SERVER__PORT=12036`.
//!
//! Observer sections live under `observers:` and are tagged by their
//! `observer:` key; a section is only materialized when `enabled: true`.
//!
//! ```yaml
//! server:
//!   address: 0.0.0.0
//!   port: 2036
//! deltas: true
//! include_fields: ".*"
//! exclude_fields: ""
//! observers:
//!   summary:
//!     observer: summary_logger
//!     enabled: true
//!     level: info
//!   tsdb:
//!     observer: influx_db
//!     enabled: true
//!     measurement: xrootd
//!     api: v2
//!     url: http://localhost:8086
//!     org: example
//!     bucket: xrd
//!     token_env: XRD_INFLUX_TOKEN
//! ```

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, error, info, trace, warn};

use crate::augment::SiteRule;
use crate::errors::ConfigError;
use crate::observer::influx::InfluxApi;

pub const DEFAULT_PORT: u16 = 2036;

const ENV_PREFIX: &str = "XRD_";

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    /// Also calculate derivatives between measurements.
    #[serde(default)]
    pub deltas: bool,

    /// Comma-separated anchored patterns selecting keys to keep.
    #[serde(default = "default_include_fields")]
    pub include_fields: String,

    /// Comma-separated anchored patterns selecting keys to drop.
    #[serde(default)]
    pub exclude_fields: String,

    /// Evict sources that have not reported within this many seconds.
    /// Unset keeps baselines for the process lifetime.
    #[serde(default)]
    pub source_stale_after_secs: Option<u64>,

    /// Deployment-specific augmentation rules, applied after filtering.
    #[serde(default)]
    pub site_rules: Vec<SiteRule>,

    #[serde(default)]
    pub observers: IndexMap<String, ObserverSection>,
}

impl Config {
    /// Load configuration from an optional YAML file plus the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        let config: Config = figment.extract()?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig::default(),
            deltas: false,
            include_fields: default_include_fields(),
            exclude_fields: String::new(),
            source_stale_after_secs: None,
            site_rules: Vec::new(),
            observers: IndexMap::new(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            address: default_address(),
            port: DEFAULT_PORT,
        }
    }
}

/// One named observer section: an enabled flag plus the tagged parameters.
#[derive(Clone, Debug, Deserialize)]
pub struct ObserverSection {
    #[serde(default)]
    pub enabled: bool,
    #[serde(flatten)]
    pub observer: ObserverKind,
}

/// The closed set of observer kinds, tagged by the `observer:` key.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "observer", rename_all = "snake_case")]
pub enum ObserverKind {
    Logger {
        level: LogLevel,
    },
    SummaryLogger {
        level: LogLevel,
        #[serde(default)]
        fields: Option<Vec<String>>,
    },
    File {
        filename: PathBuf,
    },
    ElasticSearch {
        #[serde(default)]
        hosts: Vec<String>,
        #[serde(default = "default_type_name")]
        type_name: String,
    },
    InfluxDb {
        measurement: String,
        #[serde(flatten)]
        api: InfluxApi,
    },
}

/// Severity a log observer emits at.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[serde(alias = "TRACE")]
    Trace,
    #[serde(alias = "DEBUG")]
    Debug,
    #[serde(alias = "INFO")]
    Info,
    #[serde(alias = "WARN")]
    Warn,
    #[serde(alias = "ERROR")]
    Error,
}

impl LogLevel {
    /// Emit one message at this level. `tracing` levels are static, hence
    /// the dispatch.
    pub fn emit(self, message: &str) {
        match self {
            LogLevel::Trace => trace!("{message}"),
            LogLevel::Debug => debug!("{message}"),
            LogLevel::Info => info!("{message}"),
            LogLevel::Warn => warn!("{message}"),
            LogLevel::Error => error!("{message}"),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

fn default_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_include_fields() -> String {
    ".*".to_string()
}

fn default_type_name() -> String {
    crate::observer::elastic::DEFAULT_TYPE_NAME.to_string()
}
