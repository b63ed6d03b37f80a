// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Search-index sink: submits each record as a JSON document to a
//! date-partitioned index over HTTP.
//!
//! Submission is best-effort: a timeout or a rejected request is logged as a
//! warning and the record is dropped for this sink only. Hosts are rotated
//! round-robin per submission.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::errors::{ConfigError, SinkError};
use crate::hostname::get_hostname;
use crate::record::Record;

use super::Observer;

const SUBMIT_TIMEOUT: Duration = Duration::from_secs(2);

/// Key prefix applied when the configuration names no type.
pub const DEFAULT_TYPE_NAME: &str = "echo_xrdrpt";

const FALLBACK_HOST: &str = "http://localhost:9200";

pub struct ElasticSearchObserver {
    hosts: Vec<String>,
    type_name: String,
    reporthost: String,
    client: reqwest::Client,
    cursor: AtomicUsize,
}

impl ElasticSearchObserver {
    pub fn new(hosts: Vec<String>, type_name: String) -> Result<Self, ConfigError> {
        let hosts = if hosts.is_empty() {
            vec![FALLBACK_HOST.to_string()]
        } else {
            hosts.into_iter().map(normalize_host).collect()
        };
        let client = reqwest::Client::builder()
            .timeout(SUBMIT_TIMEOUT)
            .build()
            .map_err(ConfigError::HttpClient)?;
        Ok(ElasticSearchObserver {
            hosts,
            type_name,
            reporthost: get_hostname(),
            client,
            cursor: AtomicUsize::new(0),
        })
    }

    fn url(&self) -> String {
        let host = &self.hosts[self.cursor.fetch_add(1, Ordering::Relaxed) % self.hosts.len()];
        let day = chrono::Local::now().format("%Y.%m.%d");
        format!("{host}/logstash-{day}/doc/")
    }

    /// Build the document: every record key prefixed with the type name,
    /// plus the resolving host, the type tag, and a zoned timestamp.
    fn prepare(&self, record: &Record) -> Result<serde_json::Value, SinkError> {
        let mut doc = serde_json::Map::new();
        for (key, value) in record {
            doc.insert(format!("{}_{key}", self.type_name), serde_json::to_value(value)?);
        }
        doc.insert(
            format!("{}_reporthost", self.type_name),
            serde_json::Value::String(self.reporthost.clone()),
        );
        doc.insert(
            "type".to_string(),
            serde_json::Value::String(self.type_name.clone()),
        );
        doc.insert(
            "@timestamp".to_string(),
            serde_json::Value::String(
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%z").to_string(),
            ),
        );
        Ok(serde_json::Value::Object(doc))
    }
}

#[async_trait]
impl Observer for ElasticSearchObserver {
    async fn serve(&self, record: &Record) -> Result<(), SinkError> {
        let url = self.url();
        let doc = self.prepare(record)?;
        debug!("submitting record to search index at {url}");
        match self.client.post(&url).json(&doc).send().await {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => warn!("search index rejected submission: {}", response.status()),
            Err(err) if err.is_timeout() => warn!("search index submission hit timeout"),
            Err(err) => warn!("search index submission failed: {err}"),
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("ElasticSearch({} hosts, {})", self.hosts.len(), self.type_name)
    }
}

fn normalize_host(host: String) -> String {
    if host.contains("://") {
        host
    } else {
        format!("http://{host}")
    }
}
