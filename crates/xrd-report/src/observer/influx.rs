// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Time-series sink: renders each record as one InfluxDB line-protocol line
//! and submits it over the HTTP write API.
//!
//! The record is partitioned into tags (the fixed dimensional key set plus
//! the resolving host) and fields (everything else minus the keys redundant
//! with tags). String field values are quoted, numeric values are not. The
//! line timestamp is the record's `tod` in integer nanoseconds.
//!
//! Both API generations are supported: v1 addresses a database with
//! credentials in the query string, v2 addresses an org/bucket with a token
//! header.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::errors::{ConfigError, SinkError};
use crate::hostname::get_hostname;
use crate::keys;
use crate::record::{Record, Value};

use super::Observer;

const SUBMIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection parameters, keyed by API generation.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "api", rename_all = "lowercase")]
pub enum InfluxApi {
    V1 {
        host: String,
        port: u16,
        username: String,
        password: String,
        database: String,
    },
    V2 {
        url: String,
        org: String,
        bucket: String,
        #[serde(default)]
        token: Option<String>,
        /// Environment variable holding the token, for configurations that
        /// must not embed credentials.
        #[serde(default)]
        token_env: Option<String>,
    },
}

pub struct InfluxDbObserver {
    measurement: String,
    write_url: String,
    token: Option<String>,
    reporthost: String,
    client: reqwest::Client,
    description: String,
}

impl InfluxDbObserver {
    pub fn new(measurement: String, api: InfluxApi) -> Result<Self, ConfigError> {
        let (write_url, token, description) = match api {
            InfluxApi::V1 {
                host,
                port,
                username,
                password,
                database,
            } => {
                let url = format!(
                    "http://{host}:{port}/write?db={database}&u={username}&p={password}&precision=ns"
                );
                let description = format!("InfluxDBv1({host}, {database}, {measurement})");
                (url, None, description)
            }
            InfluxApi::V2 {
                url,
                org,
                bucket,
                token,
                token_env,
            } => {
                let token = match (token, token_env) {
                    (Some(token), _) => token,
                    (None, Some(var)) => std::env::var(&var).map_err(|_| {
                        ConfigError::MissingParam {
                            observer: "influx_db",
                            param: format!("token (environment variable {var} is unset)"),
                        }
                    })?,
                    (None, None) => {
                        return Err(ConfigError::MissingParam {
                            observer: "influx_db",
                            param: "token".to_string(),
                        })
                    }
                };
                let description = format!("InfluxDB2({url}, {bucket}, {measurement})");
                let url =
                    format!("{url}/api/v2/write?org={org}&bucket={bucket}&precision=ns");
                (url, Some(token), description)
            }
        };
        let client = reqwest::Client::builder()
            .timeout(SUBMIT_TIMEOUT)
            .build()
            .map_err(ConfigError::HttpClient)?;
        Ok(InfluxDbObserver {
            measurement,
            write_url,
            token,
            reporthost: get_hostname(),
            client,
            description,
        })
    }

    /// Render one record as a line-protocol line:
    /// `measurement,tag=val,... field=val,... timestamp_ns`.
    fn render_line(&self, record: &Record) -> Result<String, SinkError> {
        let tod = record
            .get(keys::TOD)
            .and_then(Value::as_f64)
            .ok_or_else(|| {
                SinkError::MalformedRecord("record has no numeric 'tod' timestamp".to_string())
            })?;
        let timestamp_ns = (tod * 1e9) as i64;

        let mut line = self.measurement.clone();
        for key in keys::TAG_KEYS {
            if let Some(value) = record.get(key) {
                line.push(',');
                line.push_str(key);
                line.push('=');
                line.push_str(&value.to_string());
            }
        }
        line.push_str(",reporthost=");
        line.push_str(&self.reporthost);

        let fields: Vec<String> = record
            .iter()
            .filter(|(key, _)| !keys::FIELD_EXCLUDED_KEYS.contains(&key.as_str()))
            .map(|(key, value)| match value {
                Value::Str(s) => format!("{key}=\"{s}\""),
                numeric => format!("{key}={numeric}"),
            })
            .collect();
        if fields.is_empty() {
            return Err(SinkError::MalformedRecord(
                "record has no field values".to_string(),
            ));
        }
        line.push(' ');
        line.push_str(&fields.join(","));
        line.push(' ');
        line.push_str(&timestamp_ns.to_string());
        Ok(line)
    }
}

#[async_trait]
impl Observer for InfluxDbObserver {
    async fn serve(&self, record: &Record) -> Result<(), SinkError> {
        let line = self.render_line(record)?;
        debug!("submitting line to {}", self.description);

        let mut request = self.client.post(&self.write_url).body(line);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Token {token}"));
        }
        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                SinkError::Timeout(SUBMIT_TIMEOUT)
            } else {
                SinkError::Http(err)
            }
        })?;
        if !response.status().is_success() {
            return Err(SinkError::Rejected(response.status().to_string()));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        self.description.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serial_test::serial;

    fn api_v2(url: &str) -> InfluxApi {
        InfluxApi::V2 {
            url: url.to_string(),
            org: "example".to_string(),
            bucket: "xrd".to_string(),
            token: Some("secret".to_string()),
            token_env: None,
        }
    }

    fn sample() -> Record {
        let mut record = Record::new();
        record.insert("src".to_string(), Value::Str("a.example.org:1094".to_string()));
        record.insert("tod".to_string(), Value::Int(1_660_000_000));
        record.insert("pgm".to_string(), Value::Str("xrootd".to_string()));
        record.insert("ins".to_string(), Value::Str("anon".to_string()));
        record.insert("pid".to_string(), Value::Int(901));
        record.insert("site".to_string(), Value::Str("EXAMPLE".to_string()));
        record.insert("info__host".to_string(), Value::Str("a.example.org".to_string()));
        record.insert("info__port".to_string(), Value::Int(1094));
        record.insert("link__num".to_string(), Value::Int(5));
        record.insert("ver".to_string(), Value::Str("v5.4.3".to_string()));
        record.insert("delta_s".to_string(), Value::Float(10.5));
        record
    }

    #[test]
    #[serial]
    fn test_line_partitions_tags_and_fields() {
        std::env::set_var("XRD_REPORT_HOSTNAME", "collector.example.org");
        let observer =
            InfluxDbObserver::new("xrootd".to_string(), api_v2("http://localhost:8086")).unwrap();
        let line = observer.render_line(&sample()).unwrap();

        let (head, rest) = line.split_once(' ').unwrap();
        let (fields, timestamp) = rest.rsplit_once(' ').unwrap();

        assert!(head.starts_with("xrootd,"));
        assert!(head.contains("info__host=a.example.org"));
        assert!(head.contains("info__port=1094"));
        assert!(head.contains("pgm=xrootd"));
        assert!(head.contains("ver=v5.4.3"));
        assert!(head.contains("reporthost=collector.example.org"));

        // tag keys and their redundant companions stay out of the field set
        assert!(!fields.contains("src="));
        assert!(!fields.contains("ins="));
        assert!(!fields.contains("pid="));
        assert!(!fields.contains("pgm="));

        // numeric fields bare, string fields quoted, tod is a field too
        assert!(fields.contains("link__num=5"));
        assert!(fields.contains("delta_s=10.5"));
        assert!(fields.contains("tod=1660000000"));

        assert_eq!(timestamp, "1660000000000000000");
        std::env::remove_var("XRD_REPORT_HOSTNAME");
    }

    #[test]
    fn test_string_fields_are_quoted() {
        let mut record = sample();
        record.insert("sgen__state".to_string(), Value::Str("active".to_string()));
        let observer =
            InfluxDbObserver::new("xrootd".to_string(), api_v2("http://localhost:8086")).unwrap();
        let line = observer.render_line(&record).unwrap();
        assert!(line.contains("sgen__state=\"active\""));
    }

    #[test]
    fn test_v2_requires_a_token() {
        let api = InfluxApi::V2 {
            url: "http://localhost:8086".to_string(),
            org: "example".to_string(),
            bucket: "xrd".to_string(),
            token: None,
            token_env: None,
        };
        assert!(matches!(
            InfluxDbObserver::new("xrootd".to_string(), api),
            Err(ConfigError::MissingParam { .. })
        ));
    }

    #[tokio::test]
    async fn test_v2_submission() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v2/write")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("org".to_string(), "example".to_string()),
                Matcher::UrlEncoded("bucket".to_string(), "xrd".to_string()),
                Matcher::UrlEncoded("precision".to_string(), "ns".to_string()),
            ]))
            .match_header("Authorization", "Token secret")
            .match_body(Matcher::Regex(
                r"^xrootd,.* .* 1660000000000000000$".to_string(),
            ))
            .with_status(204)
            .create_async()
            .await;

        let observer =
            InfluxDbObserver::new("xrootd".to_string(), api_v2(&server.url())).unwrap();
        observer.serve(&sample()).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_v1_submission_carries_credentials() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/write")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("db".to_string(), "xrd".to_string()),
                Matcher::UrlEncoded("u".to_string(), "reporter".to_string()),
                Matcher::UrlEncoded("p".to_string(), "hunter2".to_string()),
            ]))
            .with_status(204)
            .create_async()
            .await;

        let address = server.host_with_port();
        let (host, port) = address.rsplit_once(':').unwrap();
        let api = InfluxApi::V1 {
            host: host.to_string(),
            port: port.parse().unwrap(),
            username: "reporter".to_string(),
            password: "hunter2".to_string(),
            database: "xrd".to_string(),
        };
        let observer = InfluxDbObserver::new("xrootd".to_string(), api).unwrap();
        observer.serve(&sample()).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_submission_is_a_sink_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/v2/write")
            .match_query(Matcher::Any)
            .with_status(401)
            .create_async()
            .await;

        let observer =
            InfluxDbObserver::new("xrootd".to_string(), api_v2(&server.url())).unwrap();
        assert!(matches!(
            observer.serve(&sample()).await,
            Err(SinkError::Rejected(_))
        ));
    }
}
