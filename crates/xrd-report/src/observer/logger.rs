// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Log sink: emits the full record at a configured severity.

use async_trait::async_trait;

use crate::config::LogLevel;
use crate::errors::SinkError;
use crate::record::Record;

use super::Observer;

pub struct LoggerObserver {
    level: LogLevel,
}

impl LoggerObserver {
    #[must_use]
    pub fn new(level: LogLevel) -> Self {
        LoggerObserver { level }
    }
}

#[async_trait]
impl Observer for LoggerObserver {
    async fn serve(&self, record: &Record) -> Result<(), SinkError> {
        let line = serde_json::to_string(record)?;
        self.level.emit(&line);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("Logger({})", self.level.as_str().to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Value;
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn test_full_record_is_logged() {
        let mut record = Record::new();
        record.insert("src".to_string(), Value::Str("a:1".to_string()));
        record.insert("link__num".to_string(), Value::Int(5));

        let observer = LoggerObserver::new(LogLevel::Info);
        observer.serve(&record).await.unwrap();

        assert!(logs_contain(r#""src":"a:1""#));
        assert!(logs_contain(r#""link__num":5"#));
    }
}
