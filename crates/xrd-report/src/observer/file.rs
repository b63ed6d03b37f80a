// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! File sink: one JSON-encoded line per record, appended.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::errors::SinkError;
use crate::record::Record;

use super::Observer;

pub struct FileObserver {
    filename: PathBuf,
    // Serializes writers so lines are never interleaved or truncated.
    guard: Mutex<()>,
}

impl FileObserver {
    #[must_use]
    pub fn new(filename: PathBuf) -> Self {
        FileObserver {
            filename,
            guard: Mutex::new(()),
        }
    }
}

#[async_trait]
impl Observer for FileObserver {
    async fn serve(&self, record: &Record) -> Result<(), SinkError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.guard.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.filename)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("File(\"{}\")", self.filename.display())
    }
}
