// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter, Stdout};

use crate::domain::models::vacancy::VacancyRecord;
use crate::domain::repositories::record_sink::{RecordSink, SinkError};
use crate::utils::errors::CrawlError;

/// 按配置打开输出：给定路径时写文件，否则写 stdout
pub async fn open_sink(path: Option<&Path>) -> Result<Box<dyn RecordSink>, CrawlError> {
    match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Writing records to file");
            Ok(Box::new(JsonLinesSink::create(path).await?))
        }
        None => Ok(Box::new(JsonLinesSink::stdout())),
    }
}

/// JSON Lines 输出，每行一条记录
pub struct JsonLinesSink<W> {
    writer: BufWriter<W>,
}

impl<W: AsyncWrite + Unpin + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }
}

impl JsonLinesSink<Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl JsonLinesSink<File> {
    /// 创建（或截断）输出文件
    pub async fn create(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(Self::new(File::create(path).await?))
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> RecordSink for JsonLinesSink<W> {
    async fn write(&mut self, record: &VacancyRecord) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        self.writer.write_all(&line).await?;
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), SinkError> {
        self.writer.flush().await?;
        Ok(())
    }
}

/// 内存输出，克隆后共享同一份记录
#[derive(Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<VacancyRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<VacancyRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn write(&mut self, record: &VacancyRecord) -> Result<(), SinkError> {
        self.records
            .lock()
            .map_err(|_| SinkError::Poisoned)?
            .push(record.clone());
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}
