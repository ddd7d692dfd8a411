// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::vacancy::VacancyRecord;
use async_trait::async_trait;
use thiserror::Error;

/// 输出错误类型
#[derive(Error, Debug)]
pub enum SinkError {
    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// 共享状态在其他线程 panic 后不可用
    #[error("Sink state poisoned")]
    Poisoned,
}

/// 职位记录输出特质
///
/// 由详情阶段独占，记录按产出顺序逐条写入
#[async_trait]
pub trait RecordSink: Send {
    /// 写入一条记录
    async fn write(&mut self, record: &VacancyRecord) -> Result<(), SinkError>;

    /// 运行结束时刷新缓冲
    async fn finish(&mut self) -> Result<(), SinkError>;
}
