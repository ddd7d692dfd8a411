// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

use crate::domain::models::search_query::QueryError;
use crate::domain::repositories::record_sink::SinkError;
use crate::domain::services::listing_extractor::SelectorError;
use crate::engines::traits::EngineError;

/// 爬取运行错误类型
///
/// 只有无法开始爬取的情况才会作为错误返回，单个页面的失败都在运行中降级处理
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("配置错误: {0}")]
    Config(#[from] config::ConfigError),

    #[error("配置校验失败: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("搜索入口无效: {0}")]
    Query(#[from] QueryError),

    #[error("选择器无效: {0}")]
    Selector(#[from] SelectorError),

    #[error("引擎错误: {0}")]
    Engine(#[from] EngineError),

    #[error("输出错误: {0}")]
    Sink(#[from] SinkError),
}
