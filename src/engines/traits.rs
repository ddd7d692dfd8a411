// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// 需要重试的 HTTP 状态码
pub const RETRY_HTTP_CODES: [u16; 8] = [500, 502, 503, 504, 522, 524, 408, 429];

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 非成功状态码
    #[error("Unexpected HTTP status {status} for {url}")]
    HttpStatus { status: u16, url: String },
    /// 浏览器启动或连接失败
    #[error("Browser launch failed: {0}")]
    Launch(String),
    /// 浏览器操作失败
    #[error("Browser error: {0}")]
    Browser(String),
    /// 超时
    #[error("Timeout")]
    Timeout,
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

impl EngineError {
    /// 判断错误是否可重试
    ///
    /// # 返回值
    ///
    /// 如果错误是可重试的则返回true，否则返回false
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::RequestFailed(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| RETRY_HTTP_CODES.contains(&s.as_u16()))
            }
            EngineError::HttpStatus { status, .. } => RETRY_HTTP_CODES.contains(status),
            EngineError::Timeout => true,
            _ => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, EngineError::Timeout)
    }
}

/// 浏览器会话
///
/// 运行期间只被分页驱动独占使用，不支持并发调用
#[async_trait]
pub trait BrowserSession: Send {
    /// 导航到指定URL
    async fn navigate(&mut self, url: &str) -> Result<(), EngineError>;

    /// 等待元素可点击，超时返回 `EngineError::Timeout`
    async fn wait_for_clickable(&mut self, selector: &str, timeout: Duration) -> Result<(), EngineError>;

    /// 点击元素
    async fn click(&mut self, selector: &str) -> Result<(), EngineError>;

    /// 当前页面HTML
    async fn page_source(&mut self) -> Result<String, EngineError>;

    /// 当前页面URL
    async fn current_url(&mut self) -> Result<Option<String>, EngineError>;

    /// 释放会话（关闭浏览器）
    async fn close(&mut self) -> Result<(), EngineError>;
}

/// 浏览器启动器
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, EngineError>;
}

/// 抓取到的详情页
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// HTTP状态码
    pub status_code: u16,
    /// 响应内容
    pub content: String,
    /// 响应时间（毫秒）
    pub response_time_ms: u64,
}

/// 详情页抓取器
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// 抓取页面，非 2xx 响应视为错误
    async fn fetch(&self, url: &str) -> Result<FetchedPage, EngineError>;

    /// 抓取器名称
    fn name(&self) -> &'static str;
}
