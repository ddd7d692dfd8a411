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

use crate::engines::traits::{EngineError, FetchedPage, PageFetcher};
use crate::utils::retry_policy::RetryPolicy;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::time::{Duration, Instant};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; vacancy-crawler/0.1)";

/// 详情页抓取配置
#[derive(Debug, Clone)]
pub struct FetcherOptions {
    pub timeout: Duration,
    pub user_agent: String,
    pub retry_policy: RetryPolicy,
    /// 每秒请求数上限，None 表示不限速
    pub requests_per_second: Option<f64>,
}

impl Default for FetcherOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            retry_policy: RetryPolicy::default(),
            requests_per_second: None,
        }
    }
}

/// 基于reqwest的详情页抓取器
///
/// 瞬时失败按重试策略退避重试；非 2xx 响应不会交给提取阶段
pub struct ReqwestFetcher {
    client: reqwest::Client,
    retry_policy: RetryPolicy,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl ReqwestFetcher {
    pub fn new(options: FetcherOptions) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .user_agent(options.user_agent.as_str())
            .timeout(options.timeout)
            .cookie_store(true)
            .build()?;

        let limiter = options
            .requests_per_second
            .map(rate_limiter)
            .transpose()?;

        Ok(Self {
            client,
            retry_policy: options.retry_policy,
            limiter,
        })
    }

    /// 共享的HTTP客户端（robots.txt 检查复用）
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    async fn fetch_once(&self, url: &str) -> Result<FetchedPage, EngineError> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        let start = Instant::now();
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(EngineError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let content = response.text().await?;

        Ok(FetchedPage {
            status_code: status.as_u16(),
            content,
            response_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// 按每秒请求数构建令牌桶
fn rate_limiter(requests_per_second: f64) -> Result<DefaultDirectRateLimiter, EngineError> {
    let period = Duration::try_from_secs_f64(1.0 / requests_per_second)
        .ok()
        .and_then(Quota::with_period)
        .ok_or_else(|| {
            EngineError::Other(format!(
                "requests_per_second {} cannot be expressed as a request interval",
                requests_per_second
            ))
        })?;
    Ok(RateLimiter::direct(period))
}

#[async_trait]
impl PageFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, EngineError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(url).await {
                Ok(page) => return Ok(page),
                Err(e) => {
                    attempt += 1;
                    if !self.retry_policy.should_retry(attempt, &e) {
                        return Err(e);
                    }
                    let backoff = self.retry_policy.calculate_backoff(attempt);
                    tracing::debug!(url, attempt, ?backoff, error = %e, "Retrying detail request");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "reqwest"
    }
}

#[cfg(test)]
#[path = "reqwest_engine_test.rs"]
mod tests;
