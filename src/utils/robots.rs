// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::Client;
use robotstxt::DefaultMatcher;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use url::Url;

use crate::utils::retry_policy::RetryPolicy;

/// Robots.txt检查器接口
#[async_trait]
pub trait RobotsCheckerTrait: Send + Sync {
    /// 检查URL是否被允许访问
    async fn is_allowed(&self, url_str: &str, user_agent: &str) -> Result<bool>;
}

/// 缓存的Robots.txt内容
#[derive(Clone)]
struct CachedRobots {
    content: String,
    expires_at: Instant,
}

/// Robots.txt检查器
///
/// 每个源站只抓取一次 robots.txt，缓存在内存中；并发的首次查询共享同一次抓取。
/// 404、4xx 或持续失败都视为允许全部
#[derive(Clone)]
pub struct RobotsChecker {
    client: Client,
    cache: Arc<DashMap<String, Arc<OnceCell<CachedRobots>>>>,
    retry_policy: RetryPolicy,
    ttl: Duration,
}

#[async_trait]
impl RobotsCheckerTrait for RobotsChecker {
    async fn is_allowed(&self, url_str: &str, user_agent: &str) -> Result<bool> {
        let url = Url::parse(url_str)?;
        let content = self.get_robots_content(&url).await?;
        let mut matcher = DefaultMatcher::default();
        Ok(matcher.one_agent_allowed_by_robots(&content, user_agent, url.as_str()))
    }
}

impl Default for RobotsChecker {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

impl RobotsChecker {
    /// 创建新的Robots检查器实例
    ///
    /// # 参数
    ///
    /// * `client` - 与详情页抓取共用的HTTP客户端
    pub fn new(client: Client) -> Self {
        Self {
            client,
            cache: Default::default(),
            retry_policy: RetryPolicy {
                max_retries: 2,
                initial_backoff: Duration::from_millis(500),
                max_backoff: Duration::from_secs(5),
                ..Default::default()
            },
            ttl: Duration::from_secs(3600),
        }
    }

    fn robots_url(url: &Url) -> Result<String> {
        let host = url
            .host_str()
            .ok_or_else(|| anyhow::anyhow!("URL has no host: {}", url))?;
        let port = url.port_or_known_default().unwrap_or(80);
        Ok(format!("{}://{}:{}/robots.txt", url.scheme(), host, port))
    }

    /// 获取Robots.txt内容（带缓存）
    async fn get_robots_content(&self, url: &Url) -> Result<String> {
        let robots_url = Self::robots_url(url)?;

        // The map guard must not be held across the fetch below
        let cell = {
            let mut entry = self.cache.entry(robots_url.clone()).or_default();
            if entry
                .value()
                .get()
                .is_some_and(|cached| cached.expires_at <= Instant::now())
            {
                *entry = Arc::default();
            }
            entry.value().clone()
        };

        let cached = cell
            .get_or_init(|| async {
                CachedRobots {
                    content: self.fetch_robots(&robots_url).await,
                    expires_at: Instant::now() + self.ttl,
                }
            })
            .await;

        Ok(cached.content.clone())
    }

    /// 抓取 robots.txt，失败时返回空内容（允许全部）
    async fn fetch_robots(&self, robots_url: &str) -> String {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let response = self
                .client
                .get(robots_url)
                .timeout(Duration::from_secs(5))
                .send()
                .await;

            let retry_error = match response {
                Ok(resp) if resp.status().is_success() => {
                    return resp.text().await.unwrap_or_default();
                }
                Ok(resp) if resp.status().is_server_error() => {
                    anyhow::anyhow!("Server error: {}", resp.status())
                }
                // 404 and other client errors mean there are no rules for us
                Ok(_) => return String::new(),
                Err(e) => anyhow::anyhow!("Request failed: {}", e),
            };

            if attempt > self.retry_policy.max_retries {
                tracing::warn!("Failed to fetch robots.txt from {}: {}", robots_url, retry_error);
                return String::new();
            }
            tokio::time::sleep(self.retry_policy.calculate_backoff(attempt)).await;
        }
    }
}
