// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::{BrowserSession, EngineError};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub const DEFAULT_LOAD_MORE_SELECTOR: &str = "div.more-btn a";

/// "加载更多" 的重试模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionMode {
    /// 等待超时消耗一次预算，预算耗尽后停止；其他错误立即停止
    Bounded,
    /// 任何错误（包括等待超时）都立即停止
    UntilError,
}

/// "加载更多" 策略
#[derive(Debug, Clone)]
pub struct LoadMorePolicy {
    pub selector: String,
    pub mode: ExpansionMode,
    /// 整个展开过程中允许的等待超时次数，成功点击不会重置
    pub max_timeouts: u32,
    /// 单次等待按钮可点击的超时
    pub wait_timeout: Duration,
    /// 点击次数上限，防止按钮永不消失
    pub max_clicks: Option<u32>,
}

impl Default for LoadMorePolicy {
    fn default() -> Self {
        Self {
            selector: DEFAULT_LOAD_MORE_SELECTOR.to_string(),
            mode: ExpansionMode::Bounded,
            max_timeouts: 3,
            wait_timeout: Duration::from_secs(15),
            max_clicks: Some(1000),
        }
    }
}

impl LoadMorePolicy {
    /// 判断错误发生后是否继续尝试
    ///
    /// # 参数
    ///
    /// * `error` - 等待或点击产生的错误
    /// * `timeouts_left` - 剩余超时预算（已扣除本次）
    pub fn is_retriable(&self, error: &EngineError, timeouts_left: u32) -> bool {
        match self.mode {
            ExpansionMode::Bounded => error.is_timeout() && timeouts_left > 0,
            ExpansionMode::UntilError => false,
        }
    }
}

/// 展开停止原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// 超时预算耗尽（按钮不再出现）
    RetryBudgetExhausted,
    /// 等待超时即停止（until_error 模式）
    Timeout,
    /// 浏览器操作出错
    DriverError(String),
    /// 达到点击上限
    ClickCapReached,
    /// 收到停止信号
    Cancelled,
}

/// 展开后的搜索结果页
#[derive(Debug, Clone)]
pub struct ExpandedPage {
    pub markup: String,
    /// 页面最终URL，用于解析相对链接
    pub url: String,
    pub clicks: u32,
    pub stop_reason: StopReason,
}

/// 分页驱动
///
/// 在浏览器会话中反复点击 "加载更多"，直到按钮消失或预算耗尽
pub struct PaginationDriver {
    policy: LoadMorePolicy,
}

impl PaginationDriver {
    pub fn new(policy: LoadMorePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &LoadMorePolicy {
        &self.policy
    }

    /// 展开搜索结果页
    ///
    /// 等待超时与点击失败只会提前结束循环，不会作为错误返回；
    /// 只有导航失败或读取页面失败时返回错误。
    ///
    /// # 参数
    ///
    /// * `session` - 独占的浏览器会话
    /// * `url` - 搜索结果页URL
    /// * `shutdown` - 停止信号，每次点击之间检查
    pub async fn expand(
        &self,
        session: &mut dyn BrowserSession,
        url: &str,
        shutdown: &watch::Receiver<bool>,
    ) -> Result<ExpandedPage, EngineError> {
        session.navigate(url).await?;

        let mut timeouts_left = self.policy.max_timeouts;
        let mut clicks = 0u32;

        let stop_reason = loop {
            if *shutdown.borrow() {
                break StopReason::Cancelled;
            }
            if self.policy.max_clicks.is_some_and(|cap| clicks >= cap) {
                warn!(url, clicks, "Load more click cap reached");
                break StopReason::ClickCapReached;
            }

            let attempt = match session
                .wait_for_clickable(&self.policy.selector, self.policy.wait_timeout)
                .await
            {
                Ok(()) => session.click(&self.policy.selector).await,
                Err(e) => Err(e),
            };

            match attempt {
                Ok(()) => {
                    clicks += 1;
                    metrics::counter!("load_more_clicks_total").increment(1);
                    info!(url, clicks, "The 'Load more' button has been pressed");
                }
                Err(e) if e.is_timeout() && self.policy.mode == ExpansionMode::Bounded => {
                    timeouts_left = timeouts_left.saturating_sub(1);
                    if self.policy.is_retriable(&e, timeouts_left) {
                        info!(
                            url,
                            timeouts_left,
                            "Button not clickable within {}s, trying again",
                            self.policy.wait_timeout.as_secs()
                        );
                        continue;
                    }
                    info!(url, clicks, "The 'Load more' button has not appeared after several attempts");
                    break StopReason::RetryBudgetExhausted;
                }
                Err(e) if e.is_timeout() => {
                    debug!(url, clicks, "Load more wait timed out, expansion finished");
                    break StopReason::Timeout;
                }
                Err(e) => {
                    warn!(url, clicks, error = %e, "An error occurred while pressing the button");
                    break StopReason::DriverError(e.to_string());
                }
            }
        };

        let markup = session.page_source().await?;
        let current = session
            .current_url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| url.to_string());

        Ok(ExpandedPage {
            markup,
            url: current,
            clicks,
            stop_reason,
        })
    }
}

#[cfg(test)]
#[path = "pagination_service_test.rs"]
mod tests;
