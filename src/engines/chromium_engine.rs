// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::{BrowserLauncher, BrowserSession, EngineError};
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// 浏览器启动参数
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// 无头模式；关闭时以最大化窗口显示
    pub headless: bool,
    pub maximized: bool,
    /// 连接已有的 Chrome DevTools 端点，而不是启动新进程
    pub remote_debugging_url: Option<String>,
    pub executable: Option<PathBuf>,
    pub request_timeout: Duration,
    pub user_agent: Option<String>,
    /// 等待元素可点击时的轮询间隔
    pub poll_interval: Duration,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            maximized: false,
            remote_debugging_url: None,
            executable: None,
            request_timeout: Duration::from_secs(30),
            user_agent: None,
            poll_interval: Duration::from_millis(250),
        }
    }
}

/// 基于 chromiumoxide 的浏览器启动器
pub struct ChromiumLauncher {
    options: BrowserOptions,
}

impl ChromiumLauncher {
    pub fn new(options: BrowserOptions) -> Self {
        Self { options }
    }

    fn build_config(&self) -> Result<BrowserConfig, EngineError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(self.options.request_timeout)
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage");

        if !self.options.headless {
            builder = builder.with_head();
        }
        if self.options.maximized {
            builder = builder.arg("--start-maximized");
        }
        if let Some(path) = &self.options.executable {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(EngineError::Launch)
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, EngineError> {
        let remote = self.options.remote_debugging_url.is_some();
        let (browser, mut handler) = if let Some(url) = &self.options.remote_debugging_url {
            tracing::info!("Connecting to remote Chrome instance at: {}", url);
            Browser::connect(url)
                .await
                .map_err(|e| EngineError::Launch(format!("Failed to connect to remote Chrome: {}", e)))?
        } else {
            Browser::launch(self.build_config()?)
                .await
                .map_err(|e| EngineError::Launch(e.to_string()))?
        };

        // Spawn a handler to process browser events
        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| EngineError::Launch(e.to_string()))?;

        if let Some(user_agent) = &self.options.user_agent {
            page.set_user_agent(user_agent.as_str())
                .await
                .map_err(|e| EngineError::Launch(e.to_string()))?;
        }

        tracing::info!(
            headless = self.options.headless,
            remote,
            "Browser session started"
        );

        Ok(Box::new(ChromiumSession {
            browser: Some(browser),
            page: Some(page),
            handler_task: Some(handler_task),
            remote,
            poll_interval: self.options.poll_interval,
        }))
    }
}

/// chromiumoxide 浏览器会话
///
/// 启动的浏览器在 `close` 时退出；连接的远程浏览器只关闭本会话的页面
pub struct ChromiumSession {
    browser: Option<Browser>,
    page: Option<Page>,
    handler_task: Option<JoinHandle<()>>,
    remote: bool,
    poll_interval: Duration,
}

impl ChromiumSession {
    fn page(&self) -> Result<&Page, EngineError> {
        self.page
            .as_ref()
            .ok_or_else(|| EngineError::Browser("session already closed".to_string()))
    }
}

/// 元素存在、可见且未禁用
fn clickable_script(selector: &str) -> Result<String, EngineError> {
    let quoted = serde_json::to_string(selector).map_err(|e| EngineError::Other(e.to_string()))?;
    Ok(format!(
        r#"(() => {{
            const el = document.querySelector({quoted});
            if (!el) return false;
            const style = window.getComputedStyle(el);
            if (style.display === 'none' || style.visibility === 'hidden') return false;
            const rect = el.getBoundingClientRect();
            return rect.width > 0 && rect.height > 0 && !el.disabled;
        }})()"#
    ))
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<(), EngineError> {
        self.page()?
            .goto(url)
            .await
            .map_err(|e| EngineError::Browser(format!("Navigation to {} failed: {}", url, e)))?;
        Ok(())
    }

    async fn wait_for_clickable(&mut self, selector: &str, timeout: Duration) -> Result<(), EngineError> {
        let script = clickable_script(selector)?;
        let page = self.page()?;
        let deadline = Instant::now() + timeout;

        loop {
            let clickable = page
                .evaluate(script.as_str())
                .await
                .map_err(|e| EngineError::Browser(e.to_string()))?
                .into_value::<bool>()
                .unwrap_or(false);
            if clickable {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(EngineError::Timeout);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn click(&mut self, selector: &str) -> Result<(), EngineError> {
        self.page()?
            .find_element(selector)
            .await
            .map_err(|e| EngineError::Browser(format!("Click failed, element not found: {}", e)))?
            .click()
            .await
            .map_err(|e| EngineError::Browser(format!("Click failed: {}", e)))?;
        Ok(())
    }

    async fn page_source(&mut self) -> Result<String, EngineError> {
        self.page()?
            .content()
            .await
            .map_err(|e| EngineError::Browser(e.to_string()))
    }

    async fn current_url(&mut self) -> Result<Option<String>, EngineError> {
        self.page()?
            .url()
            .await
            .map_err(|e| EngineError::Browser(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), EngineError> {
        let mut result = Ok(());

        if let Some(page) = self.page.take() {
            if self.remote {
                if let Err(e) = page.close().await {
                    result = Err(EngineError::Browser(format!("Failed to close page: {}", e)));
                }
            }
        }

        if let Some(mut browser) = self.browser.take() {
            if !self.remote {
                if let Err(e) = browser.close().await {
                    result = Err(EngineError::Browser(format!("Failed to close browser: {}", e)));
                }
                // Reap the child process even when the close command failed
                let _ = browser.wait().await;
            }
        }

        if let Some(task) = self.handler_task.take() {
            task.abort();
        }

        result
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        // Browser's own Drop kills a launched child process
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
    }
}
