// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use vacancy_crawler::engines::traits::{BrowserLauncher, BrowserSession, EngineError};

/// 按脚本回放的浏览器
///
/// 每个URL对应一组页面状态，每次点击 "加载更多" 前进到下一个状态；
/// 没有下一个状态时等待按钮超时
#[derive(Clone, Default)]
pub struct ScriptedBrowser {
    pages: HashMap<String, Vec<String>>,
    /// 等待按钮时挂起，模拟卡住的页面
    hang_on_wait: bool,
    fail_launch: bool,
    launches: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

impl ScriptedBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, states: Vec<String>) -> Self {
        self.pages.insert(url.to_string(), states);
        self
    }

    pub fn hanging(mut self) -> Self {
        self.hang_on_wait = true;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_launch = true;
        self
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserLauncher for ScriptedBrowser {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, EngineError> {
        if self.fail_launch {
            return Err(EngineError::Launch("chrome not found".to_string()));
        }
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession {
            browser: self.clone(),
            current: None,
        }))
    }
}

struct ScriptedSession {
    browser: ScriptedBrowser,
    current: Option<(String, usize)>,
}

impl ScriptedSession {
    fn states(&self) -> Result<(&[String], usize), EngineError> {
        let (url, index) = self
            .current
            .as_ref()
            .ok_or_else(|| EngineError::Browser("no page loaded".to_string()))?;
        let states = self
            .browser
            .pages
            .get(url)
            .ok_or_else(|| EngineError::Browser(format!("unknown page {url}")))?;
        Ok((states.as_slice(), *index))
    }
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    async fn navigate(&mut self, url: &str) -> Result<(), EngineError> {
        if !self.browser.pages.contains_key(url) {
            return Err(EngineError::Browser(format!("net::ERR_NAME_NOT_RESOLVED {url}")));
        }
        self.current = Some((url.to_string(), 0));
        Ok(())
    }

    async fn wait_for_clickable(&mut self, _selector: &str, _timeout: Duration) -> Result<(), EngineError> {
        if self.browser.hang_on_wait {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        let (states, index) = self.states()?;
        if index + 1 < states.len() {
            Ok(())
        } else {
            Err(EngineError::Timeout)
        }
    }

    async fn click(&mut self, _selector: &str) -> Result<(), EngineError> {
        if let Some((_, index)) = self.current.as_mut() {
            *index += 1;
        }
        Ok(())
    }

    async fn page_source(&mut self) -> Result<String, EngineError> {
        let (states, index) = self.states()?;
        Ok(states[index].clone())
    }

    async fn current_url(&mut self) -> Result<Option<String>, EngineError> {
        Ok(self.current.as_ref().map(|(url, _)| url.clone()))
    }

    async fn close(&mut self) -> Result<(), EngineError> {
        self.browser.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
