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

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

use crate::application::use_cases::crawl_use_case::{CrawlOptions, DEFAULT_ROBOTS_AGENT};
use crate::domain::models::keywords::{KeywordVocabulary, DEFAULT_KEYWORDS};
use crate::domain::models::search_query::{ExperienceBracket, SearchQuery};
use crate::domain::services::detail_extractor::DEFAULT_CONTENT_SELECTOR;
use crate::domain::services::listing_extractor::ListingSelectors;
use crate::domain::services::pagination_service::{
    ExpansionMode, LoadMorePolicy, DEFAULT_LOAD_MORE_SELECTOR,
};
use crate::engines::chromium_engine::BrowserOptions;
use crate::engines::reqwest_engine::{FetcherOptions, DEFAULT_USER_AGENT};
use crate::utils::errors::CrawlError;
use crate::utils::retry_policy::RetryPolicy;

const SEARCH_BASE_URL: &str = "https://jobs.dou.ua/vacancies/?category=Python";

/// 应用程序配置设置
#[derive(Debug, Deserialize, Validate)]
pub struct Settings {
    /// 搜索入口与选择器
    #[validate(nested)]
    pub crawler: CrawlerSettings,
    /// "加载更多" 分页配置
    #[validate(nested)]
    pub pagination: PaginationSettings,
    /// 浏览器配置
    #[validate(nested)]
    pub browser: BrowserSettings,
    /// 详情页抓取配置
    #[validate(nested)]
    pub detail: DetailSettings,
    /// 关键词配置
    #[serde(default)]
    pub tagging: TaggingSettings,
    /// 输出配置
    #[serde(default)]
    pub output: OutputSettings,
    /// 指标配置
    #[serde(default)]
    pub metrics: MetricsSettings,
}

/// 搜索入口与选择器配置
#[derive(Debug, Deserialize, Validate)]
pub struct CrawlerSettings {
    /// 起始URL，每个必须带 `exp` 参数
    #[validate(length(min = 1))]
    pub start_urls: Vec<String>,
    pub listing_selector: String,
    pub title_selector: String,
    pub company_selector: String,
    pub salary_selector: String,
    pub cities_selector: String,
    pub content_selector: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PaginationSettings {
    pub load_more_selector: String,
    /// bounded | until_error
    pub mode: ExpansionMode,
    /// bounded 模式下允许的等待超时次数
    #[validate(range(min = 1))]
    pub max_timeouts: u32,
    #[validate(range(min = 1))]
    pub wait_timeout_secs: u64,
    #[validate(range(min = 1))]
    pub poll_interval_ms: u64,
    /// 点击次数上限，0 表示不限
    pub max_clicks: u32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BrowserSettings {
    pub headless: bool,
    /// 非无头模式下最大化窗口
    pub maximized: bool,
    /// 远程 DevTools 端点 (ws://...)
    pub remote_debugging_url: Option<String>,
    /// Chrome 可执行文件路径
    pub executable: Option<PathBuf>,
    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,
    pub user_agent: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DetailSettings {
    /// 同时进行的详情页请求数
    #[validate(range(min = 1))]
    pub concurrency: usize,
    #[validate(range(min = 1))]
    pub timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    /// 同一次运行中按URL去重
    pub dedupe: bool,
    pub obey_robots: bool,
    /// robots.txt 中匹配 `User-agent:` 分组的产品标识
    #[validate(length(min = 1))]
    pub robots_agent: String,
    #[validate(range(exclusive_min = 0.0))]
    pub requests_per_second: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TaggingSettings {
    /// 覆盖内置关键词表
    pub keywords: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OutputSettings {
    /// JSON Lines 输出文件，未设置时写到 stdout
    pub path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MetricsSettings {
    pub prometheus_listen: Option<SocketAddr>,
}

impl Settings {
    /// 加载并校验配置
    ///
    /// 依次叠加内置默认值、`config/default`、`config/{APP_ENVIRONMENT}` 与
    /// `VACANCY_CRAWLER__*` 环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(CrawlError)` - 配置加载或校验失败
    pub fn load() -> Result<Self, CrawlError> {
        Self::from_builder(Self::layered()?)
    }

    /// 从构建器生成配置并执行校验
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, CrawlError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn layered() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Ok(Self::with_defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("VACANCY_CRAWLER")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("crawler.start_urls")
                    .with_list_parse_key("tagging.keywords")
                    .try_parsing(true),
            ))
    }

    /// 只包含内置默认值的配置构建器
    pub fn with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let start_urls: Vec<String> = ExperienceBracket::ALL
            .iter()
            .map(|bracket| format!("{}&exp={}", SEARCH_BASE_URL, bracket))
            .collect();
        let listing = ListingSelectors::default();

        Config::builder()
            .set_default("crawler.start_urls", start_urls)?
            .set_default("crawler.listing_selector", listing.listing)?
            .set_default("crawler.title_selector", listing.title)?
            .set_default("crawler.company_selector", listing.company)?
            .set_default("crawler.salary_selector", listing.salary)?
            .set_default("crawler.cities_selector", listing.cities)?
            .set_default("crawler.content_selector", DEFAULT_CONTENT_SELECTOR)?
            .set_default("pagination.load_more_selector", DEFAULT_LOAD_MORE_SELECTOR)?
            .set_default("pagination.mode", "bounded")?
            .set_default("pagination.max_timeouts", 3)?
            .set_default("pagination.wait_timeout_secs", 15)?
            .set_default("pagination.poll_interval_ms", 250)?
            .set_default("pagination.max_clicks", 1000)?
            .set_default("browser.headless", true)?
            .set_default("browser.maximized", false)?
            .set_default("browser.request_timeout_secs", 30)?
            .set_default("detail.concurrency", 16)?
            .set_default("detail.timeout_secs", 30)?
            .set_default("detail.user_agent", DEFAULT_USER_AGENT)?
            .set_default("detail.max_retries", 2)?
            .set_default("detail.dedupe", true)?
            .set_default("detail.obey_robots", true)?
            .set_default("detail.robots_agent", DEFAULT_ROBOTS_AGENT)
    }

    /// 解析所有起始URL
    pub fn search_queries(&self) -> Result<Vec<SearchQuery>, CrawlError> {
        let queries = self
            .crawler
            .start_urls
            .iter()
            .map(|url| SearchQuery::parse(url))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(queries)
    }

    pub fn listing_selectors(&self) -> ListingSelectors {
        ListingSelectors {
            listing: self.crawler.listing_selector.clone(),
            title: self.crawler.title_selector.clone(),
            company: self.crawler.company_selector.clone(),
            salary: self.crawler.salary_selector.clone(),
            cities: self.crawler.cities_selector.clone(),
        }
    }

    pub fn load_more_policy(&self) -> LoadMorePolicy {
        LoadMorePolicy {
            selector: self.pagination.load_more_selector.clone(),
            mode: self.pagination.mode,
            max_timeouts: self.pagination.max_timeouts,
            wait_timeout: Duration::from_secs(self.pagination.wait_timeout_secs),
            max_clicks: (self.pagination.max_clicks > 0).then_some(self.pagination.max_clicks),
        }
    }

    pub fn browser_options(&self) -> BrowserOptions {
        BrowserOptions {
            headless: self.browser.headless,
            // A maximized window only makes sense when it is visible
            maximized: self.browser.maximized && !self.browser.headless,
            remote_debugging_url: self.browser.remote_debugging_url.clone(),
            executable: self.browser.executable.clone(),
            request_timeout: Duration::from_secs(self.browser.request_timeout_secs),
            user_agent: self.browser.user_agent.clone(),
            poll_interval: Duration::from_millis(self.pagination.poll_interval_ms),
        }
    }

    pub fn fetcher_options(&self) -> FetcherOptions {
        FetcherOptions {
            timeout: Duration::from_secs(self.detail.timeout_secs),
            user_agent: self.detail.user_agent.clone(),
            retry_policy: RetryPolicy::with_max_retries(self.detail.max_retries),
            requests_per_second: self.detail.requests_per_second,
        }
    }

    pub fn crawl_options(&self) -> CrawlOptions {
        CrawlOptions {
            concurrency: self.detail.concurrency,
            dedupe: self.detail.dedupe,
            robots_agent: self.detail.robots_agent.clone(),
        }
    }

    /// 关键词表，未覆盖时使用内置表
    pub fn vocabulary(&self) -> KeywordVocabulary {
        match &self.tagging.keywords {
            Some(keywords) => KeywordVocabulary::new(keywords),
            None => KeywordVocabulary::new(DEFAULT_KEYWORDS),
        }
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
