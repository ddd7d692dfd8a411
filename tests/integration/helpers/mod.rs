// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod mock_browser;

use vacancy_crawler::application::use_cases::crawl_use_case::{CrawlOptions, CrawlUseCase};
use vacancy_crawler::domain::models::keywords::KeywordVocabulary;
use vacancy_crawler::domain::services::detail_extractor::{DetailExtractor, DEFAULT_CONTENT_SELECTOR};
use vacancy_crawler::domain::services::listing_extractor::ListingExtractor;
use vacancy_crawler::domain::services::pagination_service::{LoadMorePolicy, PaginationDriver};
use vacancy_crawler::engines::reqwest_engine::{FetcherOptions, ReqwestFetcher};
use vacancy_crawler::engines::traits::BrowserLauncher;
use vacancy_crawler::utils::retry_policy::RetryPolicy;
use std::sync::Arc;
use std::time::Duration;

/// 一条搜索结果
pub fn listing(title: &str, href: &str, company: &str) -> String {
    format!(
        r#"<li class="l-vacancy">
            <div class="title">
                <a class="vt" href="{href}">{title}</a>
                <strong><a class="company" href="/companies/x/">{company}</a></strong>
            </div>
            <span class="cities">Kyiv</span>
        </li>"#
    )
}

/// 搜索结果页，有更多结果时带 "加载更多" 按钮
pub fn search_page(items: &[String], has_more: bool) -> String {
    let button = if has_more {
        r##"<div class="more-btn"><a href="#">Більше вакансій</a></div>"##
    } else {
        ""
    };
    format!(
        r#"<html><body><div id="vacancyListId"><ul>{}</ul>{}</div></body></html>"#,
        items.join(""),
        button
    )
}

pub fn detail_page(paragraphs: &[&str]) -> String {
    let body: String = paragraphs.iter().map(|p| format!("<p>{p}</p>")).collect();
    format!(
        r#"<html><body><div class="b-typo vacancy-section">{body}</div></body></html>"#
    )
}

pub fn fast_policy() -> LoadMorePolicy {
    LoadMorePolicy {
        wait_timeout: Duration::from_millis(10),
        ..Default::default()
    }
}

pub fn fast_fetcher() -> ReqwestFetcher {
    ReqwestFetcher::new(FetcherOptions {
        timeout: Duration::from_secs(5),
        retry_policy: RetryPolicy {
            max_retries: 1,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
            enable_jitter: false,
            ..Default::default()
        },
        ..Default::default()
    })
    .unwrap()
}

pub fn create_use_case(launcher: Arc<dyn BrowserLauncher>, options: CrawlOptions) -> CrawlUseCase {
    CrawlUseCase::new(
        launcher,
        Arc::new(fast_fetcher()),
        PaginationDriver::new(fast_policy()),
        ListingExtractor::default(),
        DetailExtractor::new(DEFAULT_CONTENT_SELECTOR, Arc::new(KeywordVocabulary::default())).unwrap(),
        options,
    )
}
