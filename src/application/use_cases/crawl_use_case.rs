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

use chrono::{DateTime, Utc};
use futures::channel::mpsc;
use futures::{SinkExt, StreamExt};
use scraper::Html;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn, Instrument};
use url::Url;
use uuid::Uuid;

use crate::config::settings::Settings;
use crate::domain::models::search_query::SearchQuery;
use crate::domain::models::vacancy::{ListingSummary, VacancyRecord};
use crate::domain::repositories::record_sink::RecordSink;
use crate::domain::services::detail_extractor::DetailExtractor;
use crate::domain::services::listing_extractor::ListingExtractor;
use crate::domain::services::pagination_service::PaginationDriver;
use crate::engines::reqwest_engine::ReqwestFetcher;
use crate::engines::traits::{BrowserLauncher, BrowserSession, PageFetcher};
use crate::utils::errors::CrawlError;
use crate::utils::robots::{RobotsChecker, RobotsCheckerTrait};
use crate::utils::url_utils::resolve_detail_link;

/// robots.txt 中本爬虫的产品标识
pub const DEFAULT_ROBOTS_AGENT: &str = "vacancy-crawler";

/// 编排配置
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// 同时进行的详情页请求数
    pub concurrency: usize,
    /// 按解析后的URL去重详情请求
    pub dedupe: bool,
    /// robots.txt 分组匹配使用的产品标识（不是完整的 User-Agent 头）
    pub robots_agent: String,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            concurrency: 16,
            dedupe: true,
            robots_agent: DEFAULT_ROBOTS_AGENT.to_string(),
        }
    }
}

/// 运行汇总
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub queries: usize,
    pub queries_failed: usize,
    pub load_more_clicks: u32,
    pub listings_found: usize,
    pub duplicates_skipped: usize,
    pub records_emitted: usize,
    pub detail_failures: usize,
    pub robots_blocked: usize,
    pub cancelled: bool,
}

/// 待抓取的详情页
struct DetailJob {
    url: Url,
    summary: ListingSummary,
}

enum DetailOutcome {
    Record(VacancyRecord),
    Failed,
    RobotsBlocked,
}

#[derive(Default)]
struct PaginationStats {
    queries_failed: usize,
    clicks: u32,
    listings_found: usize,
    duplicates_skipped: usize,
}

#[derive(Default)]
struct DetailStats {
    records_emitted: usize,
    detail_failures: usize,
    robots_blocked: usize,
    cancelled: bool,
}

/// 爬取用例
///
/// 浏览器会话只在分页阶段使用；详情阶段在独立任务中通过HTTP抓取，
/// 二者通过有界通道连接
pub struct CrawlUseCase {
    launcher: Arc<dyn BrowserLauncher>,
    fetcher: Arc<dyn PageFetcher>,
    pagination: PaginationDriver,
    listings: ListingExtractor,
    details: Arc<DetailExtractor>,
    robots: Option<Arc<dyn RobotsCheckerTrait>>,
    options: CrawlOptions,
}

impl CrawlUseCase {
    pub fn new(
        launcher: Arc<dyn BrowserLauncher>,
        fetcher: Arc<dyn PageFetcher>,
        pagination: PaginationDriver,
        listings: ListingExtractor,
        details: DetailExtractor,
        options: CrawlOptions,
    ) -> Self {
        Self {
            launcher,
            fetcher,
            pagination,
            listings,
            details: Arc::new(details),
            robots: None,
            options,
        }
    }

    /// 启用 robots.txt 检查
    pub fn with_robots(mut self, robots: Arc<dyn RobotsCheckerTrait>) -> Self {
        self.robots = Some(robots);
        self
    }

    /// 按配置组装用例
    ///
    /// # 参数
    ///
    /// * `settings` - 已校验的配置
    /// * `launcher` - 浏览器启动器，运行开始时才会启动浏览器
    ///
    /// # 返回值
    ///
    /// * `Err(CrawlError::Selector)` - 配置的选择器无法解析
    /// * `Err(CrawlError::Engine)` - HTTP客户端无法创建
    pub fn from_settings(
        settings: &Settings,
        launcher: Arc<dyn BrowserLauncher>,
    ) -> Result<Self, CrawlError> {
        let fetcher = Arc::new(ReqwestFetcher::new(settings.fetcher_options())?);
        let listings = ListingExtractor::new(&settings.listing_selectors())?;
        let vocabulary = Arc::new(settings.vocabulary());
        info!(keywords = vocabulary.len(), "Keyword vocabulary loaded");
        let details = DetailExtractor::new(&settings.crawler.content_selector, vocabulary)?;

        let robots: Option<Arc<dyn RobotsCheckerTrait>> = if settings.detail.obey_robots {
            Some(Arc::new(RobotsChecker::new(fetcher.client().clone())))
        } else {
            None
        };

        let mut use_case = Self::new(
            launcher,
            fetcher,
            PaginationDriver::new(settings.load_more_policy()),
            listings,
            details,
            settings.crawl_options(),
        );
        use_case.robots = robots;
        Ok(use_case)
    }

    /// 执行一次完整爬取
    ///
    /// 浏览器会话在所有退出路径上都会被关闭（完成、出错、收到停止信号）。
    ///
    /// # 参数
    ///
    /// * `queries` - 搜索入口，按顺序展开
    /// * `sink` - 记录输出
    /// * `shutdown` - 停止信号
    ///
    /// # 返回值
    ///
    /// * `Ok(CrawlReport)` - 运行汇总（包括被取消的运行）
    /// * `Err(CrawlError)` - 浏览器无法启动
    pub async fn run(
        &self,
        queries: &[SearchQuery],
        sink: Box<dyn RecordSink>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<CrawlReport, CrawlError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("crawl", %run_id);
        self.run_inner(run_id, queries, sink, shutdown)
            .instrument(span)
            .await
    }

    async fn run_inner(
        &self,
        run_id: Uuid,
        queries: &[SearchQuery],
        sink: Box<dyn RecordSink>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<CrawlReport, CrawlError> {
        let started_at = Utc::now();
        info!(
            queries = queries.len(),
            fetcher = self.fetcher.name(),
            robots = self.robots.is_some(),
            "Crawl started"
        );

        let mut session = self.launcher.launch().await?;

        let (tx, rx) = mpsc::channel::<DetailJob>(self.options.concurrency.max(1) * 4);
        let detail_stage = tokio::spawn(
            run_detail_stage(
                rx,
                self.fetcher.clone(),
                self.details.clone(),
                self.robots.clone(),
                self.options.clone(),
                sink,
                shutdown.clone(),
            )
            .in_current_span(),
        );

        let mut pagination_stats = PaginationStats::default();
        let cancelled = tokio::select! {
            _ = self.paginate_all(session.as_mut(), queries, tx, &shutdown, &mut pagination_stats) => {
                *shutdown.borrow()
            }
            _ = wait_for_shutdown(shutdown.clone()) => true,
        };

        if let Err(e) = session.close().await {
            error!(error = %e, "Error during driver close");
        } else {
            debug!("Browser session closed");
        }
        drop(session);

        let detail_stats = match detail_stage.await {
            Ok(stats) => stats,
            Err(e) => {
                error!(error = %e, "Detail stage terminated abnormally");
                DetailStats::default()
            }
        };

        let cancelled = cancelled || detail_stats.cancelled;
        let report = CrawlReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            queries: queries.len(),
            queries_failed: pagination_stats.queries_failed,
            load_more_clicks: pagination_stats.clicks,
            listings_found: pagination_stats.listings_found,
            duplicates_skipped: pagination_stats.duplicates_skipped,
            records_emitted: detail_stats.records_emitted,
            detail_failures: detail_stats.detail_failures,
            robots_blocked: detail_stats.robots_blocked,
            cancelled,
        };

        info!(
            listings = report.listings_found,
            records = report.records_emitted,
            failures = report.detail_failures,
            duplicates = report.duplicates_skipped,
            robots_blocked = report.robots_blocked,
            cancelled = report.cancelled,
            elapsed_ms = (report.finished_at - report.started_at).num_milliseconds(),
            "Crawl finished"
        );

        Ok(report)
    }

    /// 依次展开每个搜索入口并把详情任务送入通道
    async fn paginate_all(
        &self,
        session: &mut dyn BrowserSession,
        queries: &[SearchQuery],
        mut tx: mpsc::Sender<DetailJob>,
        shutdown: &watch::Receiver<bool>,
        stats: &mut PaginationStats,
    ) {
        let mut seen = HashSet::new();

        for query in queries {
            if *shutdown.borrow() {
                break;
            }

            let page = match self
                .pagination
                .expand(session, query.url().as_str(), shutdown)
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    error!(url = %query, error = %e, "Failed to expand search results");
                    stats.queries_failed += 1;
                    continue;
                }
            };
            stats.clicks += page.clicks;

            let jobs = self.collect_jobs(&page.markup, &page.url, query, &mut seen, stats);
            info!(
                url = %query,
                clicks = page.clicks,
                stop_reason = ?page.stop_reason,
                jobs = jobs.len(),
                "Search results expanded"
            );

            for job in jobs {
                if tx.send(job).await.is_err() {
                    warn!("Detail stage is gone, stop forwarding listings");
                    return;
                }
            }
        }
    }

    fn collect_jobs(
        &self,
        markup: &str,
        page_url: &str,
        query: &SearchQuery,
        seen: &mut HashSet<String>,
        stats: &mut PaginationStats,
    ) -> Vec<DetailJob> {
        let document = Html::parse_document(markup);
        let mut jobs = Vec::new();

        for summary in self.listings.extract(&document, query.experience()) {
            stats.listings_found += 1;
            metrics::counter!("listings_found_total").increment(1);

            let url = match resolve_detail_link(page_url, &summary.detail_link) {
                Ok(url) => url,
                Err(e) => {
                    warn!(link = %summary.detail_link, error = %e, "Unresolvable detail link");
                    continue;
                }
            };

            if self.options.dedupe && !seen.insert(url.to_string()) {
                debug!(%url, "Duplicate detail link skipped");
                stats.duplicates_skipped += 1;
                continue;
            }

            jobs.push(DetailJob { url, summary });
        }

        jobs
    }
}

/// 停止信号变为 true 时完成；发送端消失且未发信号时永不完成
async fn wait_for_shutdown(mut shutdown: watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            futures::future::pending::<()>().await;
        }
    }
}

async fn run_detail_stage(
    rx: mpsc::Receiver<DetailJob>,
    fetcher: Arc<dyn PageFetcher>,
    details: Arc<DetailExtractor>,
    robots: Option<Arc<dyn RobotsCheckerTrait>>,
    options: CrawlOptions,
    mut sink: Box<dyn RecordSink>,
    shutdown: watch::Receiver<bool>,
) -> DetailStats {
    let mut stats = DetailStats::default();

    let outcomes = rx
        .map(|job| {
            let fetcher = fetcher.clone();
            let details = details.clone();
            let robots = robots.clone();
            let robots_agent = options.robots_agent.clone();
            async move { process_detail(job, fetcher, details, robots, &robots_agent).await }
        })
        .buffer_unordered(options.concurrency.max(1));

    let stop = wait_for_shutdown(shutdown);
    tokio::pin!(outcomes, stop);

    loop {
        let outcome = tokio::select! {
            outcome = outcomes.next() => outcome,
            _ = &mut stop => {
                info!("Shutdown requested, dropping pending detail requests");
                stats.cancelled = true;
                break;
            }
        };
        let Some(outcome) = outcome else {
            break;
        };

        match outcome {
            DetailOutcome::Record(record) => match sink.write(&record).await {
                Ok(()) => {
                    stats.records_emitted += 1;
                    metrics::counter!("vacancies_emitted_total").increment(1);
                }
                Err(e) => {
                    error!(link = %record.link, error = %e, "Failed to write record");
                    stats.detail_failures += 1;
                }
            },
            DetailOutcome::Failed => {
                stats.detail_failures += 1;
                metrics::counter!("detail_failures_total").increment(1);
            }
            DetailOutcome::RobotsBlocked => stats.robots_blocked += 1,
        }
    }

    if let Err(e) = sink.finish().await {
        error!(error = %e, "Failed to flush output");
    }

    stats
}

async fn process_detail(
    job: DetailJob,
    fetcher: Arc<dyn PageFetcher>,
    details: Arc<DetailExtractor>,
    robots: Option<Arc<dyn RobotsCheckerTrait>>,
    robots_agent: &str,
) -> DetailOutcome {
    let url = job.url.as_str();

    if let Some(robots) = &robots {
        match robots.is_allowed(url, robots_agent).await {
            Ok(true) => {}
            Ok(false) => {
                info!(url, "Forbidden by robots.txt");
                return DetailOutcome::RobotsBlocked;
            }
            Err(e) => warn!(url, error = %e, "robots.txt check failed, fetching anyway"),
        }
    }

    match fetcher.fetch(url).await {
        Ok(page) => {
            debug!(url, status = page.status_code, ms = page.response_time_ms, "Detail page fetched");
            DetailOutcome::Record(details.extract(&page.content, job.summary))
        }
        Err(e) => {
            warn!(url, error = %e, "Failed to fetch detail page");
            DetailOutcome::Failed
        }
    }
}
