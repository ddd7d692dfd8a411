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

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use vacancy_crawler::application::use_cases::crawl_use_case::CrawlUseCase;
use vacancy_crawler::config::settings::Settings;
use vacancy_crawler::engines::chromium_engine::ChromiumLauncher;
use vacancy_crawler::infrastructure::metrics::init_metrics;
use vacancy_crawler::infrastructure::sinks::open_sink;
use vacancy_crawler::utils::telemetry;

/// 主函数
///
/// 加载配置、组装组件并执行一次完整爬取
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting vacancy-crawler...");

    // 2. Load configuration
    let settings = Settings::load()?;
    let queries = settings.search_queries()?;
    info!(queries = queries.len(), "Configuration loaded");

    init_metrics(settings.metrics.prometheus_listen);

    // 3. Build the crawl pipeline
    let launcher = Arc::new(ChromiumLauncher::new(settings.browser_options()));
    let use_case = CrawlUseCase::from_settings(&settings, launcher)?;

    // 4. Output
    let sink = open_sink(settings.output.path.as_deref()).await?;

    // 5. Shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, shutting down");
            let _ = shutdown_tx.send(true);
        }
    });

    // 6. Crawl
    let report = use_case.run(&queries, sink, shutdown_rx).await?;
    info!(
        run_id = %report.run_id,
        records = report.records_emitted,
        cancelled = report.cancelled,
        "vacancy-crawler finished"
    );

    Ok(())
}
