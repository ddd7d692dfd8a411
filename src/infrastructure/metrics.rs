// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

/// 启动 Prometheus 导出器
///
/// 未配置监听地址时不安装 recorder，各处的计数器调用为空操作
pub fn init_metrics(listen: Option<SocketAddr>) {
    let Some(addr) = listen else {
        return;
    };

    // Ignore error if address is already in use (for development/testing)
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        tracing::warn!("Failed to install Prometheus recorder: {}. This might happen if the port is already in use.", e);
        return;
    }

    metrics::describe_counter!("load_more_clicks_total", "'Load more' clicks performed");
    metrics::describe_counter!("listings_found_total", "Listing summaries extracted");
    metrics::describe_counter!("vacancies_emitted_total", "Vacancy records written to the sink");
    metrics::describe_counter!("detail_failures_total", "Detail pages that produced no record");

    info!("Metrics exporter listening on {}", addr);
}
