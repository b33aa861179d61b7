// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

/// 初始化指标系统
///
/// 安装Prometheus导出器并注册应用所需的各类监控指标
pub fn init_metrics(port: u16) {
    let builder = PrometheusBuilder::new();
    let addr: SocketAddr = SocketAddr::from(([0, 0, 0, 0], port));

    // Start the exporter
    // Ignore error if address is already in use (for development/testing)
    if let Err(e) = builder.with_http_listener(addr).install() {
        tracing::warn!(
            "Failed to install Prometheus recorder: {}. This might happen if the port is already in use.",
            e
        );
        return;
    }

    describe_counter!("books_scraped_total", "Total number of books collected");
    describe_counter!(
        "scraping_errors_total",
        "Total number of errors during scraping, by error_type"
    );
    describe_counter!(
        "scroll_attempts_total",
        "Total number of load-more triggers issued by the collection loop"
    );
    describe_counter!(
        "pagination_requests_total",
        "Total number of paginated responses successfully ingested"
    );
    describe_counter!(
        "retry_attempts_total",
        "Total number of retries performed by the retry executor"
    );
    describe_counter!(
        "book_detail_views_total",
        "Total number of book detail navigations"
    );
    describe_counter!(
        "llm_requests_total",
        "Total number of LLM extraction requests, by status"
    );
    describe_histogram!(
        "page_load_time_seconds",
        "Time spent loading the catalog page in seconds"
    );
    describe_histogram!(
        "llm_latency_seconds",
        "Latency of LLM extraction requests in seconds"
    );

    info!("Metrics exporter listening on {}", addr);
}
