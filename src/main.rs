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

use bookcrawl::application::CatalogScraper;
use bookcrawl::browser::manager::BrowserManager;
use bookcrawl::config::settings::Settings;
use bookcrawl::infrastructure::metrics;
use bookcrawl::utils::telemetry;
use std::sync::Arc;
use tracing::{error, info};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并运行一次目录采集
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting bookcrawl...");

    // 2. Load configuration
    let settings = Arc::new(Settings::new()?);
    info!("Configuration loaded");

    // 3. Initialize Prometheus metrics
    if settings.metrics.enabled {
        metrics::init_metrics(settings.metrics.port);
    }

    // 4. Launch browser
    let manager = BrowserManager::launch(&settings.browser).await?;

    // 5. Run the collection workflow
    let scraper = CatalogScraper::new(settings.clone());
    let result = scraper.run(&manager).await;

    manager.close().await;

    match result {
        Ok(report) => {
            info!(
                books = report.books.len(),
                agent_books = report.agent_books.len(),
                malformed = report.malformed_responses,
                rounds = report.outcome.attempts_used,
                reason = ?report.outcome.stop_reason,
                "bookcrawl finished"
            );
            println!("{}", serde_json::to_string_pretty(&report.books)?);
            Ok(())
        }
        Err(e) => {
            // Diagnostic artifacts (snapshot + structured logs) were already
            // emitted on the failure path; surface a non-zero exit.
            error!(error = %e, "bookcrawl failed");
            Err(e)
        }
    }
}
