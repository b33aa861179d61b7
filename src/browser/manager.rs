// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::browser::BrowserError;
use crate::config::settings::BrowserSettings;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// 浏览器生命周期管理器
///
/// 封装chromiumoxide浏览器的启动（或远程连接）、页面创建与资源释放。
/// 同一管理器上的自动化操作假定单页面、单在途操作的串行模型
pub struct BrowserManager {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

impl BrowserManager {
    /// 启动浏览器或连接到远程调试实例
    ///
    /// 设置了remote_debugging_url时连接已有Chrome实例，
    /// 否则以配置的headless模式本地启动
    pub async fn launch(settings: &BrowserSettings) -> Result<Self, BrowserError> {
        let (browser, mut handler) = if let Some(url) = &settings.remote_debugging_url {
            info!("Connecting to remote Chrome instance at: {}", url);
            Browser::connect(url).await?
        } else {
            let mut builder = BrowserConfig::builder()
                .no_sandbox()
                .request_timeout(Duration::from_secs(settings.request_timeout_secs));
            if !settings.headless {
                builder = builder.with_head();
            }
            builder = builder.arg("--disable-gpu").arg("--disable-dev-shm-usage");

            Browser::launch(builder.build().map_err(BrowserError::Config)?).await?
        };

        // Drive browser events until the connection ends.
        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
            debug!("browser event handler finished");
        });

        info!("Browser ready");
        Ok(Self {
            browser,
            handler_task,
        })
    }

    /// 创建并导航到url的新页面
    pub async fn new_page(&self, url: &str) -> Result<Page, BrowserError> {
        Ok(self.browser.new_page(url).await?)
    }

    /// 关闭浏览器并回收事件处理任务
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!("browser close failed: {}", e);
        }
        self.handler_task.abort();
    }
}
