// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::browser::BrowserError;
use crate::retry::DiagnosticCapture;
use crate::utils::wait::await_condition;
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// 导航到url并等待导航完成
pub async fn navigate(page: &Page, url: &str) -> Result<(), BrowserError> {
    page.goto(url).await?;
    page.wait_for_navigation().await.ok(); // Allow this to fail gracefully
    debug!(url, "navigation finished");
    Ok(())
}

/// 在页面上下文求值脚本并反序列化返回值
pub async fn eval_json<T: DeserializeOwned>(page: &Page, script: &str) -> Result<T, BrowserError> {
    page.evaluate(script)
        .await?
        .into_value::<T>()
        .map_err(|e| BrowserError::Page(format!("evaluate result deserialization failed: {}", e)))
}

/// 选择器当前命中的元素数
pub async fn element_count(page: &Page, selector: &str) -> Result<usize, BrowserError> {
    let script = format!(
        "document.querySelectorAll({}).length",
        serde_json::to_string(selector).unwrap_or_default()
    );
    let count: u64 = eval_json(page, &script).await?;
    Ok(count as usize)
}

/// 滚动到页面底部，触发懒加载
pub async fn scroll_to_bottom(page: &Page) -> Result<(), BrowserError> {
    page.evaluate("window.scrollTo(0, document.body.scrollHeight);")
        .await?;
    Ok(())
}

/// 等待选择器至少命中min_count个元素
pub async fn wait_for_selector_count(
    page: &Page,
    selector: &str,
    min_count: usize,
    poll_interval: Duration,
    max_wait: Duration,
) -> Result<(), BrowserError> {
    let ok = await_condition(
        move || async move {
            element_count(page, selector)
                .await
                .map(|c| c >= min_count)
                .unwrap_or(false)
        },
        poll_interval,
        max_wait,
    )
    .await;
    if ok {
        Ok(())
    } else {
        Err(BrowserError::Timeout(format!(
            "selector '{}' did not reach {} element(s) within {:?}",
            selector, min_count, max_wait
        )))
    }
}

/// 等待选择器出现（至少一个元素）
pub async fn wait_for_selector(
    page: &Page,
    selector: &str,
    poll_interval: Duration,
    max_wait: Duration,
) -> Result<(), BrowserError> {
    wait_for_selector_count(page, selector, 1, poll_interval, max_wait).await
}

/// 捕获整页截图并写入path
pub async fn capture_snapshot(page: &Page, path: &Path) -> Result<PathBuf, BrowserError> {
    let params = ScreenshotParams::builder()
        .format(CaptureScreenshotFormat::Png)
        .full_page(true)
        .build();
    let bytes = page.screenshot(params).await?;
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| BrowserError::Page(format!("snapshot write failed: {}", e)))?;
    Ok(path.to_path_buf())
}

/// 最终失败截图的文件名：`final-error-<操作名>-<时间戳>.png`
pub fn snapshot_path(operation: &str) -> PathBuf {
    PathBuf::from(format!(
        "final-error-{}-{}.png",
        operation,
        chrono::Local::now().format("%Y%m%d%H%M%S")
    ))
}

/// 页面截图诊断捕获
///
/// 重试执行器的诊断捕获实现：所有尝试耗尽时对当前页面状态
/// 做一次尽力而为的整页截图
pub struct PageSnapshotCapture {
    page: Page,
}

impl PageSnapshotCapture {
    pub fn new(page: Page) -> Self {
        Self { page }
    }
}

#[async_trait]
impl DiagnosticCapture for PageSnapshotCapture {
    async fn capture(&self, operation: &str) -> anyhow::Result<PathBuf> {
        let path = snapshot_path(operation);
        Ok(capture_snapshot(&self.page, &path).await?)
    }
}
