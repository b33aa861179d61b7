// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::browser::{page_ops, BrowserError};
use chromiumoxide::Page;
use std::time::Duration;

const DETAIL_TITLE: &str = ".book-detail-title";
const DETAIL_AUTHORS: &str = ".book-detail-authors .author-name";
const DETAIL_DESCRIPTION: &str = ".book-detail-description";
const DETAIL_ISBN: &str = ".book-detail-isbn";
const LIST_GRID: &str = ".book-grid";

/// 书籍详情页面对象
pub struct BookDetailPage {
    page: Page,
}

impl BookDetailPage {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 等待详情页内容加载完成
    pub async fn wait_for_load(&self) -> Result<(), BrowserError> {
        page_ops::wait_for_selector(
            &self.page,
            DETAIL_TITLE,
            Duration::from_millis(500),
            Duration::from_secs(10),
        )
        .await
    }

    /// 书名
    pub async fn title(&self) -> Result<String, BrowserError> {
        self.text_of(DETAIL_TITLE).await
    }

    /// 作者名列表
    pub async fn authors(&self) -> Result<Vec<String>, BrowserError> {
        let script = format!(
            "Array.from(document.querySelectorAll('{}')).map(e => e.textContent?.trim() ?? '')",
            DETAIL_AUTHORS
        );
        page_ops::eval_json::<Vec<String>>(&self.page, &script).await
    }

    /// 描述，详情页未渲染描述时为None
    pub async fn description(&self) -> Result<Option<String>, BrowserError> {
        let text = self.text_of(DETAIL_DESCRIPTION).await?;
        Ok(if text.is_empty() { None } else { Some(text) })
    }

    /// ISBN
    pub async fn isbn(&self) -> Result<String, BrowserError> {
        self.text_of(DETAIL_ISBN).await
    }

    /// 返回列表页并等待网格重新可见
    pub async fn back_to_list(&self) -> Result<(), BrowserError> {
        self.page.evaluate("history.back();").await?;
        page_ops::wait_for_selector(
            &self.page,
            LIST_GRID,
            Duration::from_millis(500),
            Duration::from_secs(10),
        )
        .await
    }

    async fn text_of(&self, selector: &str) -> Result<String, BrowserError> {
        let script = format!(
            "document.querySelector('{}')?.textContent?.trim() ?? ''",
            selector
        );
        page_ops::eval_json::<String>(&self.page, &script).await
    }
}
