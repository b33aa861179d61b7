// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::browser::{page_ops, BrowserError};
use crate::collect::oracle::DomCountOracle;
use crate::collect::{collect_until_exhausted, CollectConfig, CollectionOutcome};
use crate::domain::models::BookRecord;
use crate::utils::wait::await_condition;
use chromiumoxide::Page;
use std::time::Duration;

const BOOK_GRID: &str = ".book-grid";
const BOOK_CARD: &str = ".book-card";

/// 书籍列表页面对象
///
/// 封装列表页的全部选择器与交互，懒加载的完整物化委托给采集循环
pub struct BookListPage {
    page: Page,
}

impl BookListPage {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 等待列表页加载完成：网格可见且至少渲染了3张卡片
    pub async fn wait_for_load(&self) -> Result<(), BrowserError> {
        page_ops::wait_for_selector(
            &self.page,
            BOOK_GRID,
            Duration::from_millis(500),
            Duration::from_secs(10),
        )
        .await?;
        page_ops::wait_for_selector_count(
            &self.page,
            BOOK_CARD,
            3,
            Duration::from_millis(500),
            Duration::from_secs(10),
        )
        .await
    }

    /// 当前可见的书籍数
    pub async fn book_count(&self) -> Result<usize, BrowserError> {
        page_ops::element_count(&self.page, BOOK_CARD).await
    }

    /// 第index本书的标题
    pub async fn book_title(&self, index: usize) -> Result<String, BrowserError> {
        let script = format!(
            "document.querySelectorAll('{}')[{}]?.querySelector('.book-title')?.textContent?.trim() ?? ''",
            BOOK_CARD, index
        );
        page_ops::eval_json::<String>(&self.page, &script).await
    }

    /// 第index本书的唯一键（data-key属性）
    pub async fn book_key(&self, index: usize) -> Result<String, BrowserError> {
        let script = format!(
            "document.querySelectorAll('{}')[{}]?.getAttribute('data-key') ?? ''",
            BOOK_CARD, index
        );
        page_ops::eval_json::<String>(&self.page, &script).await
    }

    /// 点击第index本书，等待路由切换到详情页，返回其key
    pub async fn click_book(&self, index: usize) -> Result<String, BrowserError> {
        let key = self.book_key(index).await?;

        let cards = self.page.find_elements(BOOK_CARD).await?;
        let card = cards.into_iter().nth(index).ok_or_else(|| {
            BrowserError::Page(format!("book card index {} out of range", index))
        })?;
        card.click().await?;

        let page = &self.page;
        let navigated = await_condition(
            move || async move {
                page_ops::eval_json::<String>(page, "window.location.href")
                    .await
                    .map(|url| url.contains("/book/"))
                    .unwrap_or(false)
            },
            Duration::from_millis(500),
            Duration::from_secs(10),
        )
        .await;
        if !navigated {
            return Err(BrowserError::Timeout(
                "detail route did not appear after card click".to_string(),
            ));
        }

        metrics::counter!("book_detail_views_total").increment(1);
        Ok(key)
    }

    /// 提取前max_count本可见书籍的key与标题
    pub async fn visible_books(&self, max_count: usize) -> Result<Vec<BookRecord>, BrowserError> {
        let script = format!(
            r#"Array.from(document.querySelectorAll('{}')).slice(0, {}).map(card => ({{
                key: card.getAttribute('data-key') ?? '',
                title: card.querySelector('.book-title')?.textContent?.trim() ?? '',
                authors: [],
                isbn: ''
            }}))"#,
            BOOK_CARD, max_count
        );
        page_ops::eval_json::<Vec<BookRecord>>(&self.page, &script).await
    }

    /// 反复滚动直到懒加载耗尽，返回采集循环的终态结果
    pub async fn load_all_books(
        &self,
        config: &CollectConfig,
    ) -> anyhow::Result<CollectionOutcome> {
        let mut oracle = DomCountOracle::new(self.page.clone(), BOOK_CARD);
        collect_until_exhausted(config, &mut oracle).await
    }

    /// 整页HTML，供LLM提取路径使用
    pub async fn html(&self) -> Result<String, BrowserError> {
        self.page
            .content()
            .await
            .map_err(BrowserError::from)
    }
}
