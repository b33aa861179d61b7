// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::agent::{BookExtractor, LlmExtractor};
use crate::browser::interceptor::attach_books_interceptor;
use crate::browser::manager::BrowserManager;
use crate::browser::page_ops::{self, PageSnapshotCapture};
use crate::collect::accumulator::PageAccumulator;
use crate::collect::oracle::NetworkOracle;
use crate::collect::{collect_until_exhausted, CollectionOutcome};
use crate::config::settings::Settings;
use crate::domain::extract::CardExtractor;
use crate::domain::models::{Book, BookRecord};
use crate::pages::{BookDetailPage, BookListPage};
use crate::retry::{run_with_retry, snapshot_on_failure, NoopHooks};
use chromiumoxide::Page;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// 一次目录采集运行的结果
#[derive(Debug)]
pub struct CatalogReport {
    /// 拦截路径累计到的书籍
    pub books: Vec<Book>,
    /// 采集循环终态
    pub outcome: CollectionOutcome,
    /// 跳过的畸形响应数
    pub malformed_responses: u32,
    /// 拦截路径一无所获时经DOM路径提取的记录
    pub dom_books: Vec<BookRecord>,
    /// 代理提取路径得到的记录（未配置API密钥时为空）
    pub agent_books: Vec<BookRecord>,
    /// 详情页抽查得到的样本记录
    pub sample_detail: Option<BookRecord>,
}

/// 目录采集工作流
///
/// 导航到书目站点，挂接分页响应拦截，以网络感知采集循环驱动懒加载
/// 到完整物化，可选地对最终页面做一次LLM提取作为交叉通道
pub struct CatalogScraper {
    settings: Arc<Settings>,
}

impl CatalogScraper {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    pub async fn run(&self, manager: &BrowserManager) -> anyhow::Result<CatalogReport> {
        let page = manager.new_page("about:blank").await?;
        let accumulator = Arc::new(PageAccumulator::new());

        // Interception must be in place before the first navigation so the
        // initial page request is captured too.
        let interceptor = attach_books_interceptor(
            &page,
            &self.settings.catalog.api_pattern,
            accumulator.clone(),
        )
        .await?;
        let capture = PageSnapshotCapture::new(page.clone());

        let result = self.drive(&page, &capture, &accumulator).await;
        interceptor.abort();

        if let Err(error) = &result {
            // Wait timeouts and loop errors bypass the retry executor; they
            // still leave a snapshot before surfacing.
            snapshot_on_failure(&capture, "collect-catalog", error).await;
        }
        result
    }

    async fn drive(
        &self,
        page: &Page,
        capture: &PageSnapshotCapture,
        accumulator: &Arc<PageAccumulator>,
    ) -> anyhow::Result<CatalogReport> {
        let policy = self.settings.retry.policy();
        let url = self.settings.catalog.base_url.clone();

        let load_started = Instant::now();
        run_with_retry(&policy, &NoopHooks, capture, "load-catalog", || {
            let page = page.clone();
            let url = url.clone();
            async move { Ok(page_ops::navigate(&page, &url).await?) }
        })
        .await?;
        metrics::histogram!("page_load_time_seconds")
            .record(load_started.elapsed().as_secs_f64());

        let list = BookListPage::new(page.clone());
        list.wait_for_load().await?;
        info!(url = %self.settings.catalog.base_url, "catalog page loaded");

        let mut oracle = NetworkOracle::new(page.clone(), accumulator.clone());
        let outcome =
            collect_until_exhausted(&self.settings.collection.collect_config(), &mut oracle)
                .await?;
        metrics::counter!("books_scraped_total").increment(outcome.final_count as u64);
        info!(
            final_count = outcome.final_count,
            rounds = outcome.attempts_used,
            reason = ?outcome.stop_reason,
            "collection finished"
        );

        // Interception can come up empty against catalogs that render
        // server-side; fall back to counting and reading the DOM.
        let dom_books = if accumulator.is_empty() {
            let dom_outcome = list.load_all_books(&self.settings.collection.collect_config())
                .await?;
            info!(
                final_count = dom_outcome.final_count,
                "interception saw no pages, extracted books from the DOM instead"
            );
            list.visible_books(dom_outcome.final_count).await?
        } else {
            Vec::new()
        };

        let agent_books = self.agent_pass(&list).await;
        let sample_detail = self.detail_probe(&list).await;

        Ok(CatalogReport {
            books: accumulator.books(),
            malformed_responses: accumulator.malformed_count(),
            outcome,
            dom_books,
            agent_books,
            sample_detail,
        })
    }

    /// 抽查第一本书的详情页，校验列表与详情的一致性
    ///
    /// 抽查失败只记录，不影响整次运行
    async fn detail_probe(&self, list: &BookListPage) -> Option<BookRecord> {
        let key = match list.click_book(0).await {
            Ok(key) => key,
            Err(e) => {
                warn!(error = %e, "detail probe could not open the first book");
                return None;
            }
        };

        let detail = BookDetailPage::new(list.page().clone());
        let record = async {
            detail.wait_for_load().await?;
            let record = BookRecord {
                key,
                title: detail.title().await?,
                authors: detail.authors().await?,
                isbn: detail.isbn().await?,
                description: detail.description().await?,
                ..BookRecord::default()
            };
            detail.back_to_list().await?;
            Ok::<_, crate::browser::BrowserError>(record)
        }
        .await;

        match record {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "detail probe failed");
                None
            }
        }
    }

    /// 代理提取通道，任何失败降级为空结果
    ///
    /// 未配置API密钥时退回scraper结构化提取，保证该通道总有产出路径
    async fn agent_pass(&self, list: &BookListPage) -> Vec<BookRecord> {
        let html = match list.html().await {
            Ok(html) => html,
            Err(e) => {
                warn!(error = %e, "failed to read page markup for agent extraction");
                return Vec::new();
            }
        };

        if self.settings.agent.api_key.is_none() {
            info!("agent api key not configured, using structural extraction");
            return match CardExtractor::new(&self.settings.catalog.card_selector) {
                Ok(extractor) => extractor.extract(&html),
                Err(e) => {
                    warn!(error = %e, "structural extraction unavailable");
                    Vec::new()
                }
            };
        }

        let extractor = LlmExtractor::from_settings(&self.settings.agent);
        match extractor.extract_books(&html).await {
            Ok(books) => {
                info!(count = books.len(), "agent extraction finished");
                books
            }
            Err(e) => {
                warn!(error = %e, "agent extraction failed, degrading to empty result");
                Vec::new()
            }
        }
    }
}
