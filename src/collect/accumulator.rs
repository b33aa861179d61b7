// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::{Book, BooksPage};
use parking_lot::Mutex;
use tracing::{debug, warn};

#[derive(Default)]
struct AccumulatorState {
    books: Vec<Book>,
    total: Option<usize>,
    exhausted: bool,
    pages_seen: u32,
    malformed: u32,
}

/// 拦截响应累加器
///
/// 收集从网络拦截回调送入的分页响应，作为网络感知型增长预言机的
/// 数据后端。累加器只追加，不去重；畸形响应体记录后跳过，贡献为零，
/// 绝不使整次运行失败
#[derive(Default)]
pub struct PageAccumulator {
    inner: Mutex<AccumulatorState>,
}

impl PageAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 送入一个拦截到的响应体，返回本次新增的书籍数
    ///
    /// 优先按分页信封解析，data缺失但携带total或hasMore的信封视为
    /// 零条目页，其权威信号照常生效；为兼容旧端点，非信封体回退为
    /// 裸书籍数组。两者均失败视为畸形响应，计数后跳过
    pub fn ingest(&self, body: &str) -> usize {
        let page = match serde_json::from_str::<BooksPage>(body) {
            Ok(page)
                if page.data.is_some() || page.total.is_some() || page.has_more.is_some() =>
            {
                page
            }
            _ => match serde_json::from_str::<Vec<Book>>(body) {
                Ok(books) => BooksPage {
                    data: Some(books),
                    ..BooksPage::default()
                },
                Err(error) => {
                    warn!(error = %error, "malformed response body, skipping");
                    metrics::counter!("scraping_errors_total", "error_type" => "malformed_response")
                        .increment(1);
                    self.inner.lock().malformed += 1;
                    return 0;
                }
            },
        };

        let books = page.data.unwrap_or_default();
        let added = books.len();

        let mut state = self.inner.lock();
        state.pages_seen += 1;
        if let Some(total) = page.total {
            state.total = Some(total);
        }
        if page.has_more == Some(false) {
            state.exhausted = true;
        }
        // An empty page carries the same meaning as hasMore=false.
        if added == 0 {
            state.exhausted = true;
        }
        state.books.extend(books);

        metrics::counter!("pagination_requests_total").increment(1);
        debug!(
            added,
            accumulated = state.books.len(),
            total = ?state.total,
            exhausted = state.exhausted,
            "page ingested"
        );
        added
    }

    /// 数据源异常（如非200响应）时由拦截回调调用，停止后续触发
    pub fn mark_exhausted(&self) {
        self.inner.lock().exhausted = true;
    }

    /// 当前累计书籍数
    pub fn len(&self) -> usize {
        self.inner.lock().books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 数据源报告的权威总量（若已观测到）
    pub fn total(&self) -> Option<usize> {
        self.inner.lock().total
    }

    /// 数据源是否已权威地声明耗尽
    pub fn exhausted(&self) -> bool {
        self.inner.lock().exhausted
    }

    /// 已成功解析的页数
    pub fn pages_seen(&self) -> u32 {
        self.inner.lock().pages_seen
    }

    /// 已跳过的畸形响应数
    pub fn malformed_count(&self) -> u32 {
        self.inner.lock().malformed
    }

    /// 累计书籍的快照副本
    pub fn books(&self) -> Vec<Book> {
        self.inner.lock().books.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_body(count: usize, total: usize, has_more: bool) -> String {
        let books: Vec<String> = (0..count)
            .map(|i| format!(r#"{{"key": "/works/OL{}W", "title": "Book {}"}}"#, i, i))
            .collect();
        format!(
            r#"{{"data": [{}], "total": {}, "page": 1, "limit": {}, "hasMore": {}}}"#,
            books.join(","),
            total,
            count,
            has_more
        )
    }

    #[test]
    fn test_ingest_paginated_envelope() {
        let acc = PageAccumulator::new();

        assert_eq!(acc.ingest(&page_body(10, 25, true)), 10);
        assert_eq!(acc.len(), 10);
        assert_eq!(acc.total(), Some(25));
        assert!(!acc.exhausted());
    }

    #[test]
    fn test_ingest_bare_array_fallback() {
        let acc = PageAccumulator::new();

        let added = acc.ingest(r#"[{"key": "/works/OL1W", "title": "Solo"}]"#);
        assert_eq!(added, 1);
        assert_eq!(acc.len(), 1);
        assert_eq!(acc.total(), None);
    }

    #[test]
    fn test_has_more_false_marks_exhausted() {
        let acc = PageAccumulator::new();

        acc.ingest(&page_body(10, 25, true));
        assert!(!acc.exhausted());
        acc.ingest(&page_body(5, 25, false));
        assert!(acc.exhausted());
        assert_eq!(acc.len(), 15);
    }

    #[test]
    fn test_empty_page_marks_exhausted() {
        let acc = PageAccumulator::new();

        acc.ingest(&page_body(0, 25, true));
        assert!(acc.exhausted());
        assert_eq!(acc.len(), 0);
    }

    #[test]
    fn test_envelope_without_data_keeps_authoritative_signals() {
        let acc = PageAccumulator::new();

        let added = acc.ingest(r#"{"total": 25, "hasMore": false}"#);

        // A dataless envelope is a zero-item page, not a malformed body.
        assert_eq!(added, 0);
        assert_eq!(acc.total(), Some(25));
        assert!(acc.exhausted());
        assert_eq!(acc.malformed_count(), 0);
        assert_eq!(acc.pages_seen(), 1);
    }

    #[test]
    fn test_malformed_body_is_skipped_not_fatal() {
        let acc = PageAccumulator::new();

        acc.ingest(&page_body(10, 25, true));
        assert_eq!(acc.ingest("this is not json{{"), 0);
        acc.ingest(&page_body(10, 25, true));

        // Same accumulated count as the sequence without the malformed body.
        assert_eq!(acc.len(), 20);
        assert_eq!(acc.malformed_count(), 1);
        assert_eq!(acc.pages_seen(), 2);
        assert!(!acc.exhausted());
    }
}
