// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::BookRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

const TITLE_SELECTOR: &str = ".book-title";
const AUTHOR_SELECTOR: &str = ".book-author";

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));
static ISBN_NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9Xx]").expect("static regex"));

/// 结构化卡片提取器
///
/// 直接从目录页HTML解析书籍卡片，不依赖浏览器也不依赖LLM。
/// 未配置LLM密钥时作为代理提取通道的确定性替代
pub struct CardExtractor {
    card: Selector,
    title: Selector,
    author: Selector,
}

impl CardExtractor {
    /// 构建提取器，卡片选择器来自配置，非法选择器直接报错
    pub fn new(card_selector: &str) -> Result<Self, String> {
        let card = Selector::parse(card_selector)
            .map_err(|e| format!("invalid card selector '{}': {}", card_selector, e))?;
        let title = Selector::parse(TITLE_SELECTOR)
            .map_err(|e| format!("invalid selector: {}", e))?;
        let author = Selector::parse(AUTHOR_SELECTOR)
            .map_err(|e| format!("invalid selector: {}", e))?;
        Ok(Self {
            card,
            title,
            author,
        })
    }

    /// 从整页HTML提取全部可见卡片
    pub fn extract(&self, html: &str) -> Vec<BookRecord> {
        let document = Html::parse_document(html);
        let records: Vec<BookRecord> = document
            .select(&self.card)
            .map(|card| self.record_from(card))
            .collect();
        debug!(count = records.len(), "extracted book cards from markup");
        records
    }

    fn record_from(&self, card: ElementRef<'_>) -> BookRecord {
        let title = card
            .select(&self.title)
            .next()
            .map(|e| collapse_whitespace(&e.text().collect::<String>()))
            .unwrap_or_default();
        let authors = card
            .select(&self.author)
            .map(|e| collapse_whitespace(&e.text().collect::<String>()))
            .filter(|name| !name.is_empty())
            .collect();
        BookRecord {
            key: card.value().attr("data-key").unwrap_or_default().to_string(),
            title,
            authors,
            isbn: normalize_isbn(card.value().attr("data-isbn").unwrap_or_default()),
            ..BookRecord::default()
        }
    }
}

/// 折叠连续空白并去除首尾空白
fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// 归一化ISBN：去掉连字符、空格等噪声字符，仅保留数字与校验位X
fn normalize_isbn(raw: &str) -> String {
    ISBN_NOISE.replace_all(raw, "").to_uppercase()
}
