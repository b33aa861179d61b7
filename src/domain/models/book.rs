// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// 书籍数据传输对象
///
/// 对应书目API返回的单本书籍记录，所有字段均为可选，
/// 上游数据源不保证完整性
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Book {
    /// 书籍唯一键
    #[serde(default)]
    pub key: Option<String>,
    /// 书名
    #[serde(default)]
    pub title: Option<String>,
    /// 作者列表
    #[serde(default)]
    pub authors: Option<Vec<Author>>,
    /// ISBN编号列表
    #[serde(default)]
    pub isbn: Option<Vec<String>>,
    /// 出版日期
    #[serde(default)]
    pub publish_date: Option<String>,
    /// 页数
    #[serde(default)]
    pub number_of_pages: Option<i64>,
    /// 封面图片
    #[serde(default)]
    pub cover: Option<Cover>,
    /// 主题列表
    #[serde(default)]
    pub subjects: Option<Vec<String>>,
    /// 描述
    #[serde(default)]
    pub description: Option<String>,
    /// 第一句
    #[serde(default)]
    pub first_sentence: Option<String>,
    /// 语言代码
    #[serde(default)]
    pub language: Option<String>,
}

/// 作者数据传输对象
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// 封面图片URL集合（小/中/大三种尺寸）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cover {
    #[serde(default)]
    pub small: Option<String>,
    #[serde(default)]
    pub medium: Option<String>,
    #[serde(default)]
    pub large: Option<String>,
}

/// 分页响应数据传输对象
///
/// 对应 `/api/books` 分页接口的响应信封。
/// `has_more=false` 是权威的"没有更多页"信号
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BooksPage {
    /// 本页书籍列表
    #[serde(default)]
    pub data: Option<Vec<Book>>,
    /// 可用书籍总数
    #[serde(default)]
    pub total: Option<usize>,
    /// 当前页码
    #[serde(default)]
    pub page: Option<u32>,
    /// 每页条数
    #[serde(default)]
    pub limit: Option<u32>,
    /// 是否还有后续页
    #[serde(default, rename = "hasMore")]
    pub has_more: Option<bool>,
}

/// 扁平化的书籍记录
///
/// LLM提取与页面对象提取共用的输出形状，字段别名
/// 兼容大写开头的键名（LLM输出不保证大小写）
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BookRecord {
    #[serde(default, alias = "Key")]
    pub key: String,
    #[serde(default, alias = "Title")]
    pub title: String,
    #[serde(default, alias = "Authors")]
    pub authors: Vec<String>,
    #[serde(default, alias = "Isbn")]
    pub isbn: String,
    #[serde(default, alias = "Description")]
    pub description: Option<String>,
    #[serde(default, alias = "PublishDate", alias = "publishDate")]
    pub publish_date: Option<String>,
    #[serde(default, alias = "NumberOfPages", alias = "numberOfPages")]
    pub number_of_pages: Option<i64>,
}
