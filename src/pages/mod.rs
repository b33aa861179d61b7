// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 页面对象模块
///
/// 以页面对象模式封装书目应用各页面的选择器与交互
pub mod book_detail;
pub mod book_list;

pub use book_detail::BookDetailPage;
pub use book_list::BookListPage;
