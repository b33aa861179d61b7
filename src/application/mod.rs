// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 组合浏览器、采集循环、重试执行器与代理提取的端到端工作流
pub mod catalog;

pub use catalog::{CatalogReport, CatalogScraper};
