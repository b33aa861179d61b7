// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 代理提取模块
///
/// 与LLM提供商交互，从页面标记中提取结构化书籍记录
pub mod llm;

pub use llm::{AgentError, BookExtractor, LlmExtractor};
