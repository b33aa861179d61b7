// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模块
///
/// 包含书目领域的数据模型与结构化提取
pub mod extract;
pub mod models;
