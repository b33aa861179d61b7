// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 代理提取模块
///
/// 与LLM提供商交互，从页面标记中提取结构化书籍记录
pub mod agent;

/// 应用程序模块
///
/// 组合各组件的端到端目录采集工作流
pub mod application;

/// 浏览器模块
///
/// 浏览器生命周期管理、页面操作辅助与响应拦截
pub mod browser;

/// 增量采集模块
///
/// 懒加载数据源的滚动采集循环与增长预言机
pub mod collect;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含书目领域的数据模型
pub mod domain;

/// 基础设施模块
///
/// 提供指标导出等外部集成
pub mod infrastructure;

/// 页面对象模块
///
/// 书目应用各页面的选择器与交互封装
pub mod pages;

/// 重试模块
///
/// 带指数退避与诊断捕获的有界重试执行器
pub mod retry;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;
