// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 浏览器模块
///
/// 基于chromiumoxide的浏览器生命周期管理、页面操作辅助与响应拦截
pub mod interceptor;
pub mod manager;
pub mod page_ops;

use thiserror::Error;

/// 浏览器层错误类型
#[derive(Error, Debug)]
pub enum BrowserError {
    /// 浏览器协议错误
    #[error("browser protocol error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),
    /// 浏览器配置错误
    #[error("browser config error: {0}")]
    Config(String),
    /// 页面操作失败
    #[error("page operation failed: {0}")]
    Page(String),
    /// 等待超时
    #[error("wait timed out: {0}")]
    Timeout(String),
}

impl BrowserError {
    /// 判断错误是否可重试
    ///
    /// 协议层与超时错误视为瞬时故障，配置错误不可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            BrowserError::Cdp(_) | BrowserError::Timeout(_) => true,
            BrowserError::Config(_) => false,
            BrowserError::Page(_) => false,
        }
    }
}
