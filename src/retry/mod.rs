// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// 重试策略配置
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 最大尝试次数（含首次尝试，>= 1）
    pub max_attempts: u32,
    /// 初始退避时间
    pub base_delay: Duration,
    /// 退避乘数
    pub multiplier: f64,
    /// 最大退避时间
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            multiplier: 2.0,
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// 创建标准重试策略
    pub fn standard() -> Self {
        Self::default()
    }

    /// 创建快速重试策略（更短的退避时间，适合测试与本地环境）
    pub fn fast() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            multiplier: 2.0,
            max_delay: Duration::from_secs(5),
        }
    }

    /// 计算第attempt次失败后的退避时间
    ///
    /// 指数退避：`base_delay * multiplier^(attempt-1)`，受max_delay封顶。
    /// 默认参数下依次为 1000ms、2000ms、4000ms...
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let backoff =
            self.base_delay.as_secs_f64() * self.multiplier.powi(attempt.saturating_sub(1) as i32);
        Duration::from_secs_f64(backoff.min(self.max_delay.as_secs_f64()))
    }

    /// 失败attempt次后是否还有剩余尝试
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// 结合错误类型判断是否应该重试
    ///
    /// 剩余尝试次数与错误可重试性须同时满足
    pub fn should_retry_with_error(&self, attempt: u32, error: &anyhow::Error) -> bool {
        attempt < self.max_attempts && is_retryable_error(error)
    }
}

/// 根据错误类型判断是否可重试
///
/// 浏览器层错误携带自身的可重试性分类；未分类的错误默认视为瞬时故障
pub fn is_retryable_error(error: &anyhow::Error) -> bool {
    if let Some(browser) = error.downcast_ref::<crate::browser::BrowserError>() {
        return browser.is_retryable();
    }
    true
}

/// 重试执行器错误类型
#[derive(Error, Debug)]
pub enum RetryError {
    /// 所有尝试均已耗尽，携带最后一次失败的原因
    #[error("operation '{operation}' failed after {attempts} attempts")]
    Exhausted {
        operation: String,
        attempts: u32,
        /// 最终失败时捕获的诊断快照路径（尽力而为，可能缺失）
        snapshot: Option<PathBuf>,
        #[source]
        source: anyhow::Error,
    },
}

impl RetryError {
    /// 最后一次底层失败
    pub fn last_cause(&self) -> &anyhow::Error {
        match self {
            RetryError::Exhausted { source, .. } => source,
        }
    }

    /// 耗尽前的总尝试次数
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. } => *attempts,
        }
    }
}

/// 重试生命周期钩子
///
/// 三个回调均有空实现，调用方按需覆盖。
/// 每次执行器调用中，成功钩子至多触发一次，最终失败钩子至多触发一次
pub trait RetryHooks: Send + Sync {
    /// 操作成功时触发，attempt为成功时的尝试序号（从1开始）
    fn on_success(&self, _operation: &str, _attempt: u32) {}

    /// 某次尝试失败且还有剩余尝试时触发，随后执行器挂起delay时长
    fn on_retry(&self, _operation: &str, _attempt: u32, _delay: Duration, _error: &anyhow::Error) {}

    /// 所有尝试耗尽时触发，snapshot为诊断快照路径（捕获失败时为None）
    fn on_final_failure(
        &self,
        _operation: &str,
        _attempts: u32,
        _error: &anyhow::Error,
        _snapshot: Option<&Path>,
    ) {
    }
}

/// 无操作钩子
pub struct NoopHooks;

impl RetryHooks for NoopHooks {}

/// 最终失败时的诊断捕获接口
///
/// 捕获只在所有尝试耗尽后执行一次，且是尽力而为：
/// 捕获自身的失败会被记录并吞掉，绝不遮蔽原始操作错误
#[async_trait]
pub trait DiagnosticCapture: Send + Sync {
    async fn capture(&self, operation: &str) -> anyhow::Result<PathBuf>;
}

/// 不做任何捕获
pub struct NoCapture;

#[async_trait]
impl DiagnosticCapture for NoCapture {
    async fn capture(&self, _operation: &str) -> anyhow::Result<PathBuf> {
        anyhow::bail!("diagnostic capture disabled")
    }
}

/// 以有界重试执行异步操作
///
/// 至少执行一次，至多执行`policy.max_attempts`次。操作成功立即返回其值，
/// 不再进行后续尝试；每次非最终失败按策略退避后重试；全部耗尽后执行
/// 一次诊断捕获并以包装了最后一次失败的错误返回。执行器本身不保留
/// 跨调用状态，每次调用相互独立
pub async fn run_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    hooks: &dyn RetryHooks,
    capture: &dyn DiagnosticCapture,
    operation: &str,
    mut op: F,
) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(value) => {
                debug!(operation, attempt = attempt + 1, "operation succeeded");
                hooks.on_success(operation, attempt + 1);
                return Ok(value);
            }
            Err(error) => {
                attempt += 1;
                if policy.should_retry_with_error(attempt, &error) {
                    let delay = policy.delay_for(attempt);
                    warn!(
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "attempt failed, backing off before retry"
                    );
                    metrics::counter!("retry_attempts_total").increment(1);
                    hooks.on_retry(operation, attempt, delay, &error);
                    tokio::time::sleep(delay).await;
                } else {
                    // Best-effort diagnostic capture; its failure must never
                    // replace the operation error.
                    let snapshot = match capture.capture(operation).await {
                        Ok(path) => Some(path),
                        Err(capture_error) => {
                            warn!(
                                operation,
                                error = %capture_error,
                                "diagnostic capture failed"
                            );
                            None
                        }
                    };
                    warn!(
                        operation,
                        attempts = attempt,
                        error = %error,
                        snapshot = ?snapshot,
                        "all attempts exhausted"
                    );
                    metrics::counter!("scraping_errors_total", "error_type" => "retries_exhausted")
                        .increment(1);
                    hooks.on_final_failure(operation, attempt, &error, snapshot.as_deref());
                    return Err(RetryError::Exhausted {
                        operation: operation.to_string(),
                        attempts: attempt,
                        snapshot,
                        source: error,
                    });
                }
            }
        }
    }
}

/// 为未经重试执行器包装的失败补一次尽力而为的诊断捕获
///
/// 每条失败路径在浮出前都要留下快照与结构化日志。重试耗尽错误
/// 在执行器内部已经捕获过，直接复用其快照路径而不再重复捕获
pub async fn snapshot_on_failure(
    capture: &dyn DiagnosticCapture,
    operation: &str,
    error: &anyhow::Error,
) -> Option<PathBuf> {
    if let Some(RetryError::Exhausted { snapshot, .. }) = error.downcast_ref::<RetryError>() {
        return snapshot.clone();
    }
    match capture.capture(operation).await {
        Ok(path) => {
            warn!(
                operation,
                error = %error,
                snapshot = %path.display(),
                "captured diagnostic snapshot for failure"
            );
            Some(path)
        }
        Err(capture_error) => {
            warn!(operation, error = %capture_error, "diagnostic capture failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_for_exponential() {
        let policy = RetryPolicy::standard();

        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(4000));
    }

    #[test]
    fn test_delay_for_max_limit() {
        let policy = RetryPolicy {
            max_delay: Duration::from_secs(5),
            ..RetryPolicy::standard()
        };

        // Attempt 10 would be 512s unbounded; the cap applies.
        assert_eq!(policy.delay_for(10), Duration::from_secs(5));
    }

    #[test]
    fn test_should_retry() {
        let policy = RetryPolicy::standard();

        assert!(policy.should_retry(0));
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3)); // max_attempts = 3
        assert!(!policy.should_retry(4));
    }

    #[test]
    fn test_error_classification() {
        use crate::browser::BrowserError;

        assert!(is_retryable_error(&anyhow::anyhow!("connection reset")));
        assert!(is_retryable_error(&anyhow::Error::from(BrowserError::Timeout(
            "grid never appeared".to_string()
        ))));
        assert!(!is_retryable_error(&anyhow::Error::from(BrowserError::Page(
            "card index out of range".to_string()
        ))));
    }

    #[test]
    fn test_fast_policy_delays() {
        let policy = RetryPolicy::fast();

        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
    }
}
