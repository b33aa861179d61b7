// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// 轮询等待条件成立
///
/// 以固定间隔反复求值谓词，直到谓词返回true或等待窗口耗尽。
/// 谓词至少被求值一次；窗口耗尽返回false，调用方自行决定这是否是错误。
///
/// # 参数
///
/// * `predicate` - 异步谓词，每次轮询求值一次
/// * `poll_interval` - 轮询间隔
/// * `max_wait` - 最大等待窗口
pub async fn await_condition<F, Fut>(
    mut predicate: F,
    poll_interval: Duration,
    max_wait: Duration,
) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + max_wait;
    loop {
        if predicate().await {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_immediate_success_does_not_sleep() {
        let start = Instant::now();
        let ok = await_condition(
            || async { true },
            Duration::from_millis(500),
            Duration::from_secs(5),
        )
        .await;
        assert!(ok);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_when_condition_never_holds() {
        let start = Instant::now();
        let ok = await_condition(
            || async { false },
            Duration::from_millis(500),
            Duration::from_secs(5),
        )
        .await;
        assert!(!ok);
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_condition_holds_after_a_few_polls() {
        let polls = AtomicU32::new(0);
        let ok = await_condition(
            || {
                let n = polls.fetch_add(1, Ordering::SeqCst) + 1;
                async move { n >= 3 }
            },
            Duration::from_millis(500),
            Duration::from_secs(5),
        )
        .await;
        assert!(ok);
        assert_eq!(polls.load(Ordering::SeqCst), 3);
    }
}
