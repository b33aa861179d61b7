// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 增量采集模块
///
/// 驱动懒加载数据源完整物化：反复触发"加载更多"，等待可观测的增长，
/// 在增长停止、达到已知总量或触达轮次上限时终止
pub mod accumulator;
pub mod oracle;

use crate::collect::oracle::GrowthOracle;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// 采集循环配置
#[derive(Debug, Clone)]
pub struct CollectConfig {
    /// 增长轮询间隔
    pub poll_interval: Duration,
    /// 单轮最大等待窗口，窗口内无增长即视为停滞
    pub max_wait: Duration,
    /// 触发轮次安全上限，独立于停滞检测，防止病态源导致的失控循环
    pub max_rounds: u32,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            max_wait: Duration::from_millis(5000),
            max_rounds: 15,
        }
    }
}

/// 采集循环的终止原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// 等待窗口内无增长。端点数据耗尽与暂时性迟缓在此不可区分，
    /// 统一视为正常终止信号而非错误
    Stalled,
    /// 累计数量已达数据源报告的权威总量
    TotalReached,
    /// 数据源权威地声明没有更多数据（hasMore=false）
    SourceExhausted,
    /// 触达轮次安全上限
    RoundLimit,
}

/// 采集循环的终态结果
#[derive(Debug, Clone)]
pub struct CollectionOutcome {
    /// 终止时的最终数量（等于运行期间观测到的最大值）
    pub final_count: usize,
    /// 产生了增长的轮次数
    pub attempts_used: u32,
    /// 终止原因
    pub stop_reason: StopReason,
}

/// 运行采集循环直到数据源耗尽
///
/// 触发与等待严格串行：前一轮等待未结束绝不发出新触发。
/// 单个未产生增长的轮次即足以终止循环；轮内不做重试，
/// 调用方如需容忍触发失败应以重试执行器包装oracle的触发实现
pub async fn collect_until_exhausted<O>(
    config: &CollectConfig,
    oracle: &mut O,
) -> anyhow::Result<CollectionOutcome>
where
    O: GrowthOracle + ?Sized,
{
    let mut previous = oracle.current_count().await?;
    let mut attempts_used: u32 = 0;

    loop {
        if let Some(total) = oracle.known_total() {
            if previous >= total {
                info!(final_count = previous, total, "known total reached");
                return Ok(CollectionOutcome {
                    final_count: previous,
                    attempts_used,
                    stop_reason: StopReason::TotalReached,
                });
            }
        }
        if oracle.source_exhausted() {
            info!(final_count = previous, "source reported no more data");
            return Ok(CollectionOutcome {
                final_count: previous,
                attempts_used,
                stop_reason: StopReason::SourceExhausted,
            });
        }
        if attempts_used >= config.max_rounds {
            info!(
                final_count = previous,
                rounds = attempts_used,
                "round ceiling hit, stopping collection"
            );
            return Ok(CollectionOutcome {
                final_count: previous,
                attempts_used,
                stop_reason: StopReason::RoundLimit,
            });
        }

        oracle.trigger().await?;
        metrics::counter!("scroll_attempts_total").increment(1);

        match wait_for_growth(oracle, previous, config).await? {
            Some(current) => {
                debug!(
                    previous,
                    current,
                    added = current - previous,
                    "productive round"
                );
                previous = current;
                attempts_used += 1;
            }
            None => {
                info!(
                    final_count = previous,
                    rounds = attempts_used,
                    "no growth within wait window, collection done"
                );
                return Ok(CollectionOutcome {
                    final_count: previous,
                    attempts_used,
                    stop_reason: StopReason::Stalled,
                });
            }
        }
    }
}

/// 在等待窗口内轮询数量，观测到超过previous的值即返回
async fn wait_for_growth<O>(
    oracle: &mut O,
    previous: usize,
    config: &CollectConfig,
) -> anyhow::Result<Option<usize>>
where
    O: GrowthOracle + ?Sized,
{
    let deadline = Instant::now() + config.max_wait;
    loop {
        let current = oracle.current_count().await?;
        if current > previous {
            return Ok(Some(current));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        tokio::time::sleep(config.poll_interval).await;
    }
}
