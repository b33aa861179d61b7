// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::browser::page_ops;
use crate::collect::accumulator::PageAccumulator;
use async_trait::async_trait;
use chromiumoxide::Page;
use std::sync::Arc;

/// 增长预言机特质
///
/// 采集循环的策略接口：循环只关心"触发"与"长了没有"，
/// 不关心增长由DOM渲染还是网络拦截体现。两种生产实现共享同一套
/// 循环与终止语义
#[async_trait]
pub trait GrowthOracle: Send {
    /// 发出一次"加载更多"触发
    async fn trigger(&mut self) -> anyhow::Result<()>;

    /// 当前可观测的数量
    async fn current_count(&mut self) -> anyhow::Result<usize>;

    /// 数据源报告的权威总量。仅网络感知实现可提供，
    /// DOM计数实现没有权威总量可依据
    fn known_total(&self) -> Option<usize> {
        None
    }

    /// 数据源是否已权威地声明没有更多数据
    fn source_exhausted(&self) -> bool {
        false
    }
}

/// DOM计数预言机
///
/// 触发为滚动到页面底部，增长以选择器命中的元素数体现
pub struct DomCountOracle {
    page: Page,
    selector: String,
}

impl DomCountOracle {
    pub fn new(page: Page, selector: impl Into<String>) -> Self {
        Self {
            page,
            selector: selector.into(),
        }
    }
}

#[async_trait]
impl GrowthOracle for DomCountOracle {
    async fn trigger(&mut self) -> anyhow::Result<()> {
        page_ops::scroll_to_bottom(&self.page).await?;
        Ok(())
    }

    async fn current_count(&mut self) -> anyhow::Result<usize> {
        Ok(page_ops::element_count(&self.page, &self.selector).await?)
    }
}

/// 网络累加预言机
///
/// 触发同样是滚动到底部，但增长以拦截响应累加器中的书籍数体现，
/// 并额外携带响应信封报告的total与hasMore权威信号
pub struct NetworkOracle {
    page: Page,
    accumulator: Arc<PageAccumulator>,
}

impl NetworkOracle {
    pub fn new(page: Page, accumulator: Arc<PageAccumulator>) -> Self {
        Self { page, accumulator }
    }
}

#[async_trait]
impl GrowthOracle for NetworkOracle {
    async fn trigger(&mut self) -> anyhow::Result<()> {
        page_ops::scroll_to_bottom(&self.page).await?;
        Ok(())
    }

    async fn current_count(&mut self) -> anyhow::Result<usize> {
        Ok(self.accumulator.len())
    }

    fn known_total(&self) -> Option<usize> {
        self.accumulator.total()
    }

    fn source_exhausted(&self) -> bool {
        self.accumulator.exhausted()
    }
}
