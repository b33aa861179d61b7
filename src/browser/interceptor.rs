// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::browser::BrowserError;
use crate::collect::accumulator::PageAccumulator;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventResponseReceived, GetResponseBodyParams,
};
use chromiumoxide::Page;
use futures::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// 在页面上挂接书目API响应拦截
///
/// 订阅网络响应事件，对URL匹配url_pattern的响应取回响应体并送入
/// 累加器。非200响应视为数据源异常，标记耗尽以停止后续触发；
/// 响应体取回失败只记录，不影响既有累计。
/// 返回的任务句柄随页面关闭自然结束，也可由调用方提前中止
pub async fn attach_books_interceptor(
    page: &Page,
    url_pattern: &str,
    accumulator: Arc<PageAccumulator>,
) -> Result<JoinHandle<()>, BrowserError> {
    page.execute(EnableParams::default()).await?;
    let mut events = page.event_listener::<EventResponseReceived>().await?;

    let page = page.clone();
    let pattern = url_pattern.to_string();
    let handle = tokio::spawn(async move {
        while let Some(event) = events.next().await {
            if !event.response.url.contains(&pattern) {
                continue;
            }
            debug!(
                url = %event.response.url,
                status = event.response.status,
                mime = %event.response.mime_type,
                "matching response intercepted"
            );

            if event.response.status != 200 {
                warn!(
                    status = event.response.status,
                    "non-200 response from paginated endpoint, stopping collection"
                );
                accumulator.mark_exhausted();
                continue;
            }

            match page
                .execute(GetResponseBodyParams::new(event.request_id.clone()))
                .await
            {
                Ok(response) => {
                    let body = if response.base64_encoded {
                        match BASE64.decode(response.body.as_bytes()) {
                            Ok(raw) => String::from_utf8_lossy(&raw).into_owned(),
                            Err(e) => {
                                warn!(error = %e, "response body base64 decode failed");
                                continue;
                            }
                        }
                    } else {
                        response.body.clone()
                    };
                    let added = accumulator.ingest(&body);
                    debug!(added, accumulated = accumulator.len(), "response ingested");
                }
                Err(e) => {
                    warn!(error = %e, "failed to fetch intercepted response body");
                }
            }
        }
        debug!("response interception stream ended");
    });

    Ok(handle)
}
