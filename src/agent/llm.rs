// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::AgentSettings;
use crate::domain::models::BookRecord;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, warn};

/// 期望LLM输出的记录形状，随提示词一并发送
const BOOK_RECORD_SCHEMA: &str = r#"[
  {
    "key": "string, unique identifier of the book (data-key or similar)",
    "title": "string",
    "authors": ["string, one entry per author name"],
    "isbn": "string, first ISBN found or empty string",
    "description": "string or null",
    "publish_date": "string or null",
    "number_of_pages": "integer or null"
  }
]"#;

/// 代理提取错误类型
#[derive(Error, Debug)]
pub enum AgentError {
    /// API密钥未配置
    #[error("LLM API key not configured")]
    MissingApiKey,
    /// 请求失败
    #[error("LLM request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// 提供商返回非成功状态
    #[error("LLM provider returned status {status}: {body}")]
    Api { status: u16, body: String },
    /// 响应信封不含可用内容
    #[error("LLM response carried no content")]
    EmptyResponse,
}

/// 书籍提取器特质
///
/// 将原始页面标记交给不可信的提取后端，换回尽力而为的记录列表
#[async_trait]
pub trait BookExtractor: Send + Sync {
    async fn extract_books(&self, page_html: &str) -> Result<Vec<BookRecord>, AgentError>;
}

/// LLM提取服务
///
/// 通过OpenAI风格的chat completions接口做数据提取。
/// LLM被当作可能产出畸形JSON的不可信生产者：解析失败降级为
/// 空列表并记录，绝不使整次运行失败
pub struct LlmExtractor {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    api_base_url: String,
    max_input_chars: usize,
}

impl LlmExtractor {
    pub fn from_settings(settings: &AgentSettings) -> Self {
        Self::new_with_config(
            settings.api_key.clone(),
            settings.model.clone(),
            settings.api_base_url.clone(),
        )
    }

    pub fn new_with_config(
        api_key: Option<String>,
        model: String,
        api_base_url: String,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            api_base_url,
            max_input_chars: 60_000,
        }
    }

    fn build_prompt(&self, page_html: &str) -> String {
        // Truncate on a char boundary to stay inside provider token limits.
        let truncated: String = page_html.chars().take(self.max_input_chars).collect();
        format!(
            "You are an agent specialized in web scraping and structured data extraction.\n\
            \n\
            ## Task\n\
            Analyze the page HTML below and extract every book you can find.\n\
            \n\
            ## Output schema\n\
            Return the data as a JSON array following exactly this shape:\n\
            {}\n\
            \n\
            ## Rules\n\
            1. Return ONLY a valid JSON array, no markdown, no explanations.\n\
            2. Extract all books present on the page.\n\
            3. Use an empty string \"\" or empty list [] for fields you cannot find.\n\
            \n\
            ## Page HTML\n\
            {}\n\
            \n\
            ## Answer\n\
            Return only the JSON array with the extracted books:",
            BOOK_RECORD_SCHEMA, truncated
        )
    }

    async fn call_provider(&self, prompt: String) -> Result<String, AgentError> {
        let api_key = self.api_key.as_ref().ok_or(AgentError::MissingApiKey)?;

        let request_body = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You are a helpful data extraction assistant. You output only valid JSON."
                },
                {
                    "role": "user",
                    "content": prompt
                }
            ],
            "temperature": 0.0
        });

        let started = Instant::now();
        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base_url))
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await?;
        metrics::histogram!("llm_latency_seconds").record(started.elapsed().as_secs_f64());

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            metrics::counter!("llm_requests_total", "status" => "error").increment(1);
            return Err(AgentError::Api {
                status: status.as_u16(),
                body,
            });
        }
        metrics::counter!("llm_requests_total", "status" => "ok").increment(1);

        let envelope: Value = serde_json::from_str(&body).map_err(|e| {
            warn!(error = %e, "provider envelope was not valid JSON");
            AgentError::EmptyResponse
        })?;
        envelope["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or(AgentError::EmptyResponse)
    }

    /// 宽容地解析LLM返回的文本为记录列表
    ///
    /// 剥离可能的markdown代码围栏；解析失败降级为空列表
    fn parse_books(&self, response: &str) -> Vec<BookRecord> {
        let cleaned = response
            .replace("```json", "")
            .replace("```", "")
            .trim()
            .to_string();

        match serde_json::from_str::<Vec<BookRecord>>(&cleaned) {
            Ok(books) => books,
            Err(error) => {
                warn!(error = %error, response = %cleaned, "failed to parse extraction response, degrading to empty result");
                metrics::counter!("scraping_errors_total", "error_type" => "llm_parse_failure")
                    .increment(1);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl BookExtractor for LlmExtractor {
    async fn extract_books(&self, page_html: &str) -> Result<Vec<BookRecord>, AgentError> {
        let prompt = self.build_prompt(page_html);
        let content = self.call_provider(prompt).await?;
        let books = self.parse_books(&content);
        debug!(count = books.len(), "books extracted by agent");
        Ok(books)
    }
}
