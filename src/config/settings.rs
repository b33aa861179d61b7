// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::collect::CollectConfig;
use crate::retry::RetryPolicy;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// 应用程序配置设置
///
/// 包含目录站点、浏览器、重试、采集、代理提取与指标等所有配置项
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// 书目站点配置
    pub catalog: CatalogSettings,
    /// 浏览器配置
    pub browser: BrowserSettings,
    /// 重试配置
    pub retry: RetrySettings,
    /// 采集循环配置
    pub collection: CollectionSettings,
    /// 代理提取配置
    pub agent: AgentSettings,
    /// 指标配置
    pub metrics: MetricsSettings,
}

/// 书目站点配置设置
#[derive(Debug, Deserialize)]
pub struct CatalogSettings {
    /// 站点入口URL
    pub base_url: String,
    /// 分页接口的URL匹配片段
    pub api_pattern: String,
    /// 列表项选择器（DOM计数预言机使用）
    pub card_selector: String,
}

/// 浏览器配置设置
#[derive(Debug, Deserialize)]
pub struct BrowserSettings {
    /// 是否无头模式
    pub headless: bool,
    /// 远程调试URL，设置后连接已有Chrome实例而非本地启动
    pub remote_debugging_url: Option<String>,
    /// 协议请求超时时间（秒）
    pub request_timeout_secs: u64,
}

/// 重试配置设置
#[derive(Debug, Deserialize)]
pub struct RetrySettings {
    /// 最大尝试次数
    pub max_attempts: u32,
    /// 初始退避时间（毫秒）
    pub base_delay_ms: u64,
    /// 最大退避时间（毫秒）
    pub max_delay_ms: u64,
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            multiplier: 2.0,
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }
}

/// 采集循环配置设置
#[derive(Debug, Deserialize)]
pub struct CollectionSettings {
    /// 增长轮询间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 单轮最大等待窗口（毫秒）
    pub max_wait_ms: u64,
    /// 触发轮次安全上限
    pub max_rounds: u32,
}

impl CollectionSettings {
    pub fn collect_config(&self) -> CollectConfig {
        CollectConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_wait: Duration::from_millis(self.max_wait_ms),
            max_rounds: self.max_rounds,
        }
    }
}

/// 代理提取配置设置
#[derive(Debug, Deserialize)]
pub struct AgentSettings {
    /// LLM API密钥，未设置时跳过代理提取
    pub api_key: Option<String>,
    /// 使用的模型名称
    pub model: String,
    /// LLM API基础URL
    pub api_base_url: String,
}

/// 指标配置设置
#[derive(Debug, Deserialize)]
pub struct MetricsSettings {
    /// 是否启用Prometheus导出
    pub enabled: bool,
    /// 导出器监听端口
    pub port: u16,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从环境变量加载配置，支持默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Default catalog settings
            .set_default("catalog.base_url", "http://localhost:8000")?
            .set_default("catalog.api_pattern", "/api/books")?
            .set_default("catalog.card_selector", ".book-card")?
            // Default browser settings
            .set_default("browser.headless", true)?
            .set_default("browser.request_timeout_secs", 30)?
            // Default retry settings
            .set_default("retry.max_attempts", 3)?
            .set_default("retry.base_delay_ms", 1000)?
            .set_default("retry.max_delay_ms", 60000)?
            // Default collection settings
            .set_default("collection.poll_interval_ms", 500)?
            .set_default("collection.max_wait_ms", 5000)?
            .set_default("collection.max_rounds", 15)?
            // Default agent settings
            .set_default("agent.model", "gpt-4o-mini")?
            .set_default("agent.api_base_url", "https://api.openai.com/v1")?
            // Default metrics settings
            .set_default("metrics.enabled", true)?
            .set_default("metrics.port", 9000)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("BOOKCRAWL").separator("__"));

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// 校验URL类配置项，在启动时而非首次导航时暴露配置错误
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.catalog.base_url).map_err(|e| {
            ConfigError::Message(format!(
                "invalid catalog.base_url '{}': {}",
                self.catalog.base_url, e
            ))
        })?;
        Url::parse(&self.agent.api_base_url).map_err(|e| {
            ConfigError::Message(format!(
                "invalid agent.api_base_url '{}': {}",
                self.agent.api_base_url, e
            ))
        })?;
        if let Some(debug_url) = &self.browser.remote_debugging_url {
            Url::parse(debug_url).map_err(|e| {
                ConfigError::Message(format!(
                    "invalid browser.remote_debugging_url '{}': {}",
                    debug_url, e
                ))
            })?;
        }
        Ok(())
    }
}
