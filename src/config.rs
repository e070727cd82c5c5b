//! 扫描器配置管理，存储所有可配置项

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// 扫描器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// 排除的响应状态码（命中则丢弃响应，不参与匹配）
    pub exclude_status_codes: FxHashSet<u16>,
    /// 排除的响应体关键字（子串命中则丢弃响应）
    pub exclude_body_keywords: Vec<String>,
    /// 并发工作任务数上限
    pub thread_count: usize,
    /// 每秒请求数上限（令牌桶速率）
    pub requests_per_second: f64,
    /// 主动探测的最大目录深度
    pub max_scan_depth: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            exclude_status_codes: [404, 403, 500, 502, 503, 504].into_iter().collect(),
            exclude_body_keywords: vec![
                "404 Not Found".to_string(),
                "Page Not Found".to_string(),
            ],
            thread_count: 10,
            requests_per_second: 10.0,
            max_scan_depth: 1,
        }
    }
}

impl ScannerConfig {
    /// 自定义配置
    pub fn builder() -> ScannerConfigBuilder {
        ScannerConfigBuilder::new()
    }
}

/// 配置构建器（便于自定义配置）
#[derive(Debug, Clone)]
pub struct ScannerConfigBuilder {
    config: ScannerConfig,
}

impl Default for ScannerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScannerConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ScannerConfig::default(),
        }
    }

    pub fn exclude_status_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.config.exclude_status_codes = codes.into_iter().collect();
        self
    }

    pub fn exclude_body_keywords(
        mut self,
        keywords: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.config.exclude_body_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn thread_count(mut self, threads: usize) -> Self {
        self.config.thread_count = threads.max(1);
        self
    }

    pub fn requests_per_second(mut self, rate: f64) -> Self {
        self.config.requests_per_second = rate;
        self
    }

    pub fn max_scan_depth(mut self, depth: usize) -> Self {
        self.config.max_scan_depth = depth;
        self
    }

    pub fn build(self) -> ScannerConfig {
        self.config
    }
}
