//! rsfinger - 规则驱动的 HTTP 指纹识别与主动探测引擎
//!
//! 被动侧：对拦截到的请求/响应样本逐条评估指纹规则（header/body/hash/status 四个维度）。
//! 主动侧：以触发路径为起点规划祖先目录，经去重与令牌桶限速后并发下发探测请求，
//! 对探测响应复核规则并发布匹配事件。网络收发与结果展示均由嵌入方注入。

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod rule;
pub mod scanner;
pub mod transport;
pub mod utils;

// 导出全局错误类型
pub use self::error::{RsfResult, RsfingerError};

// 导出规则模块核心数据结构与加载器
pub use crate::rule::{
    Fingerprint, FingerprintIndex, MatchResult, Rule, RuleLoader, RuleLocation,
    DEFAULT_FAVICON_PATH,
};

// 导出匹配引擎核心接口
pub use crate::engine::{HttpHeader, RuleMatcher, TrafficSample};

// 导出扫描器核心接口
pub use crate::scanner::{
    ActiveScanner, InlineExecutor, PassiveScanner, PathPlanner, PlannedPath, PooledExecutor,
    ProbeExecutor, RateLimiter, ScannedSet,
};

// 导出配置与事件模型
pub use crate::config::{ScannerConfig, ScannerConfigBuilder};
pub use crate::event::{DetectionMethod, MemorySink, ResultSink, ScanRecord};

// 导出探测传输层接口
pub use crate::transport::{HttpService, HttpTransport, ProbeResponse, PROBE_USER_AGENT};

#[cfg(feature = "http-client")]
pub use crate::transport::client::ReqwestTransport;
