//! 规则模块：规则数据模型、JSON 加载与索引
pub mod index;
pub mod loader;
pub mod model;

// 统一导出核心公共接口
pub use index::FingerprintIndex;
pub use loader::RuleLoader;
pub use model::{Fingerprint, MatchResult, Rule, RuleLocation, DEFAULT_FAVICON_PATH};
