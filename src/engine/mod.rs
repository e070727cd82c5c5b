//! 匹配引擎模块：流量样本建模与单规则匹配
pub mod matcher;
pub mod sample;

pub use matcher::RuleMatcher;
pub use sample::{HttpHeader, TrafficSample};
