//! 全局错误类型定义
use serde_json::Error as SerdeJsonError;
use std::io::Error as IoError;
use thiserror::Error;
use url::ParseError as UrlParseError;

#[derive(Error, Debug)]
pub enum RsfingerError {
    // 规则相关错误
    #[error("规则加载失败：{0}")]
    RuleLoadError(String),
    #[error("JSON解析失败：{0}")]
    JsonError(#[from] SerdeJsonError),

    // 探测相关错误
    #[error("探测请求失败：{0}")]
    ProbeError(String),
    #[error("调度器已关闭，拒绝新任务")]
    ExecutorClosed,

    // 基础错误
    #[error("IO操作失败：{0}")]
    IoError(#[from] IoError),
    #[error("URL解析失败：{0}")]
    UrlError(#[from] UrlParseError),
    #[error("无效输入：{0}")]
    InvalidInput(String),

    #[cfg(feature = "http-client")]
    #[error("HTTP客户端错误：{0}")]
    HttpClientError(#[from] reqwest::Error),
}

// 全局Result类型
pub type RsfResult<T> = Result<T, RsfingerError>;
