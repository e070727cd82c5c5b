//! 流量样本建模
//! 统一承载被动匹配输入与主动探测响应的头/体/状态码/路径

use http::HeaderMap;
use std::fmt;

/// 单个 HTTP 头（保持报文中的出现顺序）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpHeader {
    pub name: String,
    pub value: String,
}

impl HttpHeader {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for HttpHeader {
    /// 渲染为报文中的单行文本（用于不限定字段名的整体查找）
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}

/// 流量样本：匹配引擎的统一输入
/// status_code 为 0 表示“无状态码可用”（请求型样本）
#[derive(Debug, Clone, Default)]
pub struct TrafficSample {
    /// 有序头列表
    pub headers: Vec<HttpHeader>,
    /// 原始响应体字节
    pub body: Vec<u8>,
    /// 响应体文本视图（有损 UTF-8 转换）
    pub body_text: String,
    /// HTTP 状态码，0 为“不适用”哨兵值
    pub status_code: u16,
    /// 请求/响应路径，可携带查询串（匹配前剥离）
    pub path: String,
}

impl TrafficSample {
    /// 构造响应样本
    pub fn response(
        path: impl Into<String>,
        status_code: u16,
        headers: Vec<HttpHeader>,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        let body = body.into();
        let body_text = String::from_utf8_lossy(&body).into_owned();
        Self {
            headers,
            body,
            body_text,
            status_code,
            path: path.into(),
        }
    }

    /// 构造请求样本（无状态码，以 0 占位）
    pub fn request(
        path: impl Into<String>,
        headers: Vec<HttpHeader>,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        Self::response(path, 0, headers, body)
    }

    /// 从 http crate 的 HeaderMap 构造响应样本（便于嵌入方对接标准类型）
    pub fn from_http_parts(
        path: impl Into<String>,
        status_code: u16,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Self {
        let headers = headers
            .iter()
            .map(|(name, value)| {
                HttpHeader::new(name.as_str(), String::from_utf8_lossy(value.as_bytes()))
            })
            .collect();
        Self::response(path, status_code, headers, body.to_vec())
    }

    /// 是否为请求型样本
    pub fn is_request(&self) -> bool {
        self.status_code == 0
    }
}
