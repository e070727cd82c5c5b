//! 探测传输层
//! 核心自身从不建立连接，所有主动请求都经由注入的 HttpTransport 能力发出

use async_trait::async_trait;
use std::borrow::Cow;
use std::fmt;
use url::Url;

use crate::engine::HttpHeader;
use crate::error::{RsfResult, RsfingerError};

/// 探测请求使用的 User-Agent
pub const PROBE_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36";

/// 目标服务标识（scheme + host + port）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HttpService {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl HttpService {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            port,
        }
    }

    /// 从 URL 解析目标服务标识
    pub fn from_url(raw: &str) -> RsfResult<Self> {
        let url = Url::parse(raw)?;
        let host = url
            .host_str()
            .ok_or_else(|| RsfingerError::InvalidInput(format!("URL 缺少主机名: {}", raw)))?;
        let port = url.port_or_known_default().unwrap_or(80);
        Ok(Self::new(url.scheme(), host, port))
    }
}

impl fmt::Display for HttpService {
    /// 渲染为 scheme://host:port（作为去重键与结果 URL 的前缀）
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}

/// 探测响应
/// 约定为完整响应，不存在流式/部分响应形态
#[derive(Debug, Clone, Default)]
pub struct ProbeResponse {
    pub status_code: u16,
    pub headers: Vec<HttpHeader>,
    pub body: Vec<u8>,
}

impl ProbeResponse {
    /// 响应体的文本视图（有损 UTF-8 转换）
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// HTTP 发送能力（由流量源注入）
/// 对给定目标与完整请求路径发起一次 GET，返回完整响应或错误
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, service: &HttpService, path: &str) -> RsfResult<ProbeResponse>;
}

#[cfg(feature = "http-client")]
pub mod client {
    //! 内置的 reqwest 传输实现（http-client 特性）
    use super::*;
    use std::time::Duration;

    /// 基于 reqwest 的默认传输
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        pub fn new(timeout_secs: u64) -> RsfResult<Self> {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .user_agent(PROBE_USER_AGENT)
                .danger_accept_invalid_certs(true)
                .redirect(reqwest::redirect::Policy::none())
                .build()?;
            Ok(Self { client })
        }
    }

    #[async_trait]
    impl HttpTransport for ReqwestTransport {
        async fn send(&self, service: &HttpService, path: &str) -> RsfResult<ProbeResponse> {
            let url = format!("{}{}", service, path);
            let response = self.client.get(&url).send().await?;
            let status_code = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .map(|(name, value)| {
                    HttpHeader::new(name.as_str(), String::from_utf8_lossy(value.as_bytes()))
                })
                .collect();
            let body = response.bytes().await?.to_vec();
            Ok(ProbeResponse {
                status_code,
                headers,
                body,
            })
        }
    }
}
