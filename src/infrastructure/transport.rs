//! 传输层 - 基础设施层
//!
//! 只暴露"发送一个 HTTP 请求"的能力，不认识 Base / Drive

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::error::TransportError;

/// 请求体
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// UTF-8 JSON
    Json(Bytes),
    /// 原始字节（文件内容）
    Binary(Bytes),
}

impl RequestBody {
    pub fn content_type(&self) -> &'static str {
        match self {
            RequestBody::Json(_) => "application/json",
            RequestBody::Binary(_) => "application/octet-stream",
        }
    }

    pub fn as_bytes(&self) -> &Bytes {
        match self {
            RequestBody::Json(bytes) | RequestBody::Binary(bytes) => bytes,
        }
    }
}

/// 单个 HTTP 请求
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// 序列化为 JSON 请求体
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        self.body = Some(RequestBody::Json(Bytes::from(body)));
        Ok(self)
    }

    pub fn binary(mut self, content: Bytes) -> Self {
        self.body = Some(RequestBody::Binary(content));
        self
    }

    /// 查询参数的值
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// 请求头的值（大小写不敏感）
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// 用于日志和错误信息的端点描述
    pub fn endpoint(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}

/// 原始响应：状态码 + 完整响应体
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Bytes,
}

/// 响应体字节流
pub type ByteStream = BoxStream<'static, Result<Bytes, TransportError>>;

/// 流式原始响应
///
/// 持有一个打开的网络连接，drop 时释放。
pub struct RawStreamingResponse {
    pub status: u16,
    pub body: ByteStream,
}

/// HTTP 传输能力
///
/// 职责：
/// - 发送一个请求，返回状态码和响应体
/// - 网络/协议失败返回 `TransportError`
/// - 不重试、不解析业务数据
#[async_trait]
pub trait Transport: Send + Sync {
    /// 发送请求并读取完整响应体
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError>;

    /// 发送请求并以字节流返回响应体
    ///
    /// 默认实现先读完整响应体，再包装成单块的流。
    async fn send_streaming(
        &self,
        request: HttpRequest,
    ) -> Result<RawStreamingResponse, TransportError> {
        let response = self.send(request).await?;
        let body = response.body;
        Ok(RawStreamingResponse {
            status: response.status,
            body: stream::once(async move { Ok(body) }).boxed(),
        })
    }
}

/// 基于 reqwest 的传输实现
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// 创建新的 HTTP 传输
    pub fn new(config: &Config) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if config.request_timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.request_timeout_secs));
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// 使用外部构造的 reqwest 客户端
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn build(&self, request: HttpRequest) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(request.method, &request.url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(body) = request.body {
            builder = builder.header(CONTENT_TYPE, body.content_type());
            let bytes = match body {
                RequestBody::Json(bytes) | RequestBody::Binary(bytes) => bytes,
            };
            builder = builder.body(bytes);
        }

        builder
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        debug!("发送请求: {}", request.endpoint());

        let response = self.build(request).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        debug!("收到响应: status={}, {} 字节", status, body.len());

        Ok(RawResponse { status, body })
    }

    async fn send_streaming(
        &self,
        request: HttpRequest,
    ) -> Result<RawStreamingResponse, TransportError> {
        debug!("发送流式请求: {}", request.endpoint());

        let response = self.build(request).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes_stream().map_err(TransportError::from).boxed();

        Ok(RawStreamingResponse { status, body })
    }
}
