//! 集成测试公共工具：可编程的假传输

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use deta_client::{Config, Deta, HttpRequest, RawResponse, Transport, TransportError};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Handler = dyn Fn(&HttpRequest) -> Result<RawResponse, TransportError> + Send + Sync;
type Delay = dyn Fn(&HttpRequest) -> Duration + Send + Sync;

/// 假传输
///
/// 按处理函数返回响应，记录每个完成的请求和峰值并发数。
pub struct FakeTransport {
    handler: Box<Handler>,
    delay: Box<Delay>,
    requests: Mutex<Vec<HttpRequest>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeTransport {
    pub fn new(
        handler: impl Fn(&HttpRequest) -> Result<RawResponse, TransportError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            delay: Box::new(|_| Duration::from_millis(2)),
            requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(
        mut self,
        delay: impl Fn(&HttpRequest) -> Duration + Send + Sync + 'static,
    ) -> Self {
        self.delay = Box::new(delay);
        self
    }

    /// 已完成的请求，按完成顺序
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep((self.delay)(&request)).await;
        let result = (self.handler)(&request);

        self.requests.lock().unwrap().push(request);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

pub fn json_response(status: u16, body: Value) -> Result<RawResponse, TransportError> {
    Ok(RawResponse {
        status,
        body: Bytes::from(body.to_string()),
    })
}

pub fn connection_refused() -> Result<RawResponse, TransportError> {
    Err(TransportError::Connection("connection refused".to_string()))
}

/// 请求体解析为 JSON
pub fn body_json(request: &HttpRequest) -> Value {
    request
        .body
        .as_ref()
        .map(|body| serde_json::from_slice(body.as_bytes()).unwrap())
        .unwrap_or(Value::Null)
}

pub fn body_len(request: &HttpRequest) -> usize {
    request.body.as_ref().map(|b| b.as_bytes().len()).unwrap_or(0)
}

pub fn test_config() -> Config {
    Config::with_project_key("proj_secret")
}

pub fn client(transport: Arc<FakeTransport>) -> Deta {
    client_with(test_config(), transport)
}

pub fn client_with(config: Config, transport: Arc<FakeTransport>) -> Deta {
    deta_client::utils::logging::init();
    Deta::with_transport(config, transport).unwrap()
}
