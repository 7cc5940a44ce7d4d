//! 服务上下文
//!
//! Base 和 Drive 共享的只读资源：传输、凭据、配置、分发器

use reqwest::{Method, Url};
use std::sync::Arc;
use tracing::warn;

use crate::config::{Config, ProjectKey};
use crate::error::{ConfigError, DetaError, Result};
use crate::infrastructure::{HttpRequest, Transport};
use crate::models::{Response, StreamingResponse};
use crate::orchestrator::Dispatcher;

/// API 密钥请求头
pub const API_KEY_HEADER: &str = "X-API-Key";

/// 服务上下文
///
/// 构造后不可变，通过 `Arc` 在所有并发任务间共享，无需加锁。
pub struct ServiceContext {
    transport: Arc<dyn Transport>,
    project_key: ProjectKey,
    config: Config,
    dispatcher: Dispatcher,
}

impl ServiceContext {
    pub fn new(config: Config, project_key: ProjectKey, transport: Arc<dyn Transport>) -> Self {
        let dispatcher = Dispatcher::new(config.max_concurrency);
        Self {
            transport,
            project_key,
            config,
            dispatcher,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn project_id(&self) -> &str {
        self.project_key.project_id()
    }

    /// Base 集合的地址前缀
    pub fn base_url(&self, base_name: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_host.trim_end_matches('/'),
            self.project_id(),
            base_name
        )
    }

    /// Drive 的地址前缀
    pub fn drive_url(&self, drive_name: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.drive_host.trim_end_matches('/'),
            self.project_id(),
            drive_name
        )
    }

    /// 创建带 API 密钥的请求
    pub fn request(&self, method: Method, url: impl Into<String>) -> HttpRequest {
        HttpRequest::new(method, url).header(API_KEY_HEADER, self.project_key.key())
    }

    /// 发送请求并解码 JSON 响应
    ///
    /// 传输失败返回 `DetaError::Transport`；非 2xx 状态码原样返回给调用方。
    pub async fn send(&self, request: HttpRequest) -> Result<Response> {
        let endpoint = request.endpoint();
        let raw = self.transport.send(request).await.map_err(|e| {
            warn!("⚠️ 请求失败 ({}): {}", endpoint, e);
            DetaError::transport(endpoint.as_str(), e)
        })?;

        Response::decode(raw, &endpoint)
    }

    /// 发送请求并返回流式响应
    pub async fn send_streaming(&self, request: HttpRequest) -> Result<StreamingResponse> {
        let endpoint = request.endpoint();
        let raw = self
            .transport
            .send_streaming(request)
            .await
            .map_err(|e| {
                warn!("⚠️ 请求失败 ({}): {}", endpoint, e);
                DetaError::transport(endpoint.as_str(), e)
            })?;

        Ok(StreamingResponse::from_raw(raw))
    }
}

/// 在地址后追加路径段，每段单独做百分号编码
///
/// 段内的 `/`、`?`、`#`、`%` 等字符不会改变请求的资源路径。
pub fn join_segments<S: AsRef<str>>(url: &str, segments: &[S]) -> Result<String> {
    let invalid = |message: String| {
        DetaError::Config(ConfigError::InvalidValue {
            field: "url".to_string(),
            value: url.to_string(),
            message,
        })
    };

    let mut parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;
    parsed
        .path_segments_mut()
        .map_err(|_| invalid("地址不能拼接路径".to_string()))?
        .pop_if_empty()
        .extend(segments);

    Ok(parsed.to_string())
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("project_key", &self.project_key)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}
