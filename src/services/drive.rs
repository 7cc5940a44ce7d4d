//! Drive 服务 - 业务能力层
//!
//! 文件的上传、下载、删除和列举。大文件走分片上传。

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::error::Result;
use crate::models::{Response, StreamingResponse};
use crate::orchestrator::multipart::{self, MultipartTarget, Part, UploadSession};
use crate::orchestrator::{fetch_all, Page};
use crate::services::context::{join_segments, ServiceContext};

/// 单次列举的最大条数，也是默认条数
pub const MAX_LIST_LIMIT: usize = 1000;

/// Drive 文件存储
#[derive(Clone, Debug)]
pub struct Drive {
    name: String,
    ctx: Arc<ServiceContext>,
}

impl Drive {
    pub(crate) fn new(name: impl Into<String>, ctx: Arc<ServiceContext>) -> Self {
        Self {
            name: name.into(),
            ctx,
        }
    }

    /// Drive 名
    pub fn name(&self) -> &str {
        &self.name
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.ctx.drive_url(&self.name), path)
    }

    /// 上传文件，同名文件会被覆盖
    ///
    /// 不超过 `upload_part_size`（默认 10 MiB）时单次上传，
    /// 否则走分片上传；任一分片失败时不会完成上传会话。
    pub async fn put(&self, name: &str, content: impl Into<Bytes>) -> Result<Response> {
        multipart::upload(
            self,
            self.ctx.dispatcher(),
            name,
            content.into(),
            self.ctx.config().upload_part_size,
        )
        .await
    }

    /// 下载文件
    ///
    /// 返回的流持有打开的连接，读完或 drop 后释放。
    pub async fn get(&self, name: &str) -> Result<StreamingResponse> {
        let request = self
            .ctx
            .request(Method::GET, self.url("files/download"))
            .query("name", name);
        self.ctx.send_streaming(request).await
    }

    /// 删除文件
    pub async fn delete(&self, names: &[String]) -> Result<Response> {
        let request = self
            .ctx
            .request(Method::DELETE, self.url("files"))
            .json(&json!({ "names": names }))?;
        self.ctx.send(request).await
    }

    /// 列举文件（单页）
    ///
    /// # 参数
    /// - `prefix`: 文件名前缀，`None` 表示全部
    /// - `limit`: 条数，0 或超过 1000 时按 1000 处理
    /// - `last`: 上一页最后一个文件名
    pub async fn files(
        &self,
        prefix: Option<&str>,
        limit: usize,
        last: Option<&str>,
    ) -> Result<Response> {
        let mut request = self
            .ctx
            .request(Method::GET, self.url("files"))
            .query("limit", normalize_limit(limit));

        if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
            request = request.query("prefix", prefix);
        }
        if let Some(last) = last.filter(|l| !l.is_empty()) {
            request = request.query("last", last);
        }

        self.ctx.send(request).await
    }

    /// 列举全部文件名，沿游标串行翻页
    pub async fn list_all(&self, prefix: Option<&str>) -> Result<Vec<String>> {
        let endpoint = format!("GET {}", self.url("files"));
        let endpoint = endpoint.as_str();

        fetch_all(endpoint, move |cursor| async move {
            let response = self
                .files(prefix, MAX_LIST_LIMIT, cursor.as_deref())
                .await?
                .error_for_status(endpoint)?;
            Ok(Page::from_names_response(&response))
        })
        .await
    }

    /// 中止未完成的分片上传会话
    pub async fn abort_upload(&self, name: &str, upload_id: &str) -> Result<Response> {
        let request = self
            .ctx
            .request(Method::DELETE, join_segments(&self.url("uploads"), &[upload_id])?)
            .query("name", name);
        self.ctx.send(request).await
    }
}

#[async_trait]
impl MultipartTarget for Drive {
    async fn upload_whole(&self, name: &str, content: Bytes) -> Result<Response> {
        let request = self
            .ctx
            .request(Method::POST, self.url("files"))
            .query("name", name)
            .binary(content);
        self.ctx.send(request).await
    }

    async fn initiate(&self, name: &str) -> Result<UploadSession> {
        let request = self
            .ctx
            .request(Method::POST, self.url("uploads"))
            .query("name", name);
        let endpoint = request.endpoint();

        let response = self.ctx.send(request).await?.error_for_status(&endpoint)?;
        let session: UploadSession = serde_json::from_value(Value::Object(response.data))?;

        info!("[{}] 发起分片上传: upload_id={}", self.name, session.upload_id);
        Ok(session)
    }

    async fn upload_part(&self, session: &UploadSession, part: Part) -> Result<Response> {
        let request = self
            .ctx
            .request(
                Method::POST,
                join_segments(&self.url("uploads"), &[session.upload_id.as_str(), "parts"])?,
            )
            .query("name", &session.name)
            .query("part", part.number)
            .binary(part.data);
        self.ctx.send(request).await
    }

    async fn complete(&self, session: &UploadSession) -> Result<Response> {
        let request = self
            .ctx
            .request(
                Method::PATCH,
                join_segments(&self.url("uploads"), &[session.upload_id.as_str()])?,
            )
            .query("name", &session.name);
        self.ctx.send(request).await
    }
}

/// 列举条数：0 或超过上限时取上限
fn normalize_limit(limit: usize) -> usize {
    if limit == 0 || limit > MAX_LIST_LIMIT {
        MAX_LIST_LIMIT
    } else {
        limit
    }
}
