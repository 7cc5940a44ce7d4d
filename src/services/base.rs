//! Base 服务 - 业务能力层
//!
//! 键值/文档集合的读写。批量写入按块并发，多键读取/删除按键并发，
//! 全量查询沿游标链串行拉取。

use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::{Query, Record, Response};
use crate::orchestrator::{chunk, fetch_all, BatchResult, ChunkInfo, Page};
use crate::services::context::{join_segments, ServiceContext};

/// Base 集合
#[derive(Clone, Debug)]
pub struct Base {
    name: String,
    ctx: Arc<ServiceContext>,
}

impl Base {
    pub(crate) fn new(name: impl Into<String>, ctx: Arc<ServiceContext>) -> Self {
        Self {
            name: name.into(),
            ctx,
        }
    }

    /// 集合名
    pub fn name(&self) -> &str {
        &self.name
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.ctx.base_url(&self.name), path)
    }

    fn item_url(&self, key: &str) -> Result<String> {
        join_segments(&self.url("items"), &[key])
    }

    /// 批量写入（存在则覆盖）
    ///
    /// 条目按 `put_chunk_size`（默认 25）切块，每块一个 PUT 请求并发发送。
    ///
    /// # 返回
    /// 每块一个结果，按提交顺序排列；空输入不发送任何请求
    pub async fn put(&self, items: Vec<Record>) -> BatchResult<ChunkInfo, Response> {
        let chunks = chunk(&items, self.ctx.config().put_chunk_size);
        if chunks.is_empty() {
            return BatchResult::empty();
        }

        let infos: Vec<ChunkInfo> = chunks
            .iter()
            .enumerate()
            .map(|(index, chunk)| ChunkInfo {
                index,
                len: chunk.len(),
            })
            .collect();

        info!(
            "📦 [{}] 批量写入 {} 条, 分 {} 块",
            self.name,
            items.len(),
            chunks.len()
        );

        let base = self.clone();
        let outcomes = self
            .ctx
            .dispatcher()
            .dispatch(chunks, move |chunk| {
                let base = base.clone();
                async move { base.put_chunk(chunk).await }
            })
            .await;

        let batch = BatchResult::zip(infos, outcomes);
        for failure in batch.failures() {
            if let Some(e) = failure.error() {
                warn!("[{}] {} 写入失败: {}", self.name, failure.unit, e);
            }
        }

        batch
    }

    async fn put_chunk(&self, items: Vec<Record>) -> Result<Response> {
        let request = self
            .ctx
            .request(Method::PUT, self.url("items"))
            .json(&json!({ "items": items }))?;
        self.ctx.send(request).await
    }

    /// 读取单个条目
    ///
    /// 条目不存在时返回 404 响应，不是错误。
    pub async fn get(&self, key: &str) -> Result<Response> {
        let request = self.ctx.request(Method::GET, self.item_url(key)?);
        self.ctx.send(request).await
    }

    /// 并发读取多个条目
    ///
    /// # 返回
    /// 每个键一个结果，顺序与 `keys` 一致。传输失败记为该键的 `Err`，
    /// 不影响其他键；"未找到"是 `Ok` 的 404 响应。
    pub async fn get_many(&self, keys: &[String]) -> BatchResult<String, Response> {
        let base = self.clone();
        let outcomes = self
            .ctx
            .dispatcher()
            .dispatch(keys.to_vec(), move |key| {
                let base = base.clone();
                async move { base.get(&key).await }
            })
            .await;

        BatchResult::zip(keys.to_vec(), outcomes)
    }

    /// 读取整个集合
    ///
    /// 大集合可能需要很多页，耗时较长。
    pub async fn get_all(&self) -> Result<Vec<Record>> {
        self.fetch_all(&Query::new()).await
    }

    /// 删除单个条目
    ///
    /// 条目不存在也不报错。
    pub async fn delete(&self, key: &str) -> Result<Response> {
        let request = self.ctx.request(Method::DELETE, self.item_url(key)?);
        self.ctx.send(request).await
    }

    /// 并发删除多个条目，结果顺序与 `keys` 一致
    pub async fn delete_many(&self, keys: &[String]) -> BatchResult<String, Response> {
        let base = self.clone();
        let outcomes = self
            .ctx
            .dispatcher()
            .dispatch(keys.to_vec(), move |key| {
                let base = base.clone();
                async move { base.delete(&key).await }
            })
            .await;

        BatchResult::zip(keys.to_vec(), outcomes)
    }

    /// 插入条目，仅当主键不存在时成功（已存在返回 409）
    pub async fn insert(&self, item: Record) -> Result<Response> {
        let request = self
            .ctx
            .request(Method::POST, self.url("items"))
            .json(&json!({ "item": item }))?;
        self.ctx.send(request).await
    }

    /// 并发插入多个条目，结果按输入下标对应
    pub async fn insert_many(&self, items: Vec<Record>) -> BatchResult<usize, Response> {
        let indexes: Vec<usize> = (0..items.len()).collect();
        let base = self.clone();
        let outcomes = self
            .ctx
            .dispatcher()
            .dispatch(items, move |item| {
                let base = base.clone();
                async move { base.insert(item).await }
            })
            .await;

        BatchResult::zip(indexes, outcomes)
    }

    /// 更新条目，返回更新构造器
    ///
    /// 条目不存在时远端返回 404，通过响应状态码检查。
    pub fn update(&self, key: impl Into<String>) -> Updater {
        Updater {
            base: self.clone(),
            key: key.into(),
            updates: Record::new(),
        }
    }

    /// 单页查询
    ///
    /// # 参数
    /// - `query`: 查询条件
    /// - `last`: 上一页返回的游标，首页传 `None`
    /// - `limit`: 每页条数，0 表示使用服务端默认值
    pub async fn fetch(&self, query: &Query, last: Option<&str>, limit: usize) -> Result<Response> {
        let request = self
            .ctx
            .request(Method::POST, self.url("query"))
            .json(&query.to_body(last, limit))?;
        self.ctx.send(request).await
    }

    /// 拉取匹配查询的全部条目
    ///
    /// 严格串行地沿游标链拉取，任意一页失败则整体失败。
    pub async fn fetch_all(&self, query: &Query) -> Result<Vec<Record>> {
        let endpoint = format!("POST {}", self.url("query"));
        let endpoint = endpoint.as_str();

        fetch_all(endpoint, move |cursor| async move {
            let response = self
                .fetch(query, cursor.as_deref(), 0)
                .await?
                .error_for_status(endpoint)?;
            Ok(Page::from_query_response(&response))
        })
        .await
    }
}

/// 条目更新构造器
///
/// 同一种操作多次调用会合并。
#[derive(Debug, Clone)]
pub struct Updater {
    base: Base,
    key: String,
    updates: Record,
}

impl Updater {
    /// 设置字段
    pub fn set(self, attrs: Record) -> Self {
        self.merge("set", attrs)
    }

    /// 数值字段自增
    pub fn increment(self, attrs: Record) -> Self {
        self.merge("increment", attrs)
    }

    /// 向列表字段末尾追加
    pub fn append(self, attrs: Record) -> Self {
        self.merge("append", attrs)
    }

    /// 向列表字段开头插入
    pub fn prepend(self, attrs: Record) -> Self {
        self.merge("prepend", attrs)
    }

    /// 删除字段
    pub fn delete<I, S>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self
            .updates
            .entry("delete")
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(list) = entry {
            list.extend(attrs.into_iter().map(|attr| Value::String(attr.into())));
        }
        self
    }

    fn merge(mut self, operation: &str, attrs: Record) -> Self {
        let entry = self
            .updates
            .entry(operation)
            .or_insert_with(|| Value::Object(Record::new()));
        if let Value::Object(map) = entry {
            map.extend(attrs);
        }
        self
    }

    /// 请求体
    pub fn body(&self) -> &Record {
        &self.updates
    }

    /// 发送更新请求
    pub async fn send(self) -> Result<Response> {
        let request = self
            .base
            .ctx
            .request(Method::PATCH, self.base.item_url(&self.key)?)
            .json(&self.updates)?;
        self.base.ctx.send(request).await
    }
}
