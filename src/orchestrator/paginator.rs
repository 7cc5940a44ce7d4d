//! 分页器 - 编排层
//!
//! 沿着游标链逐页拉取，直到某一页不再携带游标。
//! 每次请求的游标依赖上一页的响应，所以整个循环严格串行。

use serde_json::Value;
use std::collections::HashSet;
use std::future::Future;
use tracing::{debug, info};

use crate::error::{DetaError, Result};
use crate::models::{Record, Response};

/// 一页结果
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 下一页的游标，`None` 表示已经是最后一页
    pub cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, cursor: Option<String>) -> Self {
        Self { items, cursor }
    }

    /// 最后一页
    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, None)
    }
}

impl Page<Record> {
    /// 从 Base 查询响应解码：`items` 数组 + `paging.last` 游标
    pub fn from_query_response(response: &Response) -> Self {
        let items = response
            .get("items")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_object().cloned())
                    .collect()
            })
            .unwrap_or_default();

        Self::new(items, paging_cursor(response))
    }
}

impl Page<String> {
    /// 从 Drive 文件列表响应解码：`names` 数组 + `paging.last` 游标
    pub fn from_names_response(response: &Response) -> Self {
        let names = response
            .get("names")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(|name| name.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        Self::new(names, paging_cursor(response))
    }
}

/// 读取 `paging.last`，缺失、null 或空字符串都视为没有下一页
fn paging_cursor(response: &Response) -> Option<String> {
    response
        .get("paging")
        .and_then(|paging| paging.get("last"))
        .and_then(Value::as_str)
        .filter(|last| !last.is_empty())
        .map(str::to_string)
}

/// 拉取全部分页并按游标链顺序拼接
///
/// # 参数
/// - `endpoint`: 用于日志和错误信息
/// - `fetch_page`: 根据游标拉取一页；首次调用传入 `None`
///
/// # 返回
/// 所有页的条目。任意一页失败则整体失败，已拉取的部分被丢弃。
pub async fn fetch_all<T, F, Fut>(endpoint: &str, mut fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut accumulated = Vec::new();
    let mut cursor: Option<String> = None;
    let mut visited: HashSet<String> = HashSet::new();
    let mut pages = 0usize;

    loop {
        let page = fetch_page(cursor.clone()).await?;
        pages += 1;

        debug!(
            "[{}] 第 {} 页: {} 条, 游标: {:?}",
            endpoint,
            pages,
            page.items.len(),
            page.cursor
        );

        accumulated.extend(page.items);

        match page.cursor {
            // 游标出现过说明服务端在兜圈子
            Some(next) if !visited.insert(next.clone()) => {
                return Err(DetaError::remote(
                    endpoint,
                    200,
                    format!("分页游标重复出现: {}", next),
                ));
            }
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    info!("✓ [{}] 分页拉取完成: {} 页, 共 {} 条", endpoint, pages, accumulated.len());

    Ok(accumulated)
}
