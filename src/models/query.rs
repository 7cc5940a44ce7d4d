//! 查询条件
//!
//! 过滤条件原样透传给远端，本模块不解释运算符

use serde_json::{json, Value};

use crate::models::record::Record;

/// 查询条件
///
/// 多个过滤映射之间是"或"关系，单个映射内部的字段是"与"关系。
/// 空查询匹配全部条目。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filters: Vec<Record>,
}

impl Query {
    /// 匹配全部条目的空查询
    pub fn new() -> Self {
        Self::default()
    }

    /// 以单个过滤映射创建查询
    pub fn with_filter(filter: Record) -> Self {
        Self {
            filters: vec![filter],
        }
    }

    /// 追加一个"或"分支
    pub fn or(mut self, filter: Record) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filters(&self) -> &[Record] {
        &self.filters
    }

    /// 构建 `/query` 请求体
    ///
    /// `limit` 为 0 时使用服务端默认值，`last` 为空时从头开始。
    pub fn to_body(&self, last: Option<&str>, limit: usize) -> Value {
        let mut body = json!({ "query": self.filters });

        if limit != 0 {
            body["limit"] = json!(limit);
        }
        if let Some(last) = last.filter(|last| !last.is_empty()) {
            body["last"] = json!(last);
        }

        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::into_record;

    #[test]
    fn test_empty_query_body() {
        let body = Query::new().to_body(None, 0);
        assert_eq!(body, json!({ "query": [] }));
    }

    #[test]
    fn test_query_body_with_cursor_and_limit() {
        let query = Query::with_filter(into_record(json!({ "name": "a" })).unwrap())
            .or(into_record(json!({ "name": "b" })).unwrap());

        let body = query.to_body(Some("cursor-1"), 50);
        assert_eq!(
            body,
            json!({
                "query": [{ "name": "a" }, { "name": "b" }],
                "limit": 50,
                "last": "cursor-1"
            })
        );

        // 空游标等同于没有游标
        assert!(query.to_body(Some(""), 0).get("last").is_none());
    }
}
