//! 条目模型
//!
//! 条目是无模式的属性映射，保持插入顺序

use serde_json::{Map, Value};

/// 一条存储条目：字符串属性名 → 任意 JSON 值
pub type Record = Map<String, Value>;

/// 条目主键所在的字段名
pub const KEY_FIELD: &str = "key";

/// 读取条目的主键（如果有）
pub fn record_key(record: &Record) -> Option<&str> {
    record.get(KEY_FIELD).and_then(Value::as_str)
}

/// 从 `json!({...})` 之类的值构造条目，非对象返回 `None`
pub fn into_record(value: Value) -> Option<Record> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}
