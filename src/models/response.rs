//! 响应模型

use bytes::Bytes;
use futures::TryStreamExt;
use serde_json::Value;
use tracing::warn;

use crate::error::{DetaError, Result};
use crate::infrastructure::{ByteStream, RawResponse, RawStreamingResponse};
use crate::models::record::{Record, KEY_FIELD};
use crate::utils::logging::truncate_text;

/// JSON 端点的响应：状态码 + 解码后的响应体
///
/// 非 2xx 不是 `Err`，调用方通过 `is_ok()` / `is_not_found()` 检查。
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub data: Record,
}

impl Response {
    pub fn new(status: u16, data: Record) -> Self {
        Self { status, data }
    }

    /// 解码原始响应
    ///
    /// 空响应体解码为空映射。失败响应的响应体无法解析时只记录警告，
    /// 成功响应的响应体无法解析则返回错误。
    pub(crate) fn decode(raw: RawResponse, endpoint: &str) -> Result<Self> {
        let status = raw.status;
        if raw.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::new(status, Record::new()));
        }

        match serde_json::from_slice::<Value>(&raw.body) {
            Ok(Value::Object(data)) => Ok(Self::new(status, data)),
            Ok(_) if !is_success(status) => Ok(Self::new(status, Record::new())),
            Ok(_) => Err(DetaError::remote(endpoint, status, "响应体不是 JSON 对象")),
            Err(e) if !is_success(status) => {
                warn!(
                    "⚠️ 无法解析错误响应体 ({}): {}, 内容: {}",
                    endpoint,
                    e,
                    truncate_text(&String::from_utf8_lossy(&raw.body), 200)
                );
                Ok(Self::new(status, Record::new()))
            }
            Err(e) => Err(DetaError::Json(e)),
        }
    }

    /// 状态码是否表示成功
    pub fn is_ok(&self) -> bool {
        is_success(self.status)
    }

    /// 是否为"未找到"（正常结果，不是错误）
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// 把非 2xx 响应转换为 `DetaError::Remote`
    pub fn error_for_status(self, endpoint: &str) -> Result<Self> {
        if self.is_ok() {
            Ok(self)
        } else {
            Err(DetaError::remote(endpoint, self.status, self.error_message()))
        }
    }

    /// 远端错误描述
    pub fn error_message(&self) -> String {
        if self.is_not_found() {
            let key = self
                .data
                .get(KEY_FIELD)
                .and_then(Value::as_str)
                .unwrap_or_default();
            return format!("<Not Found:<<{}>>{}>", key, self.status);
        }

        if !self.is_ok() {
            let errors: Vec<&str> = self
                .data
                .get("errors")
                .and_then(Value::as_array)
                .map(|errors| errors.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();
            return format!("<{}: {}>", errors.join(","), self.status);
        }

        format!("<Success: {}>", self.status)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }
}

/// 二进制下载的流式响应
///
/// 持有打开的连接，调用方读完或 drop 后释放。
pub struct StreamingResponse {
    pub status: u16,
    body: ByteStream,
}

impl StreamingResponse {
    pub(crate) fn from_raw(raw: RawStreamingResponse) -> Self {
        Self {
            status: raw.status,
            body: raw.body,
        }
    }

    pub fn is_ok(&self) -> bool {
        is_success(self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// 取出响应体字节流
    pub fn into_stream(self) -> ByteStream {
        self.body
    }

    /// 读取完整响应体
    pub async fn bytes(self, endpoint: &str) -> Result<Bytes> {
        let chunks: Vec<Bytes> = self
            .body
            .try_collect()
            .await
            .map_err(|e| DetaError::transport(endpoint, e))?;
        Ok(Bytes::from(chunks.concat()))
    }
}

impl std::fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status,
            body: Bytes::from(body.to_string()),
        }
    }

    #[test]
    fn test_decode_object_body() {
        let response = Response::decode(raw(200, r#"{"key":"a","n":1}"#), "GET /items/a").unwrap();
        assert!(response.is_ok());
        assert_eq!(response.get("n"), Some(&json!(1)));
    }

    #[test]
    fn test_decode_empty_and_garbage_error_body() {
        let response = Response::decode(raw(204, ""), "DELETE /items/a").unwrap();
        assert!(response.data.is_empty());

        let response = Response::decode(raw(502, "<html>bad gateway</html>"), "GET /x").unwrap();
        assert_eq!(response.status, 502);
        assert!(response.data.is_empty());

        assert!(Response::decode(raw(200, "not json"), "GET /x").is_err());
    }

    #[test]
    fn test_not_found_is_not_an_error() {
        let response =
            Response::decode(raw(404, r#"{"key":"missing"}"#), "GET /items/missing").unwrap();
        assert!(response.is_not_found());
        assert_eq!(response.error_message(), "<Not Found:<<missing>>404>");
    }

    #[test]
    fn test_error_for_status() {
        let response = Response::decode(
            raw(400, r#"{"errors":["bad key","too big"]}"#),
            "PUT /items",
        )
        .unwrap();
        assert_eq!(response.error_message(), "<bad key,too big: 400>");

        let err = response.error_for_status("PUT /items").unwrap_err();
        assert!(matches!(err, DetaError::Remote { status: 400, .. }));
    }
}
