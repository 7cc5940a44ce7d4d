//! 分片上传编排 - 编排层
//!
//! ## 流程
//!
//! 1. 内容不超过分片大小：直接单次上传
//! 2. 否则按字节顺序切成分片（除最后一片外大小都等于分片大小）
//! 3. 发起上传会话，拿到 upload_id
//! 4. 并发上传所有分片，分片号从 1 开始，与字节顺序一致
//! 5. 全部分片成功后才发送完成请求
//!
//! 任一分片失败时不发送完成请求，返回 `DetaError::PartUpload`，
//! 会话保持未完成状态，是否中止由调用方决定。

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::error::{DetaError, Result};
use crate::models::Response;
use crate::orchestrator::aggregator::BatchResult;
use crate::orchestrator::dispatcher::Dispatcher;

/// 一个分片
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    /// 分片号，从 1 开始
    pub number: usize,
    pub data: Bytes,
}

/// 远端分配的上传会话
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadSession {
    /// 远端规范化后的文件名
    pub name: String,
    pub upload_id: String,
}

/// 分片上传的目标存储
///
/// 只负责单个请求，流程由 `upload` 编排。
#[async_trait]
pub trait MultipartTarget: Send + Sync {
    /// 单次上传完整内容
    async fn upload_whole(&self, name: &str, content: Bytes) -> Result<Response>;

    /// 发起上传会话
    async fn initiate(&self, name: &str) -> Result<UploadSession>;

    /// 上传一个分片
    async fn upload_part(&self, session: &UploadSession, part: Part) -> Result<Response>;

    /// 完成上传会话
    async fn complete(&self, session: &UploadSession) -> Result<Response>;
}

/// 按字节顺序切分内容
///
/// 除最后一片外每片恰好 `part_size` 字节，最后一片为余下的 1..=part_size 字节。
pub fn split_parts(content: &Bytes, part_size: usize) -> Vec<Part> {
    let part_size = part_size.max(1);

    (0..content.len())
        .step_by(part_size)
        .enumerate()
        .map(|(index, start)| {
            let end = (start + part_size).min(content.len());
            Part {
                number: index + 1,
                data: content.slice(start..end),
            }
        })
        .collect()
}

/// 上传内容，超过分片大小时走分片流程
///
/// # 参数
/// - `target`: 目标存储
/// - `dispatcher`: 分片并发派发器
/// - `name`: 文件名
/// - `content`: 文件内容
/// - `part_size`: 分片大小（也是走分片流程的阈值）
///
/// # 返回
/// 单次上传的响应，或完成请求的响应
pub async fn upload<T>(
    target: &T,
    dispatcher: &Dispatcher,
    name: &str,
    content: Bytes,
    part_size: usize,
) -> Result<Response>
where
    T: MultipartTarget + Clone + 'static,
{
    if content.len() <= part_size {
        return target.upload_whole(name, content).await;
    }

    let parts = split_parts(&content, part_size);
    info!(
        "📦 [{}] 分片上传: {} 字节, {} 个分片",
        name,
        content.len(),
        parts.len()
    );

    // 发起失败时直接返回，没有需要清理的会话
    let session = target.initiate(name).await?;
    info!("✓ [{}] 上传会话已创建: {}", name, session.upload_id);

    let numbers: Vec<usize> = parts.iter().map(|part| part.number).collect();
    let shared_session = Arc::new(session.clone());
    let task_target = target.clone();

    let outcomes = dispatcher
        .dispatch(parts, move |part| {
            let target = task_target.clone();
            let session = Arc::clone(&shared_session);
            async move {
                let endpoint = format!("upload part #{} of {}", part.number, session.name);
                target
                    .upload_part(&session, part)
                    .await?
                    .error_for_status(&endpoint)
            }
        })
        .await;

    let batch = BatchResult::zip(numbers, outcomes);

    if !batch.is_all_ok() {
        let failed_parts: Vec<usize> = batch.failures().map(|r| r.unit).collect();
        for failure in batch.failures() {
            if let Some(e) = failure.error() {
                error!("[{}] ❌ 分片 #{} 上传失败: {}", name, failure.unit, e);
            }
        }

        return Err(DetaError::PartUpload {
            name: session.name,
            upload_id: session.upload_id,
            failed_parts,
        });
    }

    let response = target.complete(&session).await?;
    info!("✓ [{}] 分片上传完成: status={}", name, response.status);

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Whole(usize),
        Initiate,
        Part(usize, usize),
        Complete,
    }

    #[derive(Clone, Default)]
    struct FakeTarget {
        calls: Arc<Mutex<Vec<Call>>>,
        failing_part: Option<usize>,
    }

    impl FakeTarget {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MultipartTarget for FakeTarget {
        async fn upload_whole(&self, _name: &str, content: Bytes) -> Result<Response> {
            self.calls.lock().unwrap().push(Call::Whole(content.len()));
            Ok(Response::new(201, Record::new()))
        }

        async fn initiate(&self, name: &str) -> Result<UploadSession> {
            self.calls.lock().unwrap().push(Call::Initiate);
            Ok(UploadSession {
                name: name.to_string(),
                upload_id: "u-1".to_string(),
            })
        }

        async fn upload_part(&self, _session: &UploadSession, part: Part) -> Result<Response> {
            // 分片号越小完成得越晚
            tokio::time::sleep(Duration::from_millis(30 / part.number as u64)).await;
            self.calls
                .lock()
                .unwrap()
                .push(Call::Part(part.number, part.data.len()));
            if self.failing_part == Some(part.number) {
                return Ok(Response::new(500, Record::new()));
            }
            Ok(Response::new(200, Record::new()))
        }

        async fn complete(&self, _session: &UploadSession) -> Result<Response> {
            self.calls.lock().unwrap().push(Call::Complete);
            Ok(Response::new(200, Record::new()))
        }
    }

    #[test]
    fn test_split_parts_sizes_and_numbers() {
        let content = Bytes::from((0..25u8).collect::<Vec<u8>>());
        let parts = split_parts(&content, 10);

        let shape: Vec<(usize, usize)> = parts.iter().map(|p| (p.number, p.data.len())).collect();
        assert_eq!(shape, vec![(1, 10), (2, 10), (3, 5)]);
        assert_eq!(parts[2].data[0], 20);

        let exact = split_parts(&Bytes::from(vec![0u8; 20]), 10);
        assert_eq!(exact.len(), 2);
        assert_eq!(exact[1].data.len(), 10);
    }

    #[tokio::test]
    async fn test_small_content_uploads_directly() {
        let target = FakeTarget::default();
        let response = upload(
            &target,
            &Dispatcher::unbounded(),
            "a.txt",
            Bytes::from_static(b"hello"),
            10,
        )
        .await
        .unwrap();

        assert_eq!(response.status, 201);
        assert_eq!(target.calls(), vec![Call::Whole(5)]);
    }

    #[tokio::test]
    async fn test_multipart_flow() {
        let target = FakeTarget::default();
        upload(
            &target,
            &Dispatcher::new(8),
            "big.bin",
            Bytes::from(vec![7u8; 25]),
            10,
        )
        .await
        .unwrap();

        let calls = target.calls();
        assert_eq!(calls.first(), Some(&Call::Initiate));
        assert_eq!(calls.last(), Some(&Call::Complete));

        let mut parts: Vec<(usize, usize)> = calls
            .iter()
            .filter_map(|c| match c {
                Call::Part(n, len) => Some((*n, *len)),
                _ => None,
            })
            .collect();
        parts.sort();
        assert_eq!(parts, vec![(1, 10), (2, 10), (3, 5)]);
    }

    #[tokio::test]
    async fn test_failed_part_skips_completion() {
        let target = FakeTarget {
            failing_part: Some(2),
            ..FakeTarget::default()
        };

        let err = upload(
            &target,
            &Dispatcher::unbounded(),
            "big.bin",
            Bytes::from(vec![0u8; 30]),
            10,
        )
        .await
        .unwrap_err();

        match err {
            DetaError::PartUpload {
                upload_id,
                failed_parts,
                ..
            } => {
                assert_eq!(upload_id, "u-1");
                assert_eq!(failed_parts, vec![2]);
            }
            other => panic!("unexpected error: {}", other),
        }

        // 三个分片都跑完，但没有完成请求
        let calls = target.calls();
        assert_eq!(calls.iter().filter(|c| matches!(c, Call::Part(..))).count(), 3);
        assert!(!calls.contains(&Call::Complete));
    }
}
