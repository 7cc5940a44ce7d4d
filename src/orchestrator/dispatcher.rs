//! 并行分发器 - 编排层
//!
//! ## 职责
//!
//! 把 n 个互相独立的工作单元同时派发出去，等待全部完成后
//! 按输入顺序返回 n 个结果。
//!
//! ## 设计特点
//!
//! - 每个单元一个 tokio 任务，可选 Semaphore 限制同时在途的请求数
//! - 克隆共享同一个 Semaphore，上限对同一客户端的所有扇出生效
//! - 结果槽位 i 永远对应输入单元 i，与完成顺序无关
//! - 单个单元失败（包括任务 panic）只占据自己的槽位，不影响其他单元
//! - 不支持取消，返回前一定等待所有任务结束
//! - n = 1 时直接在当前任务中执行，panic 同样记录在槽位 0

use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error};

use crate::error::{DetaError, Result};

/// 并行分发器
#[derive(Clone, Debug)]
pub struct Dispatcher {
    semaphore: Option<Arc<Semaphore>>,
}

impl Dispatcher {
    /// 创建分发器，`max_concurrency` 为 0 表示不限制并发
    pub fn new(max_concurrency: usize) -> Self {
        let semaphore = (max_concurrency > 0).then(|| Arc::new(Semaphore::new(max_concurrency)));
        Self { semaphore }
    }

    /// 不限制并发的分发器
    pub fn unbounded() -> Self {
        Self { semaphore: None }
    }

    /// 并发执行所有单元，按输入顺序返回结果
    ///
    /// # 参数
    /// - `units`: 工作单元列表
    /// - `task`: 处理单个单元的异步函数
    ///
    /// # 返回
    /// 与 `units` 等长、顺序一致的结果列表
    pub async fn dispatch<U, T, F, Fut>(&self, mut units: Vec<U>, task: F) -> Vec<Result<T>>
    where
        U: Send + 'static,
        T: Send + 'static,
        F: Fn(U) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let total = units.len();

        if total == 1 {
            if let Some(unit) = units.pop() {
                let _permit = match self.acquire(0).await {
                    Ok(permit) => permit,
                    Err(e) => return vec![Err(e)],
                };
                let result = match AssertUnwindSafe(task(unit)).catch_unwind().await {
                    Ok(result) => result,
                    Err(payload) => {
                        let message = panic_message(payload.as_ref());
                        error!("[任务 0] 执行失败: {}", message);
                        Err(DetaError::TaskJoin { index: 0, message })
                    }
                };
                return vec![result];
            }
        }

        debug!("派发 {} 个并发任务", total);

        let task = Arc::new(task);
        let mut handles = Vec::with_capacity(total);

        // 为每个单元创建并发任务
        for (index, unit) in units.into_iter().enumerate() {
            let task = Arc::clone(&task);
            let dispatcher = self.clone();

            let handle = tokio::spawn(async move {
                let _permit = dispatcher.acquire(index).await?;
                task(unit).await
            });
            handles.push((index, handle));
        }

        // 按输入顺序等待所有任务完成
        let mut results = Vec::with_capacity(total);

        for (index, handle) in handles {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => {
                    error!("[任务 {}] 执行失败: {}", index, e);
                    results.push(Err(DetaError::TaskJoin {
                        index,
                        message: e.to_string(),
                    }));
                }
            }
        }

        results
    }

    async fn acquire(&self, index: usize) -> Result<Option<tokio::sync::OwnedSemaphorePermit>> {
        match &self.semaphore {
            Some(semaphore) => Arc::clone(semaphore)
                .acquire_owned()
                .await
                .map(Some)
                .map_err(|e| DetaError::TaskJoin {
                    index,
                    message: e.to_string(),
                }),
            None => Ok(None),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        format!("task panicked: {}", text)
    } else if let Some(text) = payload.downcast_ref::<String>() {
        format!("task panicked: {}", text)
    } else {
        "task panicked".to_string()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::unbounded()
    }
}
