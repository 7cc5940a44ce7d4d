//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 把一个逻辑操作拆成一个或多个 HTTP 请求，控制并发，
//! 再把结果拼回调用方看到的单个返回值。
//!
//! ## 模块划分
//!
//! ### `chunker` - 分块器
//! - 批量写入按 25 条一块切分
//!
//! ### `dispatcher` - 并行分发器
//! - 每个单元一个 tokio 任务
//! - Semaphore 限制并发
//! - 按输入顺序返回结果
//!
//! ### `paginator` - 分页器
//! - 沿游标链串行拉取
//!
//! ### `multipart` - 分片上传
//! - 发起 → 并发上传分片 → 完成
//!
//! ### `aggregator` - 结果汇总
//! - 单元与结果配对，失败可定位到具体单元
//!
//! ## 层次关系
//!
//! ```text
//! services (Base / Drive)
//!     ↓
//! orchestrator (chunker / paginator / multipart)
//!     ↓
//! dispatcher → aggregator
//!     ↓
//! infrastructure (Transport)
//! ```

pub mod aggregator;
pub mod chunker;
pub mod dispatcher;
pub mod multipart;
pub mod paginator;

pub use aggregator::{BatchResult, ChunkInfo, UnitResult};
pub use chunker::chunk;
pub use dispatcher::Dispatcher;
pub use multipart::{split_parts, MultipartTarget, Part, UploadSession};
pub use paginator::{fetch_all, Page};
