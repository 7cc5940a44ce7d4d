//! # Deta Client
//!
//! Deta Base（键值/文档存储）和 Deta Drive（文件存储）的异步客户端
//!
//! ## 架构设计
//!
//! 本库采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 只暴露"发送一个 HTTP 请求"的能力
//! - `Transport` - 传输抽象，`HttpTransport` 基于 reqwest 实现
//!
//! ### ② 编排层（Orchestration）
//! - `orchestrator/chunker` - 批量写入分块
//! - `orchestrator/dispatcher` - 并发派发，按输入顺序收集结果
//! - `orchestrator/paginator` - 沿游标链串行翻页
//! - `orchestrator/multipart` - 大文件分片上传
//! - `orchestrator/aggregator` - 结果与工作单元配对
//!
//! ### ③ 业务能力层（Services）
//! - `Base` - 条目读写、查询、更新
//! - `Drive` - 文件上传、下载、删除、列举
//!
//! ### ④ 客户端入口（Clients）
//! - `Deta` - 校验项目密钥，创建 Base / Drive
//!
//! ## 示例
//!
//! ```no_run
//! # use deta_client::{Config, Deta};
//! # use serde_json::json;
//! # async fn example() -> deta_client::Result<()> {
//! let deta = Deta::new(Config::from_env()?)?;
//! let users = deta.base("users");
//!
//! let items = (0..60)
//!     .filter_map(|i| deta_client::into_record(json!({ "key": format!("u{}", i), "age": i })))
//!     .collect();
//! let batch = users.put(items).await;
//! assert!(batch.is_all_ok());
//!
//! let everyone = users.get_all().await?;
//! println!("共 {} 条", everyone.len());
//! # Ok(())
//! # }
//! ```

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use clients::Deta;
pub use config::{Config, ProjectKey};
pub use error::{ConfigError, DetaError, Result, TransportError};
pub use infrastructure::{HttpRequest, HttpTransport, RawResponse, Transport};
pub use models::{into_record, record_key, Query, Record, Response, StreamingResponse};
pub use orchestrator::{BatchResult, ChunkInfo, Dispatcher, UnitResult, UploadSession};
pub use services::{Base, Drive, Updater};
