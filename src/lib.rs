//! # JSON Merge Uploader
//!
//! 在套餐配额内累积多个 JSON 文件，请求远程服务合并，并下载合并结果。
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure / Clients）
//! - `infrastructure/` - 文件批次来源（内存 / 磁盘）和文件保存
//! - `clients/` - `MergeClient` 远程合并服务客户端
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不持有状态
//! - `FileBatchValidator` - 解析、计算大小、跳过重名文件
//! - `QuotaPolicy` - 配额判断和使用百分比
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - `UploadSession` 去重、配额检查后的文件集合
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/merge_orchestrator` - 合并请求状态机
//! - `orchestrator/workspace` - 组合以上各层的会话对象
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{HttpMergeClient, MergeClient};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{DirectorySink, FileSaveSink, InMemoryBatch, JsonFileBatch};
pub use models::{FileEntry, MergePolicy, MergeRequestState, RawFile};
pub use orchestrator::{IngestReport, MergeOrchestrator, MergeWorkspace};
pub use services::{FileBatchValidator, QuotaPolicy};
pub use workflow::{QuotaContext, UploadSession, UsageSummary};
