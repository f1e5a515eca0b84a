//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责合并请求的生命周期和会话对象的组合，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `merge_orchestrator` - 合并请求编排器
//! - 维护 idle / pending / succeeded / failed 状态机
//! - 同一会话同时只允许一个进行中的请求
//! - 解释合并服务的响应，失败时不自动重试
//! - 把合并结果交给文件保存
//!
//! ### `workspace` - 合并工作区
//! - 展示层持有的唯一会话对象
//! - 组合批次校验、上传会话和合并编排器
//! - 会话变更时清除已有的合并结果
//!
//! ## 层次关系
//!
//! ```text
//! workspace (add / remove / merge / download)
//!     ↓
//! merge_orchestrator (请求生命周期)
//!     ↓
//! workflow::UploadSession (文件集合 + 配额)
//!     ↓
//! services (能力层：batch_validator / quota_policy)
//!     ↓
//! clients / infrastructure (合并服务、文件来源、文件保存)
//! ```

pub mod merge_orchestrator;
pub mod workspace;

// 重新导出主要类型
pub use merge_orchestrator::{MergeOrchestrator, PendingMerge};
pub use workspace::{IngestReport, MergeWorkspace};
