//! 合并请求编排器 - 编排层
//!
//! ## 状态机
//!
//! ```text
//! idle ──start──▶ pending ──响应──▶ succeeded(document)
//!   ▲                │                  │
//!   │                └──错误──▶ failed(reason)
//!   └──── 会话变更 ───────────────────────┘
//! ```
//!
//! - `pending` 时拒绝再次发起合并，同一会话最多一个进行中的请求
//! - 从 `failed` 重试、从 `succeeded` 重新合并都是允许的
//! - 失败后不自动重试，只有用户再次发起才会重新请求
//! - 请求期间会话被修改时，返回的结果作废，状态回到 `idle`

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::clients::MergeClient;
use crate::error::{AppResult, MergeError, SessionError};
use crate::infrastructure::{FileSaveSink, DOWNLOAD_FILE_NAME, JSON_MIME_TYPE};
use crate::models::{MergePolicy, MergeRequest, MergeRequestState};
use crate::workflow::UploadSession;

/// 已发出的合并请求
///
/// 记录发起时的会话版本，用于判断响应是否过期。
#[derive(Debug, Clone)]
pub struct PendingMerge {
    request: MergeRequest,
    revision: u64,
}

impl PendingMerge {
    pub fn request(&self) -> &MergeRequest {
        &self.request
    }

    /// 发起请求时的会话版本
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// 合并请求编排器
pub struct MergeOrchestrator<C> {
    client: C,
    state: MergeRequestState,
}

impl<C: MergeClient> MergeOrchestrator<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            state: MergeRequestState::Idle,
        }
    }

    pub fn state(&self) -> &MergeRequestState {
        &self.state
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// 发起合并：检查前置条件并进入 `pending`
    ///
    /// 被拒绝时状态不变。
    pub fn begin(
        &mut self,
        session: &UploadSession,
        policy: MergePolicy,
    ) -> Result<PendingMerge, SessionError> {
        if self.state.is_pending() {
            warn!("⚠️ 已有合并请求正在进行中，忽略本次请求");
            return Err(SessionError::MergeInFlight);
        }

        let count = session.len();
        if count < 2 {
            warn!("⚠️ 至少需要 2 个 JSON 文件才能合并 (当前: {})", count);
            return Err(SessionError::InsufficientFiles { count });
        }

        self.state = MergeRequestState::Pending;
        info!(
            "🔀 开始合并 {} 个文件 (override: {})",
            count, policy.override_keys
        );

        Ok(PendingMerge {
            request: MergeRequest {
                documents: session.documents(),
                override_keys: policy.override_keys,
            },
            revision: session.revision(),
        })
    }

    /// 处理合并服务的响应
    ///
    /// # 参数
    /// - `pending`: `begin` 返回的请求
    /// - `current_revision`: 响应到达时的会话版本
    /// - `result`: 合并服务的返回
    ///
    /// # 返回
    /// 成功时返回合并结果；结果已过期时返回 None；服务失败时返回错误，状态变为 `failed`
    pub fn finish(
        &mut self,
        pending: PendingMerge,
        current_revision: u64,
        result: Result<Value, MergeError>,
    ) -> AppResult<Option<&Value>> {
        if !self.state.is_pending() {
            debug!("没有进行中的合并请求，忽略响应");
            return Ok(None);
        }

        if pending.revision != current_revision {
            info!("会话在合并期间发生变化，丢弃过期的合并结果");
            self.state = MergeRequestState::Idle;
            return Ok(None);
        }

        match result {
            Ok(merged) => {
                info!("✓ 合并成功");
                self.state = MergeRequestState::Succeeded(merged);
                Ok(self.state.merged())
            }
            Err(err) => {
                let reason = err.user_message();
                error!("❌ 合并失败: {}", reason);
                self.state = MergeRequestState::Failed(reason);
                Err(err.into())
            }
        }
    }

    /// 发起合并并等待结果
    pub async fn start(
        &mut self,
        session: &UploadSession,
        policy: MergePolicy,
    ) -> AppResult<&Value> {
        let pending = self.begin(session, policy)?;
        let result = self.client.merge(pending.request()).await;
        self.finish(pending, session.revision(), result)?
            .ok_or_else(|| SessionError::NoMergedDocument.into())
    }

    /// 会话发生变更
    ///
    /// 已有的合并结果或失败信息被清除；进行中的请求保持 `pending`，其响应会因版本不符而作废。
    pub fn on_session_changed(&mut self) {
        match self.state {
            MergeRequestState::Succeeded(_) | MergeRequestState::Failed(_) => {
                debug!("会话已变更，清除合并状态 ({})", self.state.label());
                self.state = MergeRequestState::Idle;
            }
            MergeRequestState::Pending | MergeRequestState::Idle => {}
        }
    }

    /// 把合并结果（两空格缩进）交给文件保存
    ///
    /// 仅在 `succeeded` 状态可用，不改变状态。
    pub fn download(&self, sink: &dyn FileSaveSink) -> AppResult<String> {
        let merged = self.state.merged().ok_or(SessionError::NoMergedDocument)?;
        let content = serde_json::to_string_pretty(merged).map_err(crate::error::FileError::from)?;
        sink.save(DOWNLOAD_FILE_NAME, JSON_MIME_TYPE, &content)
    }
}
