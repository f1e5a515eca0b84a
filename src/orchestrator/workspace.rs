//! 合并工作区 - 编排层
//!
//! 展示层唯一持有的会话对象：组合上传会话、批次校验器、合并编排器和合并策略，
//! 对外暴露 add / remove / clear / merge / download。
//! 所有操作返回结构化结果，由展示层转换为提示信息。

use serde_json::Value;
use tracing::{info, warn};

use crate::clients::MergeClient;
use crate::config::Config;
use crate::error::{AppError, AppResult, MergeError, SessionError};
use crate::infrastructure::{BatchSource, FileSaveSink};
use crate::models::{MergePolicy, MergeRequestState, RawFile};
use crate::orchestrator::merge_orchestrator::{MergeOrchestrator, PendingMerge};
use crate::services::{FileBatchValidator, ValidatedBatch};
use crate::workflow::{QuotaContext, UploadSession, UsageSummary};

/// 一次批次导入的结果
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    /// 新加入会话的文件名
    pub added: Vec<String>,
    /// 因重名被跳过的文件名
    pub skipped_duplicates: Vec<String>,
    /// 导入后会话总大小（MB）
    pub session_size_mb: f64,
}

/// 合并工作区
pub struct MergeWorkspace<C> {
    session: UploadSession,
    validator: FileBatchValidator,
    orchestrator: MergeOrchestrator<C>,
    policy: MergePolicy,
    reset_on_invalid_json: bool,
}

impl<C: MergeClient> MergeWorkspace<C> {
    /// 创建空工作区
    pub fn new(quota: QuotaContext, client: C) -> Self {
        Self {
            session: UploadSession::new(quota),
            validator: FileBatchValidator::new(),
            orchestrator: MergeOrchestrator::new(client),
            policy: MergePolicy::default(),
            reset_on_invalid_json: false,
        }
    }

    /// 按配置创建工作区
    pub fn from_config(config: &Config, client: C) -> AppResult<Self> {
        let mut workspace = Self::new(config.quota()?, client);
        workspace.policy = MergePolicy::new(config.override_keys);
        workspace.reset_on_invalid_json = config.reset_on_invalid_json;
        Ok(workspace)
    }

    /// 批次中出现非法 JSON 时是否清空整个会话
    pub fn with_reset_on_invalid_json(mut self, enabled: bool) -> Self {
        self.reset_on_invalid_json = enabled;
        self
    }

    pub fn session(&self) -> &UploadSession {
        &self.session
    }

    pub fn state(&self) -> &MergeRequestState {
        self.orchestrator.state()
    }

    pub fn merged(&self) -> Option<&Value> {
        self.orchestrator.state().merged()
    }

    pub fn client(&self) -> &C {
        self.orchestrator.client()
    }

    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    /// 切换键冲突策略（不影响已有结果）
    pub fn set_override(&mut self, override_keys: bool) {
        self.policy = MergePolicy::new(override_keys);
    }

    pub fn usage(&self) -> UsageSummary {
        self.session.usage()
    }

    pub fn can_merge(&self) -> bool {
        self.session.can_merge() && !self.orchestrator.state().is_pending()
    }

    /// 导入内存中的批次
    pub fn ingest<I>(&mut self, batch: I) -> AppResult<IngestReport>
    where
        I: IntoIterator<Item = RawFile>,
    {
        let validated = self
            .validator
            .process(batch, &self.session)
            .map_err(AppError::from);
        self.apply(validated)
    }

    /// 从批次来源逐个读取并导入
    pub async fn ingest_source<S>(&mut self, source: &mut S) -> AppResult<IngestReport>
    where
        S: BatchSource + ?Sized,
    {
        let validated = self.validator.process_source(source, &self.session).await;
        self.apply(validated)
    }

    fn apply(&mut self, validated: AppResult<ValidatedBatch>) -> AppResult<IngestReport> {
        let batch = match validated {
            Ok(batch) => batch,
            Err(err) => {
                if self.reset_on_invalid_json
                    && matches!(err, AppError::Session(SessionError::InvalidJson { .. }))
                {
                    warn!("批次包含非法 JSON，清空当前会话");
                    self.clear();
                }
                return Err(err);
            }
        };

        let added: Vec<String> = batch.entries.iter().map(|e| e.name.clone()).collect();
        self.session.add(batch.entries)?;
        self.orchestrator.on_session_changed();

        if !batch.skipped_duplicates.is_empty() {
            info!("⏭️ 跳过 {} 个重复文件", batch.skipped_duplicates.len());
        }

        Ok(IngestReport {
            added,
            skipped_duplicates: batch.skipped_duplicates,
            session_size_mb: self.session.total_size_mb(),
        })
    }

    /// 删除文件，文件不存在时什么也不做
    pub fn remove(&mut self, name: &str) -> bool {
        let removed = self.session.remove(name);
        if removed {
            self.orchestrator.on_session_changed();
        }
        removed
    }

    /// 清空所有文件
    pub fn clear(&mut self) -> usize {
        let removed = self.session.clear();
        if removed > 0 {
            self.orchestrator.on_session_changed();
        }
        removed
    }

    /// 发起合并并等待结果
    pub async fn merge(&mut self) -> AppResult<&Value> {
        self.orchestrator.start(&self.session, self.policy).await
    }

    /// 只发起合并，由调用方自行发送请求（见 [`MergeWorkspace::finish_merge`]）
    pub fn begin_merge(&mut self) -> AppResult<PendingMerge> {
        Ok(self.orchestrator.begin(&self.session, self.policy)?)
    }

    /// 处理调用方取得的合并响应
    pub fn finish_merge(
        &mut self,
        pending: PendingMerge,
        result: Result<Value, MergeError>,
    ) -> AppResult<Option<&Value>> {
        let revision = self.session.revision();
        self.orchestrator.finish(pending, revision, result)
    }

    /// 把合并结果交给文件保存
    pub fn download(&self, sink: &dyn FileSaveSink) -> AppResult<String> {
        self.orchestrator.download(sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MergeRequest;
    use async_trait::async_trait;
    use serde_json::json;

    /// 回显第一个文档的合并客户端
    struct EchoFirst;

    #[async_trait]
    impl MergeClient for EchoFirst {
        async fn merge(&self, request: &MergeRequest) -> Result<Value, MergeError> {
            Ok(request.documents[0].clone())
        }
    }

    fn workspace() -> MergeWorkspace<EchoFirst> {
        MergeWorkspace::new(QuotaContext::new(50.0, 8.3).unwrap(), EchoFirst)
    }

    fn raw(name: &str, text: &str) -> RawFile {
        RawFile::new(name, text)
    }

    #[test]
    fn test_invalid_batch_keeps_existing_files_by_default() {
        let mut ws = workspace();
        ws.ingest(vec![raw("keep.json", "{}")]).unwrap();

        let result = ws.ingest(vec![
            raw("validA.json", "{}"),
            raw("invalid.json", "{oops"),
            raw("validB.json", "{}"),
        ]);

        assert!(result.is_err());
        let names: Vec<&str> = ws.session().entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["keep.json"]);
    }

    #[test]
    fn test_invalid_batch_can_reset_session() {
        let mut ws = workspace().with_reset_on_invalid_json(true);
        ws.ingest(vec![raw("keep.json", "{}")]).unwrap();

        assert!(ws.ingest(vec![raw("invalid.json", "nope")]).is_err());
        assert!(ws.session().is_empty());
        assert_eq!(ws.session().total_size_mb(), 0.0);
    }

    #[test]
    fn test_duplicate_is_reported_not_raised() {
        let mut ws = workspace();
        ws.ingest(vec![raw("x.json", "{}")]).unwrap();

        let report = ws
            .ingest(vec![raw("x.json", "{}"), raw("y.json", "[]")])
            .unwrap();

        assert_eq!(report.added, vec!["y.json".to_string()]);
        assert_eq!(report.skipped_duplicates, vec!["x.json".to_string()]);
        assert_eq!(ws.session().len(), 2);
    }

    #[test]
    fn test_quota_rejection_reports_three_figures() {
        let mut ws = MergeWorkspace::new(QuotaContext::new(1.0, 0.5).unwrap(), EchoFirst);
        let big = format!("\"{}\"", "x".repeat(600_000));

        let err = ws.ingest(vec![raw("big.json", &big)]).unwrap_err();

        match err {
            AppError::Session(SessionError::QuotaExceeded {
                limit_mb,
                used_mb,
                attempted_mb,
            }) => {
                assert_eq!(limit_mb, 1.0);
                assert_eq!(used_mb, 0.5);
                assert_eq!(attempted_mb, 600_002.0 / 1_048_576.0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(ws.session().is_empty());
    }

    #[tokio::test]
    async fn test_remove_after_success_resets_state() {
        let mut ws = workspace();
        ws.ingest(vec![raw("a.json", r#"{"a": 1}"#), raw("b.json", r#"{"b": 2}"#)])
            .unwrap();
        ws.merge().await.unwrap();
        assert!(ws.merged().is_some());

        assert!(ws.remove("b.json"));

        assert_eq!(ws.state(), &MergeRequestState::Idle);
        assert!(ws.merged().is_none());
    }

    #[tokio::test]
    async fn test_add_after_success_resets_state() {
        let mut ws = workspace();
        ws.ingest(vec![raw("a.json", "1"), raw("b.json", "2")]).unwrap();
        ws.merge().await.unwrap();

        ws.ingest(vec![raw("c.json", "3")]).unwrap();

        assert_eq!(ws.state(), &MergeRequestState::Idle);
    }

    #[tokio::test]
    async fn test_all_duplicate_batch_resets_state() {
        let mut ws = workspace();
        ws.ingest(vec![raw("a.json", "1"), raw("b.json", "2")]).unwrap();
        ws.merge().await.unwrap();

        let report = ws.ingest(vec![raw("a.json", "1")]).unwrap();

        assert!(report.added.is_empty());
        assert_eq!(ws.state(), &MergeRequestState::Idle);
        assert!(ws.merged().is_none());
    }

    /// 总是失败的合并客户端
    struct AlwaysDown;

    #[async_trait]
    impl MergeClient for AlwaysDown {
        async fn merge(&self, _request: &MergeRequest) -> Result<Value, MergeError> {
            Err(MergeError::Transport {
                endpoint: "http://localhost:8000/merge-json".to_string(),
                message: "connection refused".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_change_after_failure_resets_state() {
        let mut ws = MergeWorkspace::new(QuotaContext::new(50.0, 0.0).unwrap(), AlwaysDown);
        ws.ingest(vec![raw("a.json", "1"), raw("b.json", "2")]).unwrap();

        assert!(ws.merge().await.is_err());
        assert!(ws.state().failure().is_some());

        ws.ingest(vec![raw("c.json", "3")]).unwrap();
        assert_eq!(ws.state(), &MergeRequestState::Idle);

        assert!(ws.merge().await.is_err());
        assert!(ws.state().failure().is_some());

        assert!(ws.remove("c.json"));
        assert_eq!(ws.state(), &MergeRequestState::Idle);
    }

    #[test]
    fn test_non_utf8_file_resets_session_when_enabled() {
        let mut ws = workspace().with_reset_on_invalid_json(true);
        ws.ingest(vec![raw("keep.json", "{}")]).unwrap();

        let err = ws
            .ingest(vec![RawFile::from_bytes("latin1.json", b"{\"a\":\"\xFF\"}".to_vec())])
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Session(SessionError::InvalidJson { ref name, .. }) if name == "latin1.json"
        ));
        assert!(ws.session().is_empty());
    }

    #[test]
    fn test_begin_merge_blocks_second_request() {
        let mut ws = workspace();
        ws.ingest(vec![raw("a.json", "1"), raw("b.json", "2")]).unwrap();

        let pending = ws.begin_merge().unwrap();
        assert!(!ws.can_merge());
        assert!(matches!(
            ws.begin_merge(),
            Err(AppError::Session(SessionError::MergeInFlight))
        ));

        let merged = ws.finish_merge(pending, Ok(json!([1, 2]))).unwrap();
        assert_eq!(merged, Some(&json!([1, 2])));
        assert!(ws.can_merge());
    }

    #[test]
    fn test_set_override_changes_policy() {
        let mut ws = workspace();
        assert!(ws.policy().override_keys);
        ws.set_override(false);
        assert_eq!(ws.policy(), MergePolicy::new(false));
    }
}
