//! 上传会话 - 流程层
//!
//! 持有已接受文件的有序集合（按上传顺序），负责去重、配额检查和容量统计。
//!
//! 不变量：
//! - 会话内文件名唯一（区分大小写）
//! - `total_size_mb` 始终等于当前所有文件大小之和，只在变更后重新计算

use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, SessionError};
use crate::models::FileEntry;
use crate::services::{QuotaDecision, QuotaPolicy};

/// 配额上下文
///
/// 会话期间不变：套餐上限和会话开始前已使用的容量。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuotaContext {
    limit_mb: f64,
    used_mb: f64,
}

impl QuotaContext {
    /// 创建配额上下文，要求 `limit_mb > 0` 且 `used_mb >= 0`
    pub fn new(limit_mb: f64, used_mb: f64) -> AppResult<Self> {
        if !(limit_mb.is_finite() && limit_mb > 0.0) {
            return Err(AppError::invalid_config(
                "limit_mb",
                format!("套餐上限必须大于 0 (当前: {})", limit_mb),
            ));
        }
        if !(used_mb.is_finite() && used_mb >= 0.0) {
            return Err(AppError::invalid_config(
                "used_mb",
                format!("已使用容量不能为负数 (当前: {})", used_mb),
            ));
        }
        Ok(Self { limit_mb, used_mb })
    }

    pub fn limit_mb(&self) -> f64 {
        self.limit_mb
    }

    pub fn used_mb(&self) -> f64 {
        self.used_mb
    }
}

/// 使用情况摘要（展示用）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UsageSummary {
    /// 套餐上限
    pub limit_mb: f64,
    /// 会话之前已使用
    pub used_mb: f64,
    /// 本次会话上传
    pub session_mb: f64,
    /// 当前总用量
    pub total_mb: f64,
    /// 使用百分比（两位小数）
    pub percent: Option<f64>,
}

/// 上传会话
#[derive(Debug, Clone)]
pub struct UploadSession {
    quota: QuotaContext,
    entries: Vec<FileEntry>,
    total_size_mb: f64,
    revision: u64,
}

impl UploadSession {
    /// 创建空会话
    pub fn new(quota: QuotaContext) -> Self {
        Self {
            quota,
            entries: Vec::new(),
            total_size_mb: 0.0,
            revision: 0,
        }
    }

    pub fn quota(&self) -> QuotaContext {
        self.quota
    }

    /// 按上传顺序排列的文件
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 会话中是否已有同名文件
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    pub fn total_size_mb(&self) -> f64 {
        self.total_size_mb
    }

    /// 每次成功变更后递增，用于识别过期的合并结果
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// 按上传顺序复制出所有文档
    pub fn documents(&self) -> Vec<Value> {
        self.entries
            .iter()
            .map(|entry| entry.document.clone())
            .collect()
    }

    /// 添加一批文件（全部接受或全部拒绝）
    ///
    /// 已在会话中的同名文件会被丢弃；超出配额时整批拒绝，会话不变。
    ///
    /// # 返回
    /// 返回实际添加的文件数量
    pub fn add(&mut self, new_entries: Vec<FileEntry>) -> Result<usize, SessionError> {
        let mut seen: HashSet<String> = self.entries.iter().map(|e| e.name.clone()).collect();
        let mut accepted = Vec::with_capacity(new_entries.len());
        for entry in new_entries {
            if seen.insert(entry.name.clone()) {
                accepted.push(entry);
            } else {
                warn!("⚠️ 跳过重复文件: {}", entry.name);
            }
        }

        if accepted.is_empty() {
            debug!("没有新的文件需要添加");
            return Ok(0);
        }

        let candidate_total =
            self.total_size_mb + accepted.iter().map(|entry| entry.size_mb).sum::<f64>();

        if QuotaPolicy::evaluate(self.quota.limit_mb, self.quota.used_mb, candidate_total)
            == QuotaDecision::Blocked
        {
            warn!(
                "🚫 超出套餐配额: 上限 {} MB, 已使用 {:.2} MB, 尝试上传 {:.2} MB",
                self.quota.limit_mb, self.quota.used_mb, candidate_total
            );
            return Err(SessionError::QuotaExceeded {
                limit_mb: self.quota.limit_mb,
                used_mb: self.quota.used_mb,
                attempted_mb: candidate_total,
            });
        }

        let count = accepted.len();
        self.entries.extend(accepted);
        self.recompute_total();
        info!(
            "✓ 已添加 {} 个文件，会话共 {} 个文件 ({:.2} MB)",
            count,
            self.entries.len(),
            self.total_size_mb
        );
        Ok(count)
    }

    /// 按文件名删除，文件不存在时什么也不做
    ///
    /// # 返回
    /// 返回是否删除了文件
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.name != name);
        if self.entries.len() == before {
            debug!("会话中没有文件 {}，忽略删除", name);
            return false;
        }
        self.recompute_total();
        info!("🗑️ 已删除文件: {}", name);
        true
    }

    /// 清空会话
    ///
    /// # 返回
    /// 返回被清除的文件数量
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        if removed > 0 {
            self.entries.clear();
            self.recompute_total();
            info!("🧹 已清空会话 ({} 个文件)", removed);
        }
        removed
    }

    /// 是否可以发起合并：至少 2 个文件且未超出配额
    pub fn can_merge(&self) -> bool {
        self.entries.len() >= 2
            && QuotaPolicy::evaluate(self.quota.limit_mb, self.quota.used_mb, self.total_size_mb)
                .is_allowed()
    }

    /// 当前使用情况
    pub fn usage(&self) -> UsageSummary {
        let limit_mb = self.quota.limit_mb;
        let used_mb = self.quota.used_mb;
        UsageSummary {
            limit_mb,
            used_mb,
            session_mb: self.total_size_mb,
            total_mb: used_mb + self.total_size_mb,
            percent: QuotaPolicy::usage_percent(limit_mb, used_mb, self.total_size_mb),
        }
    }

    fn recompute_total(&mut self) {
        self.total_size_mb = self.entries.iter().map(|entry| entry.size_mb).sum();
        self.revision += 1;
    }
}
