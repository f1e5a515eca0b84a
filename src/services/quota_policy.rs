//! 配额策略 - 业务能力层
//!
//! 纯函数：根据套餐上限、已用容量和本次会话容量判断是否允许上传。

/// 配额判断结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    Allowed,
    Blocked,
}

impl QuotaDecision {
    pub fn is_allowed(self) -> bool {
        self == QuotaDecision::Allowed
    }
}

/// 配额策略
pub struct QuotaPolicy;

impl QuotaPolicy {
    /// 判断会话容量是否在配额内
    ///
    /// 仅当 `used_mb + candidate_session_mb > limit_mb` 时拒绝，刚好等于上限是允许的。
    pub fn evaluate(limit_mb: f64, used_mb: f64, candidate_session_mb: f64) -> QuotaDecision {
        if used_mb + candidate_session_mb > limit_mb {
            QuotaDecision::Blocked
        } else {
            QuotaDecision::Allowed
        }
    }

    /// 套餐使用百分比，保留两位小数
    ///
    /// `limit_mb` 不是正数时返回 None。
    pub fn usage_percent(limit_mb: f64, used_mb: f64, session_mb: f64) -> Option<f64> {
        if limit_mb <= 0.0 || !limit_mb.is_finite() {
            return None;
        }
        let percent = (used_mb + session_mb) / limit_mb * 100.0;
        Some((percent * 100.0).round() / 100.0)
    }
}
