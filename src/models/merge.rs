//! 合并请求相关模型
//!
//! 包括合并策略、请求状态机状态，以及与远程合并服务交互的报文。

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 合并策略
///
/// `override_keys` 为 true 时，键冲突取后上传文件的值；为 false 时保留先上传文件的值。
/// 这里只负责传给合并服务，本地不解释。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergePolicy {
    pub override_keys: bool,
}

impl MergePolicy {
    pub fn new(override_keys: bool) -> Self {
        Self { override_keys }
    }
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self {
            override_keys: true,
        }
    }
}

/// 合并请求状态
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MergeRequestState {
    /// 空闲
    #[default]
    Idle,
    /// 请求进行中
    Pending,
    /// 合并成功，携带合并结果
    Succeeded(Value),
    /// 合并失败，携带展示给用户的原因
    Failed(String),
}

impl MergeRequestState {
    pub fn is_pending(&self) -> bool {
        matches!(self, MergeRequestState::Pending)
    }

    /// 成功时的合并结果
    pub fn merged(&self) -> Option<&Value> {
        match self {
            MergeRequestState::Succeeded(document) => Some(document),
            _ => None,
        }
    }

    /// 失败原因
    pub fn failure(&self) -> Option<&str> {
        match self {
            MergeRequestState::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    /// 状态名（日志用）
    pub fn label(&self) -> &'static str {
        match self {
            MergeRequestState::Idle => "idle",
            MergeRequestState::Pending => "pending",
            MergeRequestState::Succeeded(_) => "succeeded",
            MergeRequestState::Failed(_) => "failed",
        }
    }
}

/// 发送给合并服务的请求体
///
/// 服务端字段名为 `jsons` / `override`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeRequest {
    /// 按上传顺序排列的文档
    #[serde(rename = "jsons")]
    pub documents: Vec<Value>,
    #[serde(rename = "override")]
    pub override_keys: bool,
}

/// 合并服务的成功响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeResponse {
    pub merged: Value,
}

/// 合并服务的错误响应
///
/// 优先使用 `message`；FastAPI 的校验错误放在 `detail` 中。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ServiceErrorBody {
    /// 提取可展示的错误消息
    pub fn into_message(self) -> Option<String> {
        if let Some(message) = self.message.filter(|m| !m.is_empty()) {
            return Some(message);
        }
        match self.detail? {
            Value::String(text) if !text.is_empty() => Some(text),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_uses_service_field_names() {
        let request = MergeRequest {
            documents: vec![json!({"a": 1}), json!({"b": 2})],
            override_keys: false,
        };
        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(
            wire,
            json!({"jsons": [{"a": 1}, {"b": 2}], "override": false})
        );
    }

    #[test]
    fn test_error_body_prefers_message_over_detail() {
        let body: ServiceErrorBody =
            serde_json::from_value(json!({"message": "boom", "detail": "ignored"})).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("boom"));

        let body: ServiceErrorBody = serde_json::from_value(json!({"detail": "bad input"})).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("bad input"));

        let body: ServiceErrorBody = serde_json::from_value(json!({})).unwrap();
        assert_eq!(body.into_message(), None);
    }
}
