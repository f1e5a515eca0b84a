/// 合并服务客户端
///
/// 封装与远程合并服务的交互。合并算法在服务端执行，这里只负责发请求和解释响应。
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, MergeError};
use crate::models::merge::{MergeRequest, MergeResponse, ServiceErrorBody};

/// 远程合并能力
#[async_trait]
pub trait MergeClient: Send + Sync {
    /// 合并文档，成功时返回服务端的 `merged` 结果
    async fn merge(&self, request: &MergeRequest) -> Result<Value, MergeError>;
}

/// 基于 HTTP 的合并服务客户端
pub struct HttpMergeClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpMergeClient {
    /// 按配置创建客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        Self::with_endpoint(
            config.merge_url(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// 使用指定的接口地址创建客户端
    pub fn with_endpoint(endpoint: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::invalid_config("request_timeout_secs", e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> MergeError {
        warn!("合并服务请求失败 ({}): {}", self.endpoint, err);
        MergeError::Transport {
            endpoint: self.endpoint.clone(),
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl MergeClient for HttpMergeClient {
    async fn merge(&self, request: &MergeRequest) -> Result<Value, MergeError> {
        debug!(
            "正在调用合并服务 {}，文档数: {}, override: {}",
            self.endpoint,
            request.documents.len(),
            request.override_keys
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if status.is_success() {
            let parsed: MergeResponse =
                serde_json::from_str(&body).map_err(|e| MergeError::MalformedResponse {
                    reason: e.to_string(),
                })?;
            debug!("合并服务调用成功");
            return Ok(parsed.merged);
        }

        let message = serde_json::from_str::<ServiceErrorBody>(&body)
            .ok()
            .and_then(ServiceErrorBody::into_message)
            .unwrap_or_else(|| format!("合并服务返回 HTTP {}", status));

        warn!("合并服务返回错误 (HTTP {}): {}", status, message);
        Err(MergeError::Service {
            status: Some(status.as_u16()),
            message,
        })
    }
}
