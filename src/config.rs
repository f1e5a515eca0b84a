use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{AppError, AppResult, ConfigError};
use crate::workflow::QuotaContext;

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "merge.toml";

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 合并服务配置 ---
    /// 合并服务地址
    pub merge_service_url: String,
    /// 合并接口路径
    pub merge_endpoint: String,
    /// 请求超时（秒）
    pub request_timeout_secs: u64,
    // --- 套餐配额 ---
    /// 套餐上限（MB）
    pub limit_mb: f64,
    /// 本次会话之前已使用的容量（MB）
    pub used_mb: f64,
    // --- 合并选项 ---
    /// 键冲突时后上传的文件覆盖先上传的文件
    pub override_keys: bool,
    /// 批次中出现非法 JSON 时清空整个会话
    pub reset_on_invalid_json: bool,
    // --- 文件目录 ---
    /// 待合并 JSON 文件所在目录
    pub input_folder: String,
    /// 合并结果输出目录
    pub output_folder: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            merge_service_url: "http://localhost:8000".to_string(),
            merge_endpoint: "/merge-json".to_string(),
            request_timeout_secs: 30,
            limit_mb: 50.0,
            used_mb: 8.3,
            override_keys: true,
            reset_on_invalid_json: false,
            input_folder: "input_json".to_string(),
            output_folder: ".".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 加载配置：先读配置文件（如果存在），再用环境变量覆盖
    ///
    /// 配置文件路径取自 `MERGE_CONFIG`，未设置时尝试当前目录下的 `merge.toml`。
    pub fn load() -> AppResult<Self> {
        let explicit = std::env::var("MERGE_CONFIG").ok();
        let path = explicit.clone().unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

        if explicit.is_some() || Path::new(&path).exists() {
            Self::from_toml_file(&path)?.with_env_overrides()
        } else {
            Self::from_env()
        }
    }

    /// 从 TOML 文件读取配置，缺失字段使用默认值
    pub fn from_toml_file(path: &str) -> AppResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| AppError::file_read_failed(path, e))?;
        Self::from_toml_str(&content, path)
    }

    /// 从 TOML 文本解析配置
    pub fn from_toml_str(content: &str, origin: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|source| {
            AppError::Config(ConfigError::TomlParseFailed {
                path: origin.to_string(),
                source,
            })
        })
    }

    /// 只使用环境变量（缺失时使用默认值）
    pub fn from_env() -> AppResult<Self> {
        Self::default().with_env_overrides()
    }

    /// 用环境变量覆盖当前配置
    pub fn with_env_overrides(self) -> AppResult<Self> {
        Ok(Self {
            merge_service_url: env_string("MERGE_SERVICE_URL").unwrap_or(self.merge_service_url),
            merge_endpoint: env_string("MERGE_ENDPOINT").unwrap_or(self.merge_endpoint),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS", "u64")?
                .unwrap_or(self.request_timeout_secs),
            limit_mb: env_parse("PLAN_LIMIT_MB", "f64")?.unwrap_or(self.limit_mb),
            used_mb: env_parse("PLAN_USED_MB", "f64")?.unwrap_or(self.used_mb),
            override_keys: env_parse("MERGE_OVERRIDE", "bool")?.unwrap_or(self.override_keys),
            reset_on_invalid_json: env_parse("RESET_ON_INVALID_JSON", "bool")?
                .unwrap_or(self.reset_on_invalid_json),
            input_folder: env_string("INPUT_FOLDER").unwrap_or(self.input_folder),
            output_folder: env_string("OUTPUT_FOLDER").unwrap_or(self.output_folder),
            verbose_logging: env_parse("VERBOSE_LOGGING", "bool")?
                .unwrap_or(self.verbose_logging),
        })
    }

    /// 合并接口的完整 URL
    pub fn merge_url(&self) -> String {
        format!(
            "{}/{}",
            self.merge_service_url.trim_end_matches('/'),
            self.merge_endpoint.trim_start_matches('/')
        )
    }

    /// 构造本次会话的配额上下文
    pub fn quota(&self) -> AppResult<QuotaContext> {
        QuotaContext::new(self.limit_mb, self.used_mb)
    }
}

fn env_string(var_name: &str) -> Option<String> {
    std::env::var(var_name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: FromStr>(var_name: &str, expected_type: &str) -> AppResult<Option<T>> {
    match env_string(var_name) {
        None => Ok(None),
        Some(value) => value.trim().parse::<T>().map(Some).map_err(|_| {
            AppError::Config(ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            })
        }),
    }
}
