use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 会话操作被拒绝（本地错误，会话状态不变）
    #[error("会话错误: {0}")]
    Session(#[from] SessionError),
    /// 远程合并服务错误
    #[error("合并服务错误: {0}")]
    Merge(#[from] MergeError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 上传会话错误
///
/// 所有变体都是"整个操作失败"，被拒绝的操作不会修改会话。
#[derive(Debug, Error)]
pub enum SessionError {
    /// 批次中某个文件不是合法 JSON，整批放弃
    #[error("文件 {name} 不是合法的 JSON: {source}")]
    InvalidJson {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    /// 超出套餐配额，整批拒绝
    #[error(
        "超出套餐配额: 上限 {limit_mb} MB, 已使用 {used_mb:.2} MB, 本次尝试上传 {attempted_mb:.2} MB"
    )]
    QuotaExceeded {
        limit_mb: f64,
        used_mb: f64,
        attempted_mb: f64,
    },
    /// 合并至少需要两个文件
    #[error("至少需要 2 个 JSON 文件才能合并 (当前: {count})")]
    InsufficientFiles { count: usize },
    /// 已有合并请求在进行中
    #[error("已有合并请求正在进行中")]
    MergeInFlight,
    /// 没有可下载的合并结果
    #[error("没有可下载的合并结果")]
    NoMergedDocument,
}

/// 合并服务错误
#[derive(Debug, Error)]
pub enum MergeError {
    /// 无法连接合并服务（网络错误、超时）
    #[error("合并请求失败 ({endpoint}): {message}")]
    Transport { endpoint: String, message: String },
    /// 合并服务返回错误响应
    #[error("合并服务返回错误 (status={status:?}): {message}")]
    Service { status: Option<u16>, message: String },
    /// 合并服务返回的内容无法解析
    #[error("合并服务响应格式错误: {reason}")]
    MalformedResponse { reason: String },
}

impl MergeError {
    /// 网络不可达时展示给用户的通用提示
    pub const NETWORK_FAILURE_MESSAGE: &'static str = "无法连接合并服务，请检查网络后重试";

    /// 转换为展示给用户的消息
    ///
    /// 服务端提供了错误消息时原样展示，否则使用通用提示。
    pub fn user_message(&self) -> String {
        match self {
            MergeError::Transport { message, .. } if !message.is_empty() => {
                format!("{}: {}", Self::NETWORK_FAILURE_MESSAGE, message)
            }
            MergeError::Transport { .. } => Self::NETWORK_FAILURE_MESSAGE.to_string(),
            MergeError::Service { message, .. } => message.clone(),
            MergeError::MalformedResponse { reason } => format!("合并服务响应格式错误: {}", reason),
        }
    }
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 序列化合并结果失败
    #[error("序列化 JSON 失败: {0}")]
    SerializeFailed(#[from] serde_json::Error),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置文件解析失败
    #[error("配置文件解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 配置值不合法
    #[error("配置项 {field} 不合法: {reason}")]
    InvalidValue { field: String, reason: String },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建配置值错误
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Config(ConfigError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
