//! 上传文件模型

use serde_json::Value;

/// 1 MB 对应的字节数
pub const BYTES_PER_MB: f64 = 1_048_576.0;

/// UTF-8 BOM
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// 环境交付的原始文件：文件名 + 原始内容
///
/// 内容按字节保存，是否为合法 UTF-8 由校验器判断。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl RawFile {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::from_bytes(name, text.into().into_bytes())
    }

    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// 去掉开头 BOM 后的内容（读取文本时 BOM 不算内容）
    pub fn content(&self) -> &[u8] {
        self.bytes.strip_prefix(UTF8_BOM).unwrap_or(self.bytes.as_slice())
    }

    /// 日志用的文本，非法字节替换为 U+FFFD
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(self.content()).into_owned()
    }
}

/// 已被会话接受的文件
///
/// `size_mb` 保留完整精度用于累加，展示时才保留两位小数。
/// 解析后的文档存入会话后不再修改。
#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    pub name: String,
    pub size_mb: f64,
    pub document: Value,
}

impl FileEntry {
    /// 用原始文本的编码字节长度计算大小
    pub fn new(name: impl Into<String>, raw_text: impl AsRef<[u8]>, document: Value) -> Self {
        Self {
            name: name.into(),
            size_mb: size_mb_of(raw_text.as_ref()),
            document,
        }
    }

    /// 展示用的大小（两位小数）
    pub fn size_display(&self) -> String {
        format!("{:.2}", self.size_mb)
    }
}

/// 文本按 UTF-8 编码后的大小（MB）
pub fn size_mb_of(bytes: &[u8]) -> f64 {
    bytes.len() as f64 / BYTES_PER_MB
}
