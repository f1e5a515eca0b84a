//! 文件保存 - 基础设施层
//!
//! 把合并结果交给环境保存。只暴露"保存一段文本"的能力，不认识会话。

use std::path::PathBuf;

use tracing::info;

use crate::error::{AppError, AppResult};

/// 合并结果的下载文件名
pub const DOWNLOAD_FILE_NAME: &str = "merged_json_output.json";

/// 合并结果的 MIME 类型
pub const JSON_MIME_TYPE: &str = "application/json";

/// 文件保存能力
pub trait FileSaveSink {
    /// 保存文本内容
    ///
    /// # 返回
    /// 返回保存位置的描述（路径等）
    fn save(&self, filename: &str, mime_type: &str, content: &str) -> AppResult<String>;
}

/// 保存到本地目录
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl FileSaveSink for DirectorySink {
    fn save(&self, filename: &str, mime_type: &str, content: &str) -> AppResult<String> {
        let path = self.dir.join(filename);
        let saved = path.display().to_string();

        std::fs::create_dir_all(&self.dir)
            .map_err(|e| AppError::file_write_failed(self.dir.display().to_string(), e))?;
        std::fs::write(&path, content).map_err(|e| AppError::file_write_failed(&saved, e))?;

        info!("📥 已保存 {} ({}, {} 字节)", saved, mime_type, content.len());
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_sink_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path().join("out"));

        let saved = sink
            .save(DOWNLOAD_FILE_NAME, JSON_MIME_TYPE, "{\n  \"a\": 1\n}")
            .unwrap();

        assert!(saved.ends_with(DOWNLOAD_FILE_NAME));
        let written = std::fs::read_to_string(saved).unwrap();
        assert_eq!(written, "{\n  \"a\": 1\n}");
    }
}
