//! 文件批次来源 - 基础设施层
//!
//! 一次拖拽或一次文件选择就是一个批次。批次内的文件按顺序逐个读取，
//! 上一个读完才开始下一个，校验器遇到非法 JSON 时可以立即停止读取剩余文件。

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{AppError, AppResult, FileError};
use crate::models::RawFile;

/// 文件批次来源
#[async_trait]
pub trait BatchSource: Send {
    /// 读取下一个文件，全部读完后返回 None
    async fn next_file(&mut self) -> AppResult<Option<RawFile>>;
}

/// 内存中的批次（已经拿到文本内容）
#[derive(Debug, Default, Clone)]
pub struct InMemoryBatch {
    files: VecDeque<RawFile>,
}

impl InMemoryBatch {
    pub fn new(files: impl IntoIterator<Item = RawFile>) -> Self {
        Self {
            files: files.into_iter().collect(),
        }
    }

    /// 尚未读取的文件数量
    pub fn remaining(&self) -> usize {
        self.files.len()
    }
}

#[async_trait]
impl BatchSource for InMemoryBatch {
    async fn next_file(&mut self) -> AppResult<Option<RawFile>> {
        Ok(self.files.pop_front())
    }
}

/// 磁盘上的 `.json` 文件批次
#[derive(Debug, Default, Clone)]
pub struct JsonFileBatch {
    paths: VecDeque<PathBuf>,
}

impl JsonFileBatch {
    /// 从路径列表创建，只保留扩展名为 `.json` 的文件
    pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            paths: paths.into_iter().filter(|p| is_json_file(p)).collect(),
        }
    }

    /// 扫描文件夹中的所有 `.json` 文件（按文件名排序）
    pub async fn from_folder(folder_path: &str) -> AppResult<Self> {
        let folder = PathBuf::from(folder_path);

        if !folder.is_dir() {
            return Err(FileError::DirectoryNotFound {
                path: folder_path.to_string(),
            }
            .into());
        }

        let mut paths = Vec::new();
        let mut entries = fs::read_dir(&folder)
            .await
            .map_err(|e| AppError::file_read_failed(folder_path, e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AppError::file_read_failed(folder_path, e))?
        {
            let path = entry.path();
            if path.is_file() && is_json_file(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        info!("📁 在 {} 中找到 {} 个 JSON 文件", folder_path, paths.len());
        Ok(Self {
            paths: paths.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[async_trait]
impl BatchSource for JsonFileBatch {
    async fn next_file(&mut self) -> AppResult<Option<RawFile>> {
        let Some(path) = self.paths.pop_front() else {
            return Ok(None);
        };

        let path_text = path.display().to_string();
        let bytes = fs::read(&path)
            .await
            .map_err(|e| AppError::file_read_failed(&path_text, e))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or(path_text);

        debug!("读取文件 {} ({} 字节)", name, bytes.len());
        Ok(Some(RawFile::from_bytes(name, bytes)))
    }
}

fn is_json_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_folder_batch_reads_only_json_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.json"), r#"{"b": 2}"#).unwrap();
        std::fs::write(dir.path().join("a.JSON"), r#"{"a": 1}"#).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not json").unwrap();

        let mut batch = JsonFileBatch::from_folder(dir.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(batch.len(), 2);

        let first = batch.next_file().await.unwrap().unwrap();
        let second = batch.next_file().await.unwrap().unwrap();
        assert_eq!(first.name, "a.JSON");
        assert_eq!(second, RawFile::new("b.json", r#"{"b": 2}"#));
        assert!(batch.next_file().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_non_utf8_file_is_read_as_bytes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("latin1.json"), b"{\"a\":\"\xFF\"}").unwrap();

        let mut batch = JsonFileBatch::from_folder(dir.path().to_str().unwrap())
            .await
            .unwrap();
        let file = batch.next_file().await.unwrap().unwrap();

        assert_eq!(file.name, "latin1.json");
        assert_eq!(file.bytes, b"{\"a\":\"\xFF\"}".to_vec());
    }

    #[tokio::test]
    async fn test_missing_folder_is_reported() {
        let err = JsonFileBatch::from_folder("/definitely/not/here")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::File(FileError::DirectoryNotFound { .. })
        ));
    }

    #[test]
    fn test_from_paths_filters_extension() {
        let batch = JsonFileBatch::from_paths(vec![
            PathBuf::from("one.json"),
            PathBuf::from("two.yaml"),
            PathBuf::from("three"),
        ]);
        assert_eq!(batch.len(), 1);
    }
}
