//! 文件批次校验 - 业务能力层
//!
//! 把一个批次的原始文本转换为可加入会话的文件。
//!
//! 规则（按批次内顺序逐个处理）：
//! 1. 去掉开头的 BOM 后解析 JSON（非法 UTF-8 同样视为非法 JSON），失败则整批放弃
//!    （包括本批中已解析成功的文件）
//! 2. 计算文件大小（不含 BOM）
//! 3. 会话中或本批中已有同名文件时跳过该文件并记录，继续处理后续文件

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::error::{AppResult, SessionError};
use crate::infrastructure::BatchSource;
use crate::models::{FileEntry, RawFile};
use crate::utils::truncate_text;
use crate::workflow::UploadSession;

/// 校验通过的批次
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedBatch {
    /// 新文件（保持批次内顺序）
    pub entries: Vec<FileEntry>,
    /// 因重名被跳过的文件名
    pub skipped_duplicates: Vec<String>,
}

impl ValidatedBatch {
    pub fn total_size_mb(&self) -> f64 {
        self.entries.iter().map(|entry| entry.size_mb).sum()
    }
}

/// 文件批次校验器
///
/// 只读访问会话，不修改会话。
#[derive(Debug, Default, Clone, Copy)]
pub struct FileBatchValidator;

impl FileBatchValidator {
    pub fn new() -> Self {
        Self
    }

    /// 校验已在内存中的批次
    ///
    /// 迭代器是惰性消费的，遇到非法 JSON 后不会再取后续文件。
    pub fn process<I>(
        &self,
        batch: I,
        session: &UploadSession,
    ) -> Result<ValidatedBatch, SessionError>
    where
        I: IntoIterator<Item = RawFile>,
    {
        let mut state = BatchState::default();
        for file in batch {
            self.accept(file, session, &mut state)?;
        }
        Ok(state.finish())
    }

    /// 从批次来源逐个读取并校验
    ///
    /// 每个文件读完再读下一个；遇到非法 JSON 立即返回，剩余文件不再读取。
    pub async fn process_source<S>(
        &self,
        source: &mut S,
        session: &UploadSession,
    ) -> AppResult<ValidatedBatch>
    where
        S: BatchSource + ?Sized,
    {
        let mut state = BatchState::default();
        while let Some(file) = source.next_file().await? {
            self.accept(file, session, &mut state)?;
        }
        Ok(state.finish())
    }

    fn accept(
        &self,
        file: RawFile,
        session: &UploadSession,
        state: &mut BatchState,
    ) -> Result<(), SessionError> {
        let document = serde_json::from_slice(file.content()).map_err(|source| {
            warn!("❌ 文件 {} 不是合法的 JSON，放弃整个批次", file.name);
            debug!("内容预览: {}", truncate_text(&file.text_lossy(), 80));
            SessionError::InvalidJson {
                name: file.name.clone(),
                source,
            }
        })?;

        let entry = FileEntry::new(&file.name, file.content(), document);

        if session.contains(&entry.name) || !state.names.insert(entry.name.clone()) {
            info!("⏭️ 跳过重复文件: {}", entry.name);
            state.batch.skipped_duplicates.push(entry.name);
            return Ok(());
        }

        debug!("✓ 文件 {} 校验通过 ({} MB)", entry.name, entry.size_display());
        state.batch.entries.push(entry);
        Ok(())
    }
}

#[derive(Default)]
struct BatchState {
    batch: ValidatedBatch,
    names: HashSet<String>,
}

impl BatchState {
    fn finish(self) -> ValidatedBatch {
        self.batch
    }
}
