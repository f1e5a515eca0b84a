//! 基础设施层：环境提供的文件来源和文件保存能力

pub mod file_sink;
pub mod file_source;

pub use file_sink::{DirectorySink, FileSaveSink, DOWNLOAD_FILE_NAME, JSON_MIME_TYPE};
pub use file_source::{BatchSource, InMemoryBatch, JsonFileBatch};
