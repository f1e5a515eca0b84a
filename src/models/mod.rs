pub mod file_entry;
pub mod merge;

pub use file_entry::{FileEntry, RawFile};
pub use merge::{MergePolicy, MergeRequest, MergeRequestState, MergeResponse};
