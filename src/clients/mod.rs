pub mod merge_client;

pub use merge_client::{HttpMergeClient, MergeClient};
