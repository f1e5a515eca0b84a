pub mod batch_validator;
pub mod quota_policy;

pub use batch_validator::{FileBatchValidator, ValidatedBatch};
pub use quota_policy::{QuotaDecision, QuotaPolicy};
