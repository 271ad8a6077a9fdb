pub mod client;
pub mod file_ref;

pub use crate::common::ProgressFn;
pub use client::{TransferClient, FILE_FIELD, UPLOAD_ROUTE};
pub use file_ref::FileRef;
