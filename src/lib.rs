//! s3relay - Presigned-URL S3 storage access for application asset pipelines

pub mod cli;
pub mod config;
pub mod resolve;
pub mod s3;

pub use config::StorageConfig;
pub use s3::{S3PresignerV4, StorageClient, StorageError, TransferMethod};
