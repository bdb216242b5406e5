//! Storage layer
//!
//! Transient local staging for uploads and the S3-compatible media
//! store they are committed to.

mod media;
pub mod staging;

pub use media::MediaStorage;
pub use staging::{StagedFile, Staging};
