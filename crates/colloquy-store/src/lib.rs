//! Colloquy-Store: persistence for finished feedback workflows
//!
//! The core engine never reads persisted state; this crate only stores the
//! terminal result of each run (summary, per-category reports, processing
//! time) and answers "what was the most recent result".
//!
//! ## Key Components
//!
//! - `FeedbackStore`: async storage trait
//! - `FeedbackRecord`: serializable record of one run
//! - `FsFeedbackStore`: one JSON file per record on local disk
//! - `fakes::MemoryFeedbackStore`: in-memory store for tests

#![warn(missing_docs)]

mod error;
pub mod fakes;
mod fs_store;
mod record;
pub mod storage_traits;

pub use error::StorageError;
pub use fs_store::FsFeedbackStore;
pub use record::{FeedbackId, FeedbackRecord, InputDigest};
pub use storage_traits::{FeedbackStore, StorageResult};
