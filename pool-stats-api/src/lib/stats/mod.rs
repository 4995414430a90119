//! Statistics aggregation over the pool engine's on-disk status files.
//!
//! Read-only - never modifies the files it serves.
//!
//! ## Layout on disk
//!
//! - **Pool snapshot**: `<stats_dir>/pool/pool.status`, one JSON record per
//!   line, only the head of the file is served
//! - **User records**: `<stats_dir>/users/<address>`, one file per user,
//!   named by wallet address in on-disk case

pub mod buffer;
pub mod lookup;
pub mod reader;

pub use buffer::{ResponseBuffer, MAX_RESPONSE_SIZE};
pub use reader::{StatsReader, MAX_USER_FILE_SIZE};
