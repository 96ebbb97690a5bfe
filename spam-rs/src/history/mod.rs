//! Classification history

pub mod recorder;
pub mod types;

pub use recorder::{HistoryRecorder, SqliteHistory};
pub use types::*;
