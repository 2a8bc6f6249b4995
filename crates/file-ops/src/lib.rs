//! Local video library housekeeping.
//!
//! Renames the videos of a course-style library (one folder per course) after
//! their folder, so uploads get meaningful names.

mod rename;

pub use rename::{RenameAction, RenameReport, apply_plan, plan_renames, rename_videos};

/// Bytes per "MB" in size thresholds (decimal megabytes).
pub const BYTES_PER_MB: u64 = 1_000_000;

/// Errors from the rename utility.
#[derive(Debug, thiserror::Error)]
pub enum RenameError {
    #[error("{0}")]
    Precondition(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl RenameError {
    fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
