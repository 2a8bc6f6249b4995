//! Folder-based video renaming.
//!
//! For each immediate subdirectory `D` of the root, the `.mp4` files directly
//! inside it are renamed `D.mp4` when there is exactly one, or
//! `D - Parte N.mp4` otherwise. Files under the size threshold are left alone.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{BYTES_PER_MB, RenameError};

/// One planned or applied step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameAction {
    Rename { from: PathBuf, to: PathBuf },
    /// Below the size threshold.
    TooSmall { path: PathBuf, size: u64 },
    /// Already carries its target name.
    Unchanged { path: PathBuf },
    /// Target exists and is a different file.
    Conflict { from: PathBuf, to: PathBuf },
}

/// Result of applying a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameReport {
    pub actions: Vec<RenameAction>,
}

impl RenameReport {
    pub fn renamed(&self) -> usize {
        self.count(|a| matches!(a, RenameAction::Rename { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|a| !matches!(a, RenameAction::Rename { .. }))
    }

    fn count(&self, pred: impl Fn(&RenameAction) -> bool) -> usize {
        self.actions.iter().filter(|a| pred(a)).count()
    }
}

/// Plans and applies the renames under `root`.
pub fn rename_videos(root: &Path, threshold_mb: u64) -> Result<RenameReport, RenameError> {
    let plan = plan_renames(root, threshold_mb)?;
    apply_plan(plan)
}

/// Computes the renames under `root` without touching the filesystem.
pub fn plan_renames(root: &Path, threshold_mb: u64) -> Result<Vec<RenameAction>, RenameError> {
    if root.as_os_str().is_empty() {
        return Err(RenameError::Precondition("path is empty".into()));
    }
    if !root.is_dir() {
        return Err(RenameError::Precondition(format!(
            "path does not exist or is not a directory: {}",
            root.display()
        )));
    }

    let threshold = threshold_mb.saturating_mul(BYTES_PER_MB);
    let mut plan = Vec::new();

    for dir in sorted_entries(root)?.into_iter().filter(|p| p.is_dir()) {
        let Some(dir_name) = dir.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };

        let videos: Vec<PathBuf> = sorted_entries(&dir)?
            .into_iter()
            .filter(|p| p.is_file() && is_mp4(p))
            .collect();
        let single = videos.len() == 1;
        let mut part = 1;

        for path in videos {
            let size = std::fs::metadata(&path)
                .map_err(|e| RenameError::io(&path, e))?
                .len();
            if size < threshold {
                plan.push(RenameAction::TooSmall { path, size });
                continue;
            }

            let target = if single {
                dir.join(format!("{dir_name}.mp4"))
            } else {
                let name = format!("{dir_name} - Parte {part}.mp4");
                part += 1;
                dir.join(name)
            };

            if target == path {
                plan.push(RenameAction::Unchanged { path });
            } else {
                plan.push(RenameAction::Rename {
                    from: path,
                    to: target,
                });
            }
        }
    }

    debug!(root = %root.display(), steps = plan.len(), "rename plan ready");
    Ok(plan)
}

/// Applies a plan in order.
///
/// A rename whose target already exists is turned into a
/// [`RenameAction::Conflict`] and skipped.
pub fn apply_plan(plan: Vec<RenameAction>) -> Result<RenameReport, RenameError> {
    let mut report = RenameReport::default();

    for action in plan {
        let action = match action {
            RenameAction::Rename { from, to } if to.exists() => {
                warn!(from = %from.display(), to = %to.display(), "target exists, skipping");
                RenameAction::Conflict { from, to }
            }
            RenameAction::Rename { from, to } => {
                std::fs::rename(&from, &to).map_err(|e| RenameError::io(&from, e))?;
                info!(from = %from.display(), to = %to.display(), "renamed");
                RenameAction::Rename { from, to }
            }
            other => other,
        };
        report.actions.push(action);
    }

    Ok(report)
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, RenameError> {
    let mut entries = std::fs::read_dir(dir)
        .map_err(|e| RenameError::io(dir, e))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| RenameError::io(dir, e))?;
    entries.sort();
    Ok(entries)
}

fn is_mp4(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("mp4"))
}
