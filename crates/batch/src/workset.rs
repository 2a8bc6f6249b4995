//! Work-set discovery.
//!
//! Outbound: recursively walk a local directory for video files, keyed by
//! full path. Inbound: list the remote account, keyed by display name.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use vimeops_ledger::ProgressRecord;
use vimeops_transfer::sanitize_file_name;

use crate::error::BatchError;
use crate::remote::RemoteStore;
use crate::types::{Direction, RemoteItem};

/// Extension of the video files picked up and produced.
pub const VIDEO_EXTENSION: &str = "mp4";

/// Data needed to execute one transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemSource {
    /// Local file to upload.
    Local(PathBuf),
    /// Remote item to download.
    Remote(RemoteItem),
}

/// One unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Stable key, unique within a run.
    pub key: String,
    pub source: ItemSource,
}

impl WorkItem {
    pub fn local(path: PathBuf) -> Self {
        Self {
            key: path.to_string_lossy().into_owned(),
            source: ItemSource::Local(path),
        }
    }

    pub fn remote(key: impl Into<String>, item: RemoteItem) -> Self {
        Self {
            key: key.into(),
            source: ItemSource::Remote(item),
        }
    }
}

/// Freshly discovered items, keyed and ordered by key.
#[derive(Debug, Clone)]
pub struct WorkSet {
    direction: Direction,
    items: BTreeMap<String, WorkItem>,
}

impl WorkSet {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            items: BTreeMap::new(),
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Adds an item; an item with the same key is replaced.
    pub fn insert(&mut self, item: WorkItem) {
        self.items.insert(item.key.clone(), item);
    }

    pub fn get(&self, key: &str) -> Option<&WorkItem> {
        self.items.get(key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    /// The fresh record: every key, none completed.
    pub fn fresh_record(&self) -> ProgressRecord {
        ProgressRecord::from_keys(self.keys())
    }
}

/// Scans `root` recursively for video files.
///
/// The root is canonicalized so keys are absolute paths regardless of the
/// working directory.
pub fn discover_local(root: &Path) -> Result<WorkSet, BatchError> {
    let root = std::fs::canonicalize(root)?;
    let mut set = WorkSet::new(Direction::Outbound);
    walk_dir(&root, &mut set)?;
    debug!(root = %root.display(), files = set.len(), "local scan complete");
    Ok(set)
}

fn walk_dir(current: &Path, set: &mut WorkSet) -> Result<(), BatchError> {
    for entry in std::fs::read_dir(current)? {
        let entry = entry?;
        let path = entry.path();
        let metadata = entry.metadata()?;

        if metadata.is_dir() {
            walk_dir(&path, set)?;
        } else if metadata.is_file() && is_video(&path) {
            set.insert(WorkItem::local(path));
        }
    }
    Ok(())
}

fn is_video(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(VIDEO_EXTENSION))
}

/// Builds the inbound work set from the remote store.
///
/// The whole account is always listed, so a single item named by `only` is
/// keyed exactly as a full run would key it. A failing listing is returned
/// as an error: the run cannot start.
pub async fn discover_remote(
    remote: &dyn RemoteStore,
    only: Option<&str>,
) -> Result<WorkSet, BatchError> {
    let listing = remote.list_all().await?;
    let set = match only {
        Some(id) => {
            let item = remote.get_item(id).await?;
            key_single_item(item, listing)
        }
        None => key_remote_items(listing),
    };
    debug!(items = set.len(), "remote listing complete");
    Ok(set)
}

/// Keys remote items by display name.
///
/// Items whose names map to the same local file (identical names, names
/// equal after sanitizing, or differing only in case) are disambiguated as
/// `"{name} [{id}]"` using the last segment of their remote identifier;
/// everything else stays bare.
pub fn key_remote_items(items: Vec<RemoteItem>) -> WorkSet {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for item in &items {
        *counts.entry(target_stem(&item.name)).or_default() += 1;
    }

    let mut set = WorkSet::new(Direction::Inbound);
    for item in items {
        let key = if counts.get(&target_stem(&item.name)).is_some_and(|n| *n > 1) {
            warn!(name = %item.name, id = %item.id, "display name collides with another video, keying by id");
            format!("{} [{}]", item.name, item.short_id())
        } else {
            item.name.clone()
        };
        set.insert(WorkItem::remote(key, item));
    }
    set
}

/// Keys `item` against the full listing and keeps only that item.
fn key_single_item(item: RemoteItem, listing: Vec<RemoteItem>) -> WorkSet {
    let id = item.id.clone();
    let mut items: Vec<RemoteItem> = listing.into_iter().filter(|i| i.id != id).collect();
    items.push(item);

    let mut set = WorkSet::new(Direction::Inbound);
    for work in key_remote_items(items).items.into_values() {
        if matches!(&work.source, ItemSource::Remote(r) if r.id == id) {
            set.insert(work);
        }
    }
    set
}

/// Case-folded local file stem a display name is written to.
fn target_stem(name: &str) -> String {
    sanitize_file_name(name).to_lowercase()
}
