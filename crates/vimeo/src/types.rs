//! API response types for Vimeo.

use serde::{Deserialize, Serialize};

/// A video as returned by `/me/videos` and `/videos/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Video {
    /// Canonical identifier, e.g. `/videos/123`.
    pub uri: String,
    #[serde(default)]
    pub name: String,
    /// Download links; absent or null when the account may not download.
    #[serde(default)]
    pub download: Option<Vec<VideoDownload>>,
}

impl Video {
    pub fn downloads(&self) -> &[VideoDownload] {
        self.download.as_deref().unwrap_or_default()
    }
}

/// One rendition of a video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoDownload {
    /// `"hd"`, `"sd"`, `"mobile"`, `"source"`...
    #[serde(default)]
    pub quality: String,
    pub link: String,
    #[serde(default)]
    pub size: Option<u64>,
}

/// One page of a paginated listing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VideoPage {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default)]
    pub data: Vec<Video>,
}

impl VideoPage {
    /// Number of pages implied by `total` and `per_page`.
    pub fn page_count(&self) -> u32 {
        if self.per_page == 0 {
            return 1;
        }
        self.total.div_ceil(u64::from(self.per_page)).max(1) as u32
    }
}

/// Response to creating a tus upload (internal).
#[derive(Debug, Deserialize)]
pub(crate) struct CreateUploadResponse {
    pub uri: String,
    pub upload: UploadTicket,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadTicket {
    pub upload_link: String,
}
