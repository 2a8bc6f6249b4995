//! In-memory `RemoteStore` used by the engine's tests.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use futures_util::StreamExt;

use crate::remote::{ByteStream, RemoteError, RemoteFuture, RemoteStore};
use crate::types::{DownloadLink, RemoteItem};

#[derive(Default)]
pub(crate) struct MockStore {
    items: Vec<RemoteItem>,
    contents: HashMap<String, Vec<u8>>,
    fail_uploads: HashSet<String>,
    fail_fetches: HashSet<String>,
    break_streams: HashSet<String>,
    hang_upload: Option<String>,
    list_fails: bool,
    upload_hook: Option<Box<dyn Fn(&str) + Send + Sync>>,
    uploads: Mutex<Vec<(PathBuf, String)>>,
    fetches: Mutex<Vec<String>>,
}

impl MockStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds a remote video with an `hd` and/or `sd` link serving `content`.
    pub(crate) fn with_video(mut self, id: &str, name: &str, qualities: &[&str], content: &[u8]) -> Self {
        let links = qualities
            .iter()
            .map(|q| {
                let link = format!("https://cdn.test/{id}/{q}");
                self.contents.insert(link.clone(), content.to_vec());
                DownloadLink {
                    quality: (*q).to_string(),
                    link,
                    size: Some(content.len() as u64),
                }
            })
            .collect();
        self.items.push(RemoteItem {
            id: format!("/videos/{id}"),
            name: name.into(),
            links,
        });
        self
    }

    pub(crate) fn failing_upload(mut self, name: &str) -> Self {
        self.fail_uploads.insert(name.into());
        self
    }

    pub(crate) fn failing_fetch(mut self, link: &str) -> Self {
        self.fail_fetches.insert(link.into());
        self
    }

    /// The stream for `link` yields some bytes then an error.
    pub(crate) fn breaking_stream(mut self, link: &str) -> Self {
        self.break_streams.insert(link.into());
        self
    }

    /// Uploading `name` never completes.
    pub(crate) fn hanging_upload(mut self, name: &str) -> Self {
        self.hang_upload = Some(name.into());
        self
    }

    /// Runs `hook` with the display name after each accepted upload.
    pub(crate) fn on_upload(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.upload_hook = Some(Box::new(hook));
        self
    }

    pub(crate) fn failing_listing(mut self) -> Self {
        self.list_fails = true;
        self
    }

    pub(crate) fn items(&self) -> Vec<RemoteItem> {
        self.items.clone()
    }

    pub(crate) fn uploaded_names(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|(_, name)| name.clone())
            .collect()
    }

    pub(crate) fn uploaded_paths(&self) -> Vec<PathBuf> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|(path, _)| path.clone())
            .collect()
    }

    pub(crate) fn fetched_links(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }
}

impl RemoteStore for MockStore {
    fn upload<'a>(&'a self, path: &'a Path, name: &'a str) -> RemoteFuture<'a, String> {
        Box::pin(async move {
            self.uploads
                .lock()
                .unwrap()
                .push((path.to_path_buf(), name.to_string()));
            if self.hang_upload.as_deref() == Some(name) {
                std::future::pending::<()>().await;
            }
            if self.fail_uploads.contains(name) {
                return Err(RemoteError::new(format!("upload rejected: {name}")));
            }
            if !path.is_file() {
                return Err(RemoteError::new(format!("no such file: {}", path.display())));
            }
            if let Some(hook) = &self.upload_hook {
                hook(name);
            }
            Ok(format!("/videos/{}", self.uploads.lock().unwrap().len()))
        })
    }

    fn list_all(&self) -> RemoteFuture<'_, Vec<RemoteItem>> {
        Box::pin(async move {
            if self.list_fails {
                Err(RemoteError::new("listing unavailable"))
            } else {
                Ok(self.items.clone())
            }
        })
    }

    fn get_item<'a>(&'a self, id: &'a str) -> RemoteFuture<'a, RemoteItem> {
        Box::pin(async move {
            self.items
                .iter()
                .find(|i| i.id == id)
                .cloned()
                .ok_or_else(|| RemoteError::new(format!("not found: {id}")))
        })
    }

    fn fetch<'a>(&'a self, link: &'a str) -> RemoteFuture<'a, (ByteStream, Option<u64>)> {
        Box::pin(async move {
            self.fetches.lock().unwrap().push(link.to_string());
            if self.fail_fetches.contains(link) {
                return Err(RemoteError::new("connection reset"));
            }
            let content = self
                .contents
                .get(link)
                .cloned()
                .ok_or_else(|| RemoteError::new("404"))?;
            let len = content.len() as u64;

            let mut pieces: Vec<Result<Vec<u8>, RemoteError>> =
                content.chunks(3).map(|c| Ok(c.to_vec())).collect();
            if self.break_streams.contains(link) {
                pieces.truncate(1);
                pieces.push(Err(RemoteError::new("stream interrupted")));
            }
            Ok((futures_util::stream::iter(pieces).boxed(), Some(len)))
        })
    }
}
