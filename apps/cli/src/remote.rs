//! `RemoteStore` implementation backed by the Vimeo client.

use std::path::Path;

use futures_util::StreamExt;
use vimeops_batch::{ByteStream, DownloadLink, RemoteError, RemoteFuture, RemoteItem, RemoteStore};
use vimeops_vimeo::{Client, Video};

/// Bridges the batch engine to the Vimeo API.
pub struct VimeoStore {
    client: Client,
    chunk_size: usize,
}

impl VimeoStore {
    pub fn new(client: Client, chunk_size: usize) -> Self {
        Self { client, chunk_size }
    }
}

impl RemoteStore for VimeoStore {
    fn upload<'a>(&'a self, path: &'a Path, name: &'a str) -> RemoteFuture<'a, String> {
        Box::pin(async move {
            self.client
                .upload_video(path, name, self.chunk_size)
                .await
                .map_err(remote_error)
        })
    }

    fn list_all(&self) -> RemoteFuture<'_, Vec<RemoteItem>> {
        Box::pin(async move {
            let videos = self.client.list_all_videos().await.map_err(remote_error)?;
            Ok(videos.into_iter().map(to_remote_item).collect())
        })
    }

    fn get_item<'a>(&'a self, id: &'a str) -> RemoteFuture<'a, RemoteItem> {
        Box::pin(async move {
            let video = self.client.get_video(id).await.map_err(remote_error)?;
            Ok(to_remote_item(video))
        })
    }

    fn fetch<'a>(&'a self, link: &'a str) -> RemoteFuture<'a, (ByteStream, Option<u64>)> {
        Box::pin(async move {
            let (stream, length) = self.client.download(link).await.map_err(remote_error)?;
            let stream = stream.map(|piece| piece.map_err(remote_error)).boxed();
            Ok((stream, length))
        })
    }
}

fn remote_error(e: vimeops_vimeo::Error) -> RemoteError {
    RemoteError::new(e.to_string())
}

fn to_remote_item(video: Video) -> RemoteItem {
    let links = video
        .downloads()
        .iter()
        .map(|d| DownloadLink {
            quality: d.quality.clone(),
            link: d.link.clone(),
            size: d.size,
        })
        .collect();
    RemoteItem {
        id: video.uri,
        name: video.name,
        links,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vimeops_vimeo::VideoDownload;

    #[test]
    fn video_maps_to_remote_item() {
        let video = Video {
            uri: "/videos/7".into(),
            name: "Lesson".into(),
            download: Some(vec![
                VideoDownload {
                    quality: "sd".into(),
                    link: "https://cdn/sd".into(),
                    size: Some(3),
                },
                VideoDownload {
                    quality: "hd".into(),
                    link: "https://cdn/hd".into(),
                    size: None,
                },
            ]),
        };

        let item = to_remote_item(video);
        assert_eq!(item.id, "/videos/7");
        assert_eq!(item.short_id(), "7");
        assert_eq!(item.name, "Lesson");
        assert_eq!(item.select_link().unwrap().link, "https://cdn/hd");
    }

    #[test]
    fn video_without_downloads_has_no_link() {
        let item = to_remote_item(Video {
            uri: "/videos/8".into(),
            name: "Private".into(),
            download: None,
        });
        assert!(item.select_link().is_none());
    }
}
