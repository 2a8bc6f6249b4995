//! Vimeo API client.
//!
//! Async HTTP client using `reqwest` with bearer token authentication.

use std::path::Path;

use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::{debug, trace};
use vimeops_transfer::{ChunkReader, TransferError};

use crate::types::{CreateUploadResponse, Video, VideoPage};

const DEFAULT_BASE_URL: &str = "https://api.vimeo.com";
const API_ACCEPT: &str = "application/vnd.vimeo.*+json;version=3.4";
const TUS_VERSION: &str = "1.0.0";
const PER_PAGE: u32 = 100;
const LIST_FIELDS: &str = "uri,name,download";

/// Body of a streamed download.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, Error>>;

/// Errors from the Vimeo client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid access token")]
    InvalidToken,

    #[error("upload error: {0}")]
    Upload(String),

    #[error(transparent)]
    Transfer(#[from] TransferError),
}

/// Vimeo API client.
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    /// Creates a new client authenticated with `access_token`.
    pub fn new(access_token: &str) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("bearer {access_token}"))
                .map_err(|_| Error::InvalidToken)?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static(API_ACCEPT));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Sets a custom base URL (for testing).
    #[cfg(test)]
    pub(crate) fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("{}{}", self.base_url, endpoint)
        }
    }

    /// Performs an authenticated GET request.
    async fn get(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Vec<u8>, Error> {
        let resp = self.http.get(self.url(endpoint)).query(params).send().await?;
        Ok(check_status(resp).await?.bytes().await?.to_vec())
    }

    /// Returns one page of the account's videos.
    pub async fn list_page(&self, page: u32) -> Result<VideoPage, Error> {
        let params = [
            ("page", page.to_string()),
            ("per_page", PER_PAGE.to_string()),
            ("fields", LIST_FIELDS.to_string()),
        ];
        let body = self.get("/me/videos", &params).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Returns every video of the account, walking all pages.
    pub async fn list_all_videos(&self) -> Result<Vec<Video>, Error> {
        let first = self.list_page(1).await?;
        let pages = first.page_count();
        debug!(total = first.total, pages, "listing videos");

        let mut videos = first.data;
        for page in 2..=pages {
            let next = self.list_page(page).await?;
            if next.data.is_empty() {
                break;
            }
            videos.extend(next.data);
        }
        Ok(videos)
    }

    /// Looks up a single video by URI (`/videos/123`), id or page URL.
    pub async fn get_video(&self, uri: &str) -> Result<Video, Error> {
        let body = self.get(&video_endpoint(uri), &[]).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Uploads a local file with the tus protocol. Returns the new video's URI.
    ///
    /// Each chunk is sent at the offset the server last acknowledged, so a
    /// partially accepted chunk is resent from where the server stopped.
    pub async fn upload_video(
        &self,
        path: &Path,
        name: &str,
        chunk_size: usize,
    ) -> Result<String, Error> {
        let size = tokio::fs::metadata(path)
            .await
            .map_err(TransferError::from)?
            .len();

        let create = serde_json::json!({
            "upload": { "approach": "tus", "size": size },
            "name": name,
        });
        let resp = self
            .http
            .post(self.url("/me/videos"))
            .json(&create)
            .send()
            .await?;
        let body = check_status(resp).await?.bytes().await?;
        let ticket: CreateUploadResponse = serde_json::from_slice(&body)?;
        debug!(uri = %ticket.uri, size, "upload created");

        let mut reader = tokio::task::spawn_blocking({
            let path = path.to_path_buf();
            move || ChunkReader::new(&path, chunk_size)
        })
        .await
        .map_err(|e| Error::Upload(format!("task join error: {e}")))??;

        let mut offset = 0u64;
        while offset < size {
            let (returned, chunk) = tokio::task::spawn_blocking(move || {
                let chunk = reader.seek_to(offset).and_then(|_| reader.next_chunk());
                (reader, chunk)
            })
            .await
            .map_err(|e| Error::Upload(format!("task join error: {e}")))?;
            reader = returned;

            let Some(chunk) = chunk? else {
                return Err(Error::Upload(format!(
                    "file ended at {offset} of {size} bytes"
                )));
            };

            let resp = self
                .http
                .patch(&ticket.upload.upload_link)
                .header("Tus-Resumable", TUS_VERSION)
                .header("Upload-Offset", chunk.offset.to_string())
                .header(CONTENT_TYPE, "application/offset+octet-stream")
                .body(chunk.data)
                .send()
                .await?;
            let resp = check_status(resp).await?;

            let acknowledged = resp
                .headers()
                .get("Upload-Offset")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .ok_or_else(|| Error::Upload("missing Upload-Offset in response".into()))?;
            if acknowledged <= offset {
                return Err(Error::Upload(format!(
                    "server did not advance past offset {offset}"
                )));
            }
            trace!(offset = acknowledged, size, "chunk acknowledged");
            offset = acknowledged;
        }

        Ok(ticket.uri)
    }

    /// Starts a download. Returns the body stream and its announced length.
    pub async fn download(&self, link: &str) -> Result<(ByteStream, Option<u64>), Error> {
        let resp = check_status(self.http.get(self.url(link)).send().await?).await?;
        let length = resp.content_length();
        let stream = resp
            .bytes_stream()
            .map(|piece| piece.map(|b| b.to_vec()).map_err(Error::from))
            .boxed();
        Ok((stream, length))
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(Error::Api {
        status: status.as_u16(),
        body,
    })
}

/// Normalizes a video reference to its API endpoint.
///
/// `/videos/123` is kept; `123` and `https://vimeo.com/123` become
/// `/videos/123`.
fn video_endpoint(uri: &str) -> String {
    let uri = uri.trim();
    if uri.starts_with("/videos/") {
        return uri.to_string();
    }
    let id = uri.trim_end_matches('/').rsplit('/').next().unwrap_or(uri);
    format!("/videos/{id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    struct MockResponse {
        status: u16,
        headers: Vec<(&'static str, String)>,
        body: String,
    }

    impl MockResponse {
        fn json(body: &str) -> Self {
            Self {
                status: 200,
                headers: vec![("Content-Type", "application/json".into())],
                body: body.into(),
            }
        }

        fn status(status: u16, body: &str) -> Self {
            Self {
                status,
                headers: Vec::new(),
                body: body.into(),
            }
        }

        fn tus_ack(offset: u64) -> Self {
            Self {
                status: 204,
                headers: vec![
                    ("Tus-Resumable", TUS_VERSION.into()),
                    ("Upload-Offset", offset.to_string()),
                ],
                body: String::new(),
            }
        }
    }

    async fn bind() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, format!("http://127.0.0.1:{port}"))
    }

    /// Reads one full request (head and body).
    async fn read_request(stream: &mut TcpStream) -> String {
        let mut data = Vec::new();
        let mut buf = [0u8; 8192];
        loop {
            let n = stream.read(&mut buf).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buf[..n]);
            if let Some(end) = data.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&data[..end]).to_lowercase();
                let len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if data.len() >= end + 4 + len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&data).into_owned()
    }

    /// Serves `responses` in order, one connection each, recording requests.
    fn serve(
        listener: TcpListener,
        responses: Vec<MockResponse>,
    ) -> (Arc<Mutex<Vec<String>>>, tokio::task::JoinHandle<()>) {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        let handle = tokio::spawn(async move {
            for response in responses {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let request = read_request(&mut stream).await;
                seen.lock().unwrap().push(request);

                let mut head = format!("HTTP/1.1 {} Mock\r\n", response.status);
                for (name, value) in &response.headers {
                    head.push_str(&format!("{name}: {value}\r\n"));
                }
                if response.status != 204 {
                    head.push_str(&format!("Content-Length: {}\r\n", response.body.len()));
                }
                head.push_str("Connection: close\r\n\r\n");

                let _ = stream.write_all(head.as_bytes()).await;
                let _ = stream.write_all(response.body.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        (requests, handle)
    }

    fn request_line(request: &str) -> &str {
        request.lines().next().unwrap_or_default()
    }

    #[tokio::test]
    async fn list_all_walks_pages() {
        let (listener, url) = bind().await;
        let (requests, handle) = serve(
            listener,
            vec![
                MockResponse::json(
                    r#"{"total":3,"page":1,"per_page":2,"data":[
                        {"uri":"/videos/1","name":"A"},
                        {"uri":"/videos/2","name":"B"}
                    ]}"#,
                ),
                MockResponse::json(
                    r#"{"total":3,"page":2,"per_page":2,"data":[{"uri":"/videos/3","name":"C"}]}"#,
                ),
            ],
        );

        let client = Client::new("token").unwrap().with_base_url(url);
        let videos = client.list_all_videos().await.unwrap();

        let names: Vec<&str> = videos.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert!(request_line(&requests[0]).starts_with("GET /me/videos?"));
        assert!(request_line(&requests[0]).contains("page=1"));
        assert!(request_line(&requests[0]).contains("per_page=100"));
        assert!(request_line(&requests[0]).contains("fields=uri%2Cname%2Cdownload"));
        assert!(request_line(&requests[1]).contains("page=2"));

        handle.abort();
    }

    #[tokio::test]
    async fn requests_carry_auth_and_api_version() {
        let (listener, url) = bind().await;
        let (requests, handle) = serve(
            listener,
            vec![MockResponse::json(r#"{"total":0,"page":1,"per_page":100,"data":[]}"#)],
        );

        let client = Client::new("s3cret").unwrap().with_base_url(url);
        assert!(client.list_all_videos().await.unwrap().is_empty());

        let request = requests.lock().unwrap()[0].to_lowercase();
        assert!(request.contains("authorization: bearer s3cret"));
        assert!(request.contains("accept: application/vnd.vimeo.*+json;version=3.4"));

        handle.abort();
    }

    #[tokio::test]
    async fn listing_api_error() {
        let (listener, url) = bind().await;
        let (_requests, handle) = serve(
            listener,
            vec![MockResponse::status(401, r#"{"error":"Unauthorized"}"#)],
        );

        let client = Client::new("bad").unwrap().with_base_url(url);
        let err = client.list_all_videos().await.unwrap_err();
        assert!(matches!(err, Error::Api { status: 401, .. }), "got {err}");

        handle.abort();
    }

    #[tokio::test]
    async fn get_video_by_id() {
        let (listener, url) = bind().await;
        let (requests, handle) = serve(
            listener,
            vec![MockResponse::json(
                r#"{"uri":"/videos/42","name":"Clip","download":[{"quality":"hd","link":"https://cdn/hd","size":5}]}"#,
            )],
        );

        let client = Client::new("token").unwrap().with_base_url(url);
        let video = client.get_video("42").await.unwrap();

        assert_eq!(video.uri, "/videos/42");
        assert_eq!(video.downloads()[0].quality, "hd");
        assert!(request_line(&requests.lock().unwrap()[0]).starts_with("GET /videos/42 "));

        handle.abort();
    }

    #[tokio::test]
    async fn upload_follows_server_offsets() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"0123456789").unwrap();

        let (listener, url) = bind().await;
        let create = format!(
            r#"{{"uri":"/videos/9","upload":{{"upload_link":"{url}/upload/abc"}}}}"#
        );
        let (requests, handle) = serve(
            listener,
            vec![
                MockResponse::json(&create),
                // Server only keeps part of the first chunk.
                MockResponse::tus_ack(2),
                MockResponse::tus_ack(6),
                MockResponse::tus_ack(10),
            ],
        );

        let client = Client::new("token").unwrap().with_base_url(url);
        let uri = client.upload_video(&path, "clip", 4).await.unwrap();
        assert_eq!(uri, "/videos/9");

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 4);

        assert!(request_line(&requests[0]).starts_with("POST /me/videos "));
        assert!(requests[0].contains(r#""approach":"tus""#));
        assert!(requests[0].contains(r#""size":10"#));
        assert!(requests[0].contains(r#""name":"clip""#));

        let offsets: Vec<String> = requests[1..]
            .iter()
            .map(|r| {
                assert!(request_line(r).starts_with("PATCH /upload/abc "));
                let lower = r.to_lowercase();
                assert!(lower.contains("tus-resumable: 1.0.0"));
                assert!(lower.contains("content-type: application/offset+octet-stream"));
                lower
                    .lines()
                    .find_map(|l| l.strip_prefix("upload-offset: "))
                    .unwrap()
                    .trim()
                    .to_string()
            })
            .collect();
        assert_eq!(offsets, vec!["0", "2", "6"]);
        assert!(requests[1].ends_with("0123"));
        assert!(requests[2].ends_with("2345"));
        assert!(requests[3].ends_with("6789"));

        handle.abort();
    }

    #[tokio::test]
    async fn upload_fails_when_offset_stalls() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"0123456789").unwrap();

        let (listener, url) = bind().await;
        let create = format!(
            r#"{{"uri":"/videos/9","upload":{{"upload_link":"{url}/upload/abc"}}}}"#
        );
        let (_requests, handle) = serve(
            listener,
            vec![MockResponse::json(&create), MockResponse::tus_ack(0)],
        );

        let client = Client::new("token").unwrap().with_base_url(url);
        let err = client.upload_video(&path, "clip", 4).await.unwrap_err();
        assert!(matches!(err, Error::Upload(_)), "got {err}");

        handle.abort();
    }

    #[tokio::test]
    async fn upload_missing_file() {
        let client = Client::new("token").unwrap();
        let err = client
            .upload_video(Path::new("/nonexistent/clip.mp4"), "clip", 0)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transfer(_)));
    }

    #[tokio::test]
    async fn download_streams_body() {
        let (listener, url) = bind().await;
        let (_requests, handle) = serve(listener, vec![MockResponse::status(200, "video-bytes")]);

        let client = Client::new("token").unwrap();
        let (mut stream, length) = client.download(&format!("{url}/file.mp4")).await.unwrap();
        assert_eq!(length, Some(11));

        let mut body = Vec::new();
        while let Some(piece) = stream.next().await {
            body.extend(piece.unwrap());
        }
        assert_eq!(body, b"video-bytes");

        handle.abort();
    }

    #[tokio::test]
    async fn download_error_status() {
        let (listener, url) = bind().await;
        let (_requests, handle) = serve(listener, vec![MockResponse::status(404, "gone")]);

        let client = Client::new("token").unwrap();
        let result = client.download(&format!("{url}/file.mp4")).await;
        assert!(matches!(result, Err(Error::Api { status: 404, .. })));

        handle.abort();
    }

    #[test]
    fn video_endpoint_normalization() {
        assert_eq!(video_endpoint("/videos/123"), "/videos/123");
        assert_eq!(video_endpoint("123"), "/videos/123");
        assert_eq!(video_endpoint("https://vimeo.com/123"), "/videos/123");
        assert_eq!(video_endpoint(" https://vimeo.com/123/ "), "/videos/123");
    }

    #[test]
    fn client_rejects_invalid_token() {
        assert!(matches!(Client::new("bad\ntoken"), Err(Error::InvalidToken)));
    }
}
