//! Vimeo API client.
//!
//! Async HTTP client for the parts of the [Vimeo API](https://developer.vimeo.com/api)
//! the batch engine needs: paginated listing of the account's videos,
//! single-video lookup, resumable tus uploads and streamed downloads.

pub mod client;
pub mod types;

pub use client::{ByteStream, Client, Error};
pub use types::{Video, VideoDownload, VideoPage};
