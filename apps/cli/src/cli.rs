//! Command line surface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint};

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(name = "vimeops", version, propagate_version = true)]
#[command(about = "Batch uploader/downloader for a Vimeo account, resumable across runs")]
pub struct Cli {
    /// Do not ask for confirmation before transferring (for scripting)
    #[arg(long, global = true)]
    pub suppress_confirmation: bool,

    /// Enable debug logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Configuration file (default: ~/.config/vimeops/config.toml)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rename root/title/whatever.mp4 to root/title/title.mp4
    Rename(RenameArgs),
    /// Upload every video under a local folder
    Upload(UploadArgs),
    /// Download every video of the account (or a single one)
    Download(DownloadArgs),
}

#[derive(Debug, Args)]
pub struct RenameArgs {
    /// Library root; its tree should look like root/title/whatever.mp4
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub path: Option<PathBuf>,

    /// Files smaller than this many megabytes are left alone
    #[arg(long)]
    pub threshold: Option<u64>,
}

#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Root folder where the videos are stored
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub path: Option<PathBuf>,

    #[command(flatten)]
    pub account: AccountArgs,
}

#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// Folder the videos are written to
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub path: Option<PathBuf>,

    #[command(flatten)]
    pub account: AccountArgs,

    /// Download only this video (e.g. /videos/123)
    pub video_uri: Option<String>,
}

/// Credentials and state location shared by the transfer commands.
#[derive(Debug, Args)]
pub struct AccountArgs {
    #[arg(long)]
    pub client_id: Option<String>,

    #[arg(long)]
    pub client_secret: Option<String>,

    #[arg(long)]
    pub access_token: Option<String>,

    /// Directory holding upload.json and download.json
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub state_dir: Option<PathBuf>,
}

impl RenameArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.path {
            config.input_dir = Some(path.clone());
        }
        if let Some(threshold) = self.threshold {
            config.threshold_mb = threshold;
        }
    }
}

impl UploadArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.path {
            config.input_dir = Some(path.clone());
        }
        self.account.apply(config);
    }
}

impl DownloadArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.path {
            config.download_dir = Some(path.clone());
        }
        self.account.apply(config);
    }
}

impl AccountArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(v) = &self.client_id {
            config.client_id = v.clone();
        }
        if let Some(v) = &self.client_secret {
            config.client_secret = v.clone();
        }
        if let Some(v) = &self.access_token {
            config.access_token = v.clone();
        }
        if let Some(v) = &self.state_dir {
            config.state_dir = v.clone();
        }
    }
}
