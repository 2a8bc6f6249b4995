//! Command implementations.

use anyhow::Context;
use vimeops_batch::{BatchConfig, BatchRunner, Direction};
use vimeops_file_ops::{BYTES_PER_MB, RenameAction};
use vimeops_transfer::DEFAULT_CHUNK_SIZE;
use vimeops_vimeo::Client;

use crate::config::Config;
use crate::prompt::PromptConfirm;
use crate::remote::VimeoStore;
use crate::report::{Reporter, print_summary};

/// Renames the library under `input_dir` after its folders.
pub fn rename(config: &Config) -> anyhow::Result<()> {
    let root = config.input_dir.clone().unwrap_or_default();
    println!("Renaming...");

    let report = vimeops_file_ops::rename_videos(&root, config.threshold_mb)?;
    for action in &report.actions {
        match action {
            RenameAction::Rename { from, to } => {
                println!("{} -> {}", from.display(), to.display());
            }
            RenameAction::TooSmall { path, size } => {
                println!(
                    "Skipping file {}: too small! {:.2}MB < {}MB",
                    path.display(),
                    *size as f64 / BYTES_PER_MB as f64,
                    config.threshold_mb
                );
            }
            RenameAction::Unchanged { path } => {
                tracing::debug!(path = %path.display(), "already named");
            }
            RenameAction::Conflict { from, to } => {
                println!(
                    "Skipping file {}: {} already exists",
                    from.display(),
                    to.display()
                );
            }
        }
    }
    println!("{} renamed, {} skipped.", report.renamed(), report.skipped());
    Ok(())
}

/// Runs an upload or download batch.
pub async fn transfer(
    config: &Config,
    direction: Direction,
    only: Option<String>,
    suppress_confirmation: bool,
) -> anyhow::Result<()> {
    let root = match direction {
        Direction::Outbound => config.input_dir.clone(),
        Direction::Inbound => config.download_dir.clone(),
    }
    .unwrap_or_default();

    let credentials = config.credentials();
    credentials.validate()?;
    tracing::debug!(?credentials, root = %root.display(), "starting {}", direction.verb());

    let client = Client::new(&credentials.access_token)?;
    let store = VimeoStore::new(client, DEFAULT_CHUNK_SIZE);

    let batch = BatchConfig {
        auto_confirm: suppress_confirmation,
        only,
        chunk_size: DEFAULT_CHUNK_SIZE,
        ..BatchConfig::new(direction, root, &config.state_dir)
    };
    let mut runner = BatchRunner::new(batch);
    let events = runner
        .take_events()
        .context("batch events already taken")?;
    let reporter = tokio::spawn(Reporter::stdout(direction, suppress_confirmation).run(events));

    let result = runner.run(&store, &PromptConfirm).await;

    // Closing the channel lets the reporter finish.
    drop(runner);
    reporter.await?;

    let summary = result?;
    print_summary(&mut std::io::stdout(), direction, &summary)?;
    Ok(())
}
