//! Operator-facing output for batch runs.

use std::io::Write;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::sync::mpsc;
use vimeops_batch::{BatchEvent, BatchSummary, Direction};

/// Heading printed above the list of pending keys.
pub fn listing_header(direction: Direction) -> String {
    format!("The following files will be {}ed:", direction.verb())
}

/// Prints batch events as they arrive.
pub struct Reporter<W: Write> {
    out: W,
    direction: Direction,
    /// Print the pending list on discovery (no prompt will show it).
    list_pending: bool,
    show_bars: bool,
    bar: Option<ProgressBar>,
}

impl Reporter<std::io::Stdout> {
    pub fn stdout(direction: Direction, list_pending: bool) -> Self {
        Self::new(std::io::stdout(), direction, list_pending, true)
    }
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, direction: Direction, list_pending: bool, show_bars: bool) -> Self {
        Self {
            out,
            direction,
            list_pending,
            show_bars,
            bar: None,
        }
    }

    /// Drains `events` until the runner drops its sender.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<BatchEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(event);
        }
        self.clear_bar();
    }

    pub fn handle(&mut self, event: BatchEvent) {
        // Stdout going away is not worth failing the run over.
        let _ = self.print(event);
    }

    fn print(&mut self, event: BatchEvent) -> std::io::Result<()> {
        let past = format!("{}ed", self.direction.verb());
        match event {
            BatchEvent::Discovered { total, pending } => {
                tracing::debug!(total, pending = pending.len(), "work set merged");
                if self.list_pending {
                    if pending.is_empty() {
                        writeln!(self.out, "Nothing to {}.", self.direction.verb())?;
                    } else {
                        writeln!(self.out, "{}", listing_header(self.direction))?;
                        for key in &pending {
                            writeln!(self.out, "{key}")?;
                        }
                    }
                }
            }
            BatchEvent::Started {
                key,
                position,
                pending,
            } => {
                let verb = match self.direction {
                    Direction::Outbound => "Uploading",
                    Direction::Inbound => "Downloading",
                };
                writeln!(self.out, "[{position}/{pending}] {verb} {key}...")?;
            }
            BatchEvent::Progress {
                bytes,
                total,
                bytes_per_second,
                ..
            } => {
                let bar = self.bar(total);
                bar.set_position(bytes);
                bar.set_message(format!("{}/s", format_bytes(bytes_per_second as u64)));
            }
            BatchEvent::Completed { key } => {
                self.clear_bar();
                writeln!(self.out, "{key}: OK")?;
            }
            BatchEvent::AlreadyDone { key } => {
                writeln!(self.out, "{key}: already {past}")?;
            }
            BatchEvent::Failed { key, error } => {
                self.clear_bar();
                writeln!(self.out, "{key}: ERROR ({error})")?;
            }
        }
        self.out.flush()
    }

    fn bar(&mut self, total: Option<u64>) -> &ProgressBar {
        let show = self.show_bars;
        self.bar.get_or_insert_with(|| {
            let bar = match total {
                Some(len) => ProgressBar::new(len),
                None => ProgressBar::new_spinner(),
            };
            if !show {
                bar.set_draw_target(ProgressDrawTarget::hidden());
            }
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg} ETA {eta}")
            {
                bar.set_style(style.progress_chars("=> "));
            }
            bar
        })
    }

    fn clear_bar(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

/// Prints the end-of-run summary.
pub fn print_summary(out: &mut impl Write, direction: Direction, summary: &BatchSummary) -> std::io::Result<()> {
    writeln!(
        out,
        "{} {}ed, {} already done, {} failed (of {}).",
        summary.transferred,
        direction.verb(),
        summary.already_done,
        summary.failed.len(),
        summary.total
    )?;
    if summary.is_complete() {
        writeln!(out, "All files have been {}ed!", direction.verb())?;
    } else {
        writeln!(out, "Still pending (run again to retry):")?;
        for key in &summary.failed {
            writeln!(out, "  {key}")?;
        }
    }
    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(direction: Direction, list_pending: bool, events: Vec<BatchEvent>) -> String {
        let mut reporter = Reporter::new(Vec::new(), direction, list_pending, false);
        for event in events {
            reporter.handle(event);
        }
        String::from_utf8(reporter.out).unwrap()
    }

    #[test]
    fn upload_run_output() {
        let out = render(
            Direction::Outbound,
            true,
            vec![
                BatchEvent::Discovered {
                    total: 2,
                    pending: vec!["/v/b.mp4".into()],
                },
                BatchEvent::AlreadyDone {
                    key: "/v/a.mp4".into(),
                },
                BatchEvent::Started {
                    key: "/v/b.mp4".into(),
                    position: 1,
                    pending: 1,
                },
                BatchEvent::Failed {
                    key: "/v/b.mp4".into(),
                    error: "boom".into(),
                },
            ],
        );

        assert_eq!(
            out,
            "The following files will be uploaded:\n\
             /v/b.mp4\n\
             /v/a.mp4: already uploaded\n\
             [1/1] Uploading /v/b.mp4...\n\
             /v/b.mp4: ERROR (boom)\n"
        );
    }

    #[test]
    fn pending_list_left_to_prompt() {
        let out = render(
            Direction::Inbound,
            false,
            vec![BatchEvent::Discovered {
                total: 1,
                pending: vec!["Intro".into()],
            }],
        );
        assert!(out.is_empty());
    }

    #[test]
    fn download_progress_then_ok() {
        let out = render(
            Direction::Inbound,
            true,
            vec![
                BatchEvent::Started {
                    key: "Intro".into(),
                    position: 1,
                    pending: 1,
                },
                BatchEvent::Progress {
                    key: "Intro".into(),
                    bytes: 512,
                    total: Some(1024),
                    bytes_per_second: 2048.0,
                },
                BatchEvent::Completed {
                    key: "Intro".into(),
                },
            ],
        );
        assert_eq!(out, "[1/1] Downloading Intro...\nIntro: OK\n");
    }

    #[test]
    fn summary_lists_pending() {
        let summary = BatchSummary {
            total: 3,
            transferred: 1,
            already_done: 1,
            failed: vec!["Outro".into()],
        };
        let mut out = Vec::new();
        print_summary(&mut out, Direction::Inbound, &summary).unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.starts_with("1 downloaded, 1 already done, 1 failed (of 3)."));
        assert!(out.contains("  Outro\n"));
    }

    #[test]
    fn summary_complete() {
        let summary = BatchSummary {
            total: 1,
            transferred: 1,
            ..Default::default()
        };
        let mut out = Vec::new();
        print_summary(&mut out, Direction::Outbound, &summary).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("All files have been uploaded!"));
    }

    #[test]
    fn bytes_formatting() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KiB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MiB");
    }
}
