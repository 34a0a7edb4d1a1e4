//! CLI output formatting utilities.

use crate::catalog::Song;
use crate::orchestrator::{LyricsOutcome, PipelineReport};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a one-line song summary.
    pub fn song_line(song: &Song) {
        let lyrics = match song.lyrics.as_deref() {
            None => style("no lyrics").dim(),
            Some(_) => style("lyrics").green(),
        };
        println!(
            "  {} {} {} - {} ({})",
            style(format!("#{}", song.id)).cyan(),
            style(&song.title).bold(),
            style("by").dim(),
            song.artist_name,
            lyrics
        );
    }

    /// Print the result of a pipeline run.
    pub fn report(report: &PipelineReport) {
        match &report.outcome {
            LyricsOutcome::Generated => {
                Output::success(&format!("Lyrics generated for '{}'", report.title))
            }
            LyricsOutcome::NotPossible { reason } => Output::warning(&format!(
                "No lyrics for '{}': {}",
                report.title, reason
            )),
            LyricsOutcome::Failed { stage, reason } => Output::warning(&format!(
                "Lyrics for '{}' failed while {}: {}",
                report.title, stage, reason
            )),
        }
        Output::kv("Job", &report.job_id.to_string());
        println!();
        println!("{}", report.lyrics);
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}
