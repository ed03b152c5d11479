//! Display manager for REPL terminal UI
//!
//! Banner, lane headers, replies, comparisons and a spinner while a turn
//! is in flight.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::chat::{Comparison, LaneKey, TurnOutcome};
use crate::rag::RetrievedReference;

/// Longest reference excerpt printed after a reply
const REFERENCE_PREVIEW_CHARS: usize = 600;

/// Display manager for REPL UI
pub struct DisplayManager {
    current_bar: Option<ProgressBar>,
    update_interval: Duration,
    show_progress: bool,
}

impl DisplayManager {
    /// Spinner ticks at 10 FPS
    pub fn new() -> Self {
        DisplayManager {
            current_bar: None,
            update_interval: Duration::from_millis(100),
            show_progress: true,
        }
    }

    /// Disable the spinner (quiet mode, piped output)
    pub fn with_progress(mut self, enable: bool) -> Self {
        self.show_progress = enable;
        self
    }

    /// Show welcome banner
    pub fn show_banner(&self, version: &str, lane: &LaneKey, retrieval_available: bool) {
        let width = 64;
        let top = format!("{}", "=".repeat(width).cyan());
        let title = format!("  PensionBot {} - Defined Benefit Pension Plan Assistant", version);
        let rag = if retrieval_available { "Available" } else { "Unavailable" };
        let info = format!("  Lane: {} | Retrieval: {} | Mode: REPL", lane.title(), rag);
        let bottom = format!("{}", "=".repeat(width).cyan());

        println!("\n{}", top);
        println!("{}", title.bold().cyan());
        println!("{}", info.dimmed());
        println!("{}\n", bottom);
        println!(
            "Ask a question (or {} for commands, {} to quit)\n",
            "/help".green(),
            "/exit".green()
        );
    }

    /// Spinner shown while waiting on the services
    pub fn start_waiting(&mut self, lane: &LaneKey) {
        self.finish_current();
        if !self.show_progress {
            return;
        }

        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        let stage = if lane.mode == crate::chat::ChatMode::Augmented {
            "Retrieving reference and asking"
        } else {
            "Asking"
        };
        pb.set_message(format!("{} {}...", stage, lane.model));
        pb.enable_steady_tick(self.update_interval);
        self.current_bar = Some(pb);
    }

    /// Finish current spinner
    pub fn finish_current(&mut self) {
        if let Some(pb) = self.current_bar.take() {
            pb.finish_and_clear();
        }
    }

    /// Print a completed turn
    pub fn show_reply(&mut self, outcome: &TurnOutcome, show_reference: bool) {
        self.finish_current();
        println!();
        println!("{}", outcome.lane.title().bold().cyan());
        println!("{} {}", "Assistant:".green().bold(), outcome.reply);

        if show_reference {
            if let Some(reference) = &outcome.reference {
                self.show_reference(reference);
            }
        }

        println!("{}", format!("({})", format_duration(outcome.duration_ms)).dimmed());
        println!();
    }

    /// Print the passage a reply was grounded on
    pub fn show_reference(&self, reference: &RetrievedReference) {
        println!(
            "{} {} {}",
            "Reference:".yellow().bold(),
            reference.id,
            format!("(score {:.3}, {} candidates)", reference.score, reference.candidates).dimmed()
        );
        if reference.text.is_empty() {
            println!("  {}", "(no text stored for this match)".dimmed());
        } else {
            println!("  {}", preview(&reference.text, REFERENCE_PREVIEW_CHARS).dimmed());
        }
    }

    /// Print both sides of a comparison, failures included
    pub fn show_comparison(&mut self, comparison: &Comparison, show_reference: bool) {
        self.finish_current();
        for side in [&comparison.plain, &comparison.augmented] {
            match side {
                Ok(outcome) => self.show_reply(outcome, show_reference),
                Err(e) => self.show_error(&e.to_string()),
            }
        }
    }

    /// Display error message
    pub fn show_error(&mut self, error: &str) {
        self.finish_current();
        println!("{} {}", "Error:".red().bold(), error.red());
    }

    /// Display warning message
    pub fn show_warning(&self, warning: &str) {
        println!("{} {}", "Warning:".yellow().bold(), warning.yellow());
    }

    /// Prompt string for the active lane
    pub fn prompt_for(lane: &LaneKey) -> String {
        format!("[{}] pensionbot> ", lane)
    }
}

impl Default for DisplayManager {
    fn default() -> Self {
        Self::new()
    }
}

fn format_duration(duration_ms: u64) -> String {
    if duration_ms > 1000 {
        format!("{:.1}s", duration_ms as f64 / 1000.0)
    } else {
        format!("{}ms", duration_ms)
    }
}

/// First `max` characters of `text`, with an ellipsis when cut
fn preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
