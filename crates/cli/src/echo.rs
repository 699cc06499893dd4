use owo_colors::OwoColorize;
use readmark_core::{Extraction, Selection};

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!("\n{} {} {}", "Readmark".bold().bright_blue(), "v".dimmed(), VERSION.dimmed());
    eprintln!("{}", "Extract the main content of HTML documents as Markdown\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print a labelled detail line under the current step
pub fn print_detail(label: &str, value: &str) {
    eprintln!("  {} {}", format!("{}:", label).dimmed(), value.bright_white());
}

fn describe_selection(selection: Option<Selection>) -> String {
    match selection {
        Some(Selection::Candidate { score, .. }) => format!("scored candidate ({:.1})", score),
        Some(Selection::Body { .. }) => "whole body (no candidate qualified)".to_string(),
        Some(Selection::Document { .. }) => "whole document (empty body)".to_string(),
        None => "none (empty input)".to_string(),
    }
}

/// Print extraction details summary
pub fn print_extraction_details(extraction: &Extraction) {
    eprintln!("\n{}", "═".repeat(60).dimmed());
    eprintln!("{}", "Extraction Details".bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());
    print_detail("Selection", &describe_selection(extraction.selection));
    print_detail("Title", if extraction.result.title.is_empty() { "(none)" } else { extraction.result.title.as_str() });
    print_detail("Content", &format_size(extraction.result.content.len()));
    print_detail("Guard trips", &extraction.guard_trips.len().to_string());
    eprintln!();
}

/// Format file size for display
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
