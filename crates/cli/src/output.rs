//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};
use watcher_lib::api::ReportStatus;
use watcher_lib::classifier::Severity;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print rows as a rounded table
pub fn print_table<T: Tabled>(rows: Vec<T>) {
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format an amount without a trailing `.00`
pub fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

/// Color a report status by severity
pub fn color_status(status: ReportStatus) -> String {
    let text = status.as_str();
    match status {
        ReportStatus::Ok => text.green().bold().to_string(),
        ReportStatus::Attention => text.cyan().bold().to_string(),
        ReportStatus::Warning => text.yellow().bold().to_string(),
        ReportStatus::Critical | ReportStatus::Error => text.red().bold().to_string(),
        ReportStatus::NotConfigured => text.dimmed().to_string(),
    }
}

/// Color a usage percentage by the severity it falls into
pub fn color_percentage(percentage: i64) -> String {
    let text = format!("{}%", percentage);
    match Severity::from_percentage(percentage) {
        Severity::Ok => text.green().to_string(),
        Severity::Attention => text.cyan().to_string(),
        Severity::Warning => text.yellow().to_string(),
        Severity::Critical => text.red().to_string(),
    }
}
