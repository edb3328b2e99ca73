//! Terminal rendering for command results.

use clap::ValueEnum;
use serde::Serialize;
use serde_json::json;

const LABEL_WIDTH: usize = 16;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(rendered) => println!("{rendered}"),
        Err(e) => eprintln!("Error: could not render JSON output: {e}"),
    }
}

/// Report a completed action; JSON mode wraps it in a status envelope.
pub fn print_success(message: &str, format: &OutputFormat) {
    if *format == OutputFormat::Json {
        print_json(&json!({ "status": "success", "message": message }));
    } else {
        println!("{message}");
    }
}

/// Report a failure on stderr.
pub fn print_error(message: &str, format: &OutputFormat) {
    if *format == OutputFormat::Json {
        eprintln!("{}", json!({ "status": "error", "message": message }));
    } else {
        eprintln!("Error: {message}");
    }
}

/// Title followed by an underline of the same width.
pub fn print_heading(text: &str) {
    println!("\n{text}\n{}", "=".repeat(text.chars().count()));
}

pub fn print_row(label: &str, value: &str) {
    println!("  {:<width$} {value}", format!("{label}:"), width = LABEL_WIDTH);
}
