//! Styled terminal output utilities.
//!
//! Stdout write failures are dropped so a closed pipe or full disk never
//! aborts a run.

use std::fmt;
use std::io::{self, Write};

use chrono::Local;
use owo_colors::OwoColorize;

use stepwise_migrate::MigrationStatus;

fn emit(args: fmt::Arguments<'_>) {
    writeln!(io::stdout().lock(), "{}", args).ok();
}

/// Print a header/title
pub fn header(text: &str) {
    emit(format_args!(""));
    emit(format_args!("{}", text.bold().cyan()));
    emit(format_args!("{}", "─".repeat(text.chars().count()).dimmed()));
    emit(format_args!(""));
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    emit(format_args!("  {}: {}", key.dimmed(), value));
}

/// Print a progress line prefixed with the local time
pub fn log(text: &str) {
    log_to(&mut io::stdout().lock(), text);
}

/// Write a progress line to `out`, ignoring write errors
pub fn log_to(out: &mut impl Write, text: &str) {
    let time = Local::now().format("%H:%M:%S").to_string();
    writeln!(out, "{}", timestamped(&time, text)).ok();
}

fn timestamped(time: &str, text: &str) -> String {
    format!("[{}] {}", time, text)
}

/// Print a plain message
pub fn plain(text: &str) {
    emit(format_args!("{}", text));
}

/// Print a success message
pub fn success(text: &str) {
    emit(format_args!("{} {}", "✔".green().bold(), text.green()));
}

/// Print a warning message
pub fn warn(text: &str) {
    emit(format_args!("{} {}", "⚠".yellow().bold(), text.yellow()));
}

/// Print an error message
pub fn error(text: &str) {
    writeln!(io::stderr().lock(), "{} {}", "✖".red().bold(), text.red()).ok();
}

/// Print a list item
pub fn list_item(text: &str) {
    emit(format_args!("  {} {}", "•".dimmed(), text));
}

/// Print a newline
pub fn newline() {
    emit(format_args!(""));
}

/// Print dimmed text
pub fn dim(text: &str) {
    emit(format_args!("{}", text.dimmed()));
}

/// Style text as success (green)
pub fn style_success(text: &str) -> String {
    text.green().bold().to_string()
}

/// Style text as pending (yellow)
pub fn style_pending(text: &str) -> String {
    text.yellow().bold().to_string()
}

/// Style text as error (red)
pub fn style_error(text: &str) -> String {
    text.red().bold().to_string()
}

/// Styling for a migration status label
pub fn status_style(status: MigrationStatus) -> fn(&str) -> String {
    match status {
        MigrationStatus::Success => style_success,
        MigrationStatus::Corrupted => style_error,
        MigrationStatus::Pending => style_pending,
    }
}

/// Ask for confirmation, defaulting to no
pub fn confirm(prompt: &str) -> bool {
    let mut stdout = io::stdout().lock();
    write!(stdout, "{} {} ", prompt, "[y/N]".dimmed()).ok();
    stdout.flush().ok();
    drop(stdout);

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }

    is_yes(&input)
}

fn is_yes(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

/// A table cell with optional styling
#[derive(Debug, Clone)]
pub struct Cell {
    text: String,
    style: Option<fn(&str) -> String>,
}

impl Cell {
    /// Create an unstyled cell
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: None,
        }
    }

    /// Create a cell rendered through `style`
    pub fn styled(text: impl Into<String>, style: fn(&str) -> String) -> Self {
        Self {
            text: text.into(),
            style: Some(style),
        }
    }
}

/// A bordered table with multi-line cells.
///
/// Widths are measured on the unstyled text, so styling never breaks
/// alignment.
#[derive(Debug, Clone)]
pub struct Table {
    headers: Vec<String>,
    max_widths: Vec<Option<usize>>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Create a table with the given column headers
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            max_widths: vec![None; headers.len()],
            rows: Vec::new(),
        }
    }

    /// Wrap a column at `width` characters
    pub fn max_width(mut self, column: usize, width: usize) -> Self {
        if let Some(slot) = self.max_widths.get_mut(column) {
            *slot = Some(width.max(1));
        }
        self
    }

    /// Append a row; missing cells render empty
    pub fn row(&mut self, cells: Vec<Cell>) {
        self.rows.push(cells);
    }

    /// Render the table
    pub fn render(&self) -> String {
        let columns = self.headers.len();

        let header: Vec<Vec<String>> = (0..columns)
            .map(|c| wrap(&self.headers[c], self.max_widths[c]))
            .collect();
        let body: Vec<Vec<Vec<String>>> = self
            .rows
            .iter()
            .map(|row| {
                (0..columns)
                    .map(|c| {
                        let text = row.get(c).map(|cell| cell.text.as_str()).unwrap_or("");
                        wrap(text, self.max_widths[c])
                    })
                    .collect()
            })
            .collect();

        let widths: Vec<usize> = (0..columns)
            .map(|c| {
                std::iter::once(&header[c])
                    .chain(body.iter().map(|row| &row[c]))
                    .flat_map(|lines| lines.iter().map(|l| l.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        out.push_str(&border(&widths, '┌', '┬', '┐'));
        render_row(&mut out, &widths, &header, |_| Some(bold as fn(&str) -> String));
        for (row, lines) in self.rows.iter().zip(&body) {
            out.push_str(&border(&widths, '├', '┼', '┤'));
            render_row(&mut out, &widths, lines, |c| row.get(c).and_then(|cell| cell.style));
        }
        out.push_str(&border(&widths, '└', '┴', '┘'));
        out
    }
}

fn bold(text: &str) -> String {
    text.bold().to_string()
}

fn border(widths: &[usize], left: char, middle: char, right: char) -> String {
    let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    format!("{}{}{}\n", left, segments.join(&middle.to_string()), right)
}

fn render_row(
    out: &mut String,
    widths: &[usize],
    cells: &[Vec<String>],
    style: impl Fn(usize) -> Option<fn(&str) -> String>,
) {
    let height = cells.iter().map(Vec::len).max().unwrap_or(1);
    for line in 0..height {
        out.push('│');
        for (c, width) in widths.iter().enumerate() {
            let text = cells[c].get(line).map(String::as_str).unwrap_or("");
            let pad = width - text.chars().count();
            let styled = match style(c) {
                Some(style) if !text.is_empty() => style(text),
                _ => text.to_string(),
            };
            out.push_str(&format!(" {}{} │", styled, " ".repeat(pad)));
        }
        out.push('\n');
    }
}

/// Split on newlines, then hard-wrap each line at `max` characters.
fn wrap(text: &str, max: Option<usize>) -> Vec<String> {
    let mut lines = Vec::new();
    for line in text.lines() {
        let chars: Vec<char> = line.chars().collect();
        match max {
            Some(max) if chars.len() > max => {
                lines.extend(chars.chunks(max).map(|chunk| chunk.iter().collect()));
            }
            _ => lines.push(line.to_string()),
        }
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
