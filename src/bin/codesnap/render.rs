//! Terminal rendering of command results.

use codesnap::task::domain::Task;
use std::io::{self, Write};

/// Timestamp layout used in the task table.
const TABLE_TIMESTAMP: &str = "%Y-%m-%d %H:%M";

const TABLE_HEADER: [&str; 7] = [
    "ID",
    "NAME",
    "STATUS",
    "CREATED",
    "LAST ACTIVITY",
    "COMMITS",
    "DESCRIPTION",
];

/// One line of command output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// A completed state change.
    Success(String),
    /// Informational result with no state change to report.
    Info(String),
    /// Untagged output such as tables, logs and diffs.
    Plain(String),
}

impl Line {
    fn render(&self) -> String {
        match self {
            Self::Success(text) => format!("[SUCCESS] {text}"),
            Self::Info(text) => format!("[INFO] {text}"),
            Self::Plain(text) => text.clone(),
        }
    }
}

/// Writes `lines` to standard output.
pub fn emit(lines: &[Line]) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    for line in lines {
        writeln!(stdout, "{}", line.render())?;
    }
    stdout.flush()
}

/// Writes an error line to standard error.
pub fn emit_error(message: &str) -> io::Result<()> {
    let mut stderr = io::stderr().lock();
    writeln!(stderr, "[ERROR] {message}")
}

/// Renders tasks as an aligned table, or the empty-registry notice.
#[must_use]
pub fn task_table(tasks: &[Task]) -> Vec<Line> {
    if tasks.is_empty() {
        return vec![Line::Plain("No tasks found.".to_owned())];
    }

    let rows: Vec<[String; 7]> = tasks.iter().map(task_row).collect();
    let mut widths = TABLE_HEADER.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let header = TABLE_HEADER.map(str::to_owned);
    let separator = widths.map(|width| "-".repeat(width));
    std::iter::once(&header)
        .chain(std::iter::once(&separator))
        .chain(rows.iter())
        .map(|row| Line::Plain(aligned(row, &widths)))
        .collect()
}

fn task_row(task: &Task) -> [String; 7] {
    let description = match task.description() {
        "" => "No description".to_owned(),
        text => text.to_owned(),
    };
    [
        task.id().to_string(),
        task.name().to_string(),
        task.status().to_string(),
        task.created().format(TABLE_TIMESTAMP).to_string(),
        task.last_activity().format(TABLE_TIMESTAMP).to_string(),
        task.commits().to_string(),
        description,
    ]
}

fn aligned(row: &[String; 7], widths: &[usize; 7]) -> String {
    row.iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_owned()
}
