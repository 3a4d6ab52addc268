//! Terminal rendering of results, answers and help text.

use crate::view::DisplayedResult;
use colored::Colorize;
use std::time::Duration;

/// Lay out a result as aligned text lines: header, separator, rows
#[must_use]
pub fn format_table(result: &DisplayedResult) -> Vec<String> {
    if result.columns.is_empty() {
        return Vec::new();
    }

    let mut col_widths: Vec<usize> = result.columns.iter().map(|h| h.chars().count()).collect();
    for row in &result.rows {
        for (i, value) in row.iter().enumerate() {
            if i < col_widths.len() {
                col_widths[i] = col_widths[i].max(value.chars().count());
            }
        }
    }

    let pad = |value: &str, width: usize| {
        let fill = width.saturating_sub(value.chars().count());
        format!("{value}{}", " ".repeat(fill))
    };
    let join = |cells: &[String]| {
        cells
            .iter()
            .enumerate()
            .map(|(i, v)| pad(v, col_widths.get(i).copied().unwrap_or(0)))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(result.rows.len() + 2);
    lines.push(join(&result.columns));
    lines.push(
        col_widths
            .iter()
            .map(|&width| "-".repeat(width))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in &result.rows {
        lines.push(join(row));
    }
    lines
}

/// Print the displayed result with zebra-striped rows
pub fn display_result(result: &DisplayedResult, elapsed: Duration) {
    if result.is_error() {
        if let Some(message) = result.error_message() {
            println!("{}", message.red());
        }
    } else if result.is_empty() {
        println!("{}", "No tables to display".yellow());
    } else {
        let lines = format_table(result);
        for (i, line) in lines.iter().enumerate() {
            match i {
                0 => println!("{}", line.bold()),
                1 => println!("{line}"),
                n if n % 2 == 1 => println!("{}", line.dimmed()),
                _ => println!("{line}"),
            }
        }
        if result.rows.is_empty() {
            println!("{}", "No rows returned".yellow());
        } else {
            println!("{}", format!("{} row(s) returned", result.rows.len()).blue());
        }
    }

    println!(
        "{}",
        format!("Elapsed: {:.3}s", elapsed.as_secs_f64()).blue()
    );
}

/// Print the raw text returned by the AI delegate
pub fn display_answer(text: &str, elapsed: Duration) {
    if text.starts_with("Error:") {
        println!("{}", text.red());
    } else {
        println!("{text}");
    }
    println!(
        "{}",
        format!("Elapsed: {:.3}s", elapsed.as_secs_f64()).blue()
    );
}

pub fn display_help(ai_available: bool) {
    println!("{}", "Commands:".green());
    println!("  .tables   - List tables");
    println!("  .schema   - Show CREATE statements");
    println!("  .refresh  - Re-run the last SELECT (or show the first table)");
    println!("  .memo     - Show the query used for refreshes");
    println!("  .sql      - Switch to SQL mode");
    if ai_available {
        println!("  .ai       - Switch to natural-language mode");
    } else {
        println!(
            "  .ai       - Switch to natural-language mode {}",
            "(unavailable: no API key)".yellow()
        );
    }
    println!("  .mode     - Toggle between SQL and natural-language mode");
    println!("  .clear    - Clear the screen");
    println!("  quit      - Exit");
    println!();
    println!("{}", "Notes:".yellow());
    println!("  - CREATE/DROP/ALTER/INSERT/UPDATE/DELETE are committed and the view is refreshed");
    println!("  - Input continues on the next line until brackets balance");
}
