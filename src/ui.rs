//! Terminal UI utilities.
//!
//! A small box-drawn table used for the end-of-run summary. Columns shrink
//! (widest first) when the terminal is too narrow; cells may contain ANSI
//! colour codes.

use colored::*;
use console::{Term, measure_text_width, truncate_str};

const MIN_COLUMN_WIDTH: usize = 8;

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Rows with the wrong number of cells are ignored.
    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row);
        }
    }

    pub fn print(&self) {
        let (_, cols) = Term::stdout().size();
        for line in self.render(cols as usize) {
            println!("{}", line);
        }
    }

    /// Lay the table out for a terminal `max_width` columns wide.
    pub fn render(&self, max_width: usize) -> Vec<String> {
        if self.headers.is_empty() {
            return Vec::new();
        }

        let mut widths: Vec<usize> = self
            .headers
            .iter()
            .map(|h| measure_text_width(h))
            .collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(measure_text_width(&flatten(cell)));
            }
        }
        fit_widths(&mut widths, max_width);

        let mut lines = Vec::with_capacity(self.rows.len() + 4);
        lines.push(separator(&widths, "┌", "┬", "┐"));
        lines.push(row_line(&self.headers, &widths, true));
        lines.push(separator(&widths, "├", "┼", "┤"));
        for row in &self.rows {
            lines.push(row_line(row, &widths, false));
        }
        lines.push(separator(&widths, "└", "┴", "┘"));
        lines
    }
}

fn fit_widths(widths: &mut [usize], max_width: usize) {
    // two-space indent, one border per column plus the closing one,
    // one space of padding each side of every cell
    let overhead = 3 + 3 * widths.len();
    let available = max_width.saturating_sub(overhead);

    while widths.iter().sum::<usize>() > available {
        let Some((idx, &widest)) = widths.iter().enumerate().max_by_key(|(_, w)| **w) else {
            return;
        };
        if widest <= MIN_COLUMN_WIDTH {
            return;
        }
        widths[idx] -= 1;
    }
}

fn separator(widths: &[usize], left: &str, mid: &str, right: &str) -> String {
    let inner = widths
        .iter()
        .map(|w| "─".repeat(w + 2))
        .collect::<Vec<_>>()
        .join(mid);
    format!("  {}{}{}", left, inner, right)
}

fn row_line(cells: &[String], widths: &[usize], header: bool) -> String {
    let mut line = String::from("  │");
    for (cell, &width) in cells.iter().zip(widths) {
        let flat = flatten(cell);
        let text = truncate_str(&flat, width, "...");
        let padding = width.saturating_sub(measure_text_width(&text));
        let text = if header {
            text.as_ref().bold().to_string()
        } else {
            text.into_owned()
        };
        line.push_str(&format!(" {}{} │", text, " ".repeat(padding)));
    }
    line
}

fn flatten(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            _ => c,
        })
        .collect()
}
