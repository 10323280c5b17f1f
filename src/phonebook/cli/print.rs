use colored::Colorize;
use phonebook::record::Entry;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const MAX_COLUMN_WIDTH: usize = 32;
const COLUMN_GAP: &str = "  ";
const ID_HEADER: &str = "ID";

pub(super) fn print_info(message: &str) {
    println!("{}", message.dimmed());
}

pub(super) fn print_success(message: &str) {
    println!("{}", message.green());
}

pub(super) fn print_table(title: &str, columns: &[&str], entries: &[Entry]) {
    print!("{}", render_table(title, columns, entries));
}

/// Renders entries as a titled table.
///
/// Only columns that at least one entry has a value for are shown, in the
/// order given.
pub(super) fn render_table(title: &str, columns: &[&str], entries: &[Entry]) -> String {
    let mut out = format!("{}\n", title.bold());
    if entries.is_empty() {
        out.push_str(&format!("{}\n", "No contacts found.".dimmed()));
        return out;
    }

    let shown: Vec<&str> = columns
        .iter()
        .copied()
        .filter(|c| entries.iter().any(|e| !e.display_value(c).is_empty()))
        .collect();

    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|e| {
            shown
                .iter()
                .map(|c| truncate_to_width(&e.display_value(c), MAX_COLUMN_WIDTH))
                .collect()
        })
        .collect();
    let ids: Vec<String> = entries.iter().map(|e| e.id.to_string()).collect();

    let id_width = ids
        .iter()
        .map(|s| s.width())
        .chain(std::iter::once(ID_HEADER.width()))
        .max()
        .unwrap_or(0);
    let widths: Vec<usize> = shown
        .iter()
        .enumerate()
        .map(|(i, c)| {
            rows.iter()
                .map(|r| r[i].width())
                .chain(std::iter::once(c.width()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut header = pad(ID_HEADER, id_width).bold().to_string();
    for (c, w) in shown.iter().zip(&widths) {
        header.push_str(COLUMN_GAP);
        header.push_str(&pad(c, *w).bold().to_string());
    }
    out.push_str(header.trim_end());
    out.push('\n');

    for (id, row) in ids.iter().zip(&rows) {
        let mut line = pad(id, id_width).yellow().to_string();
        for (cell, w) in row.iter().zip(&widths) {
            line.push_str(COLUMN_GAP);
            line.push_str(&pad(cell, *w));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn pad(s: &str, width: usize) -> String {
    format!("{}{}", s, " ".repeat(width.saturating_sub(s.width())))
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }

    let mut result = String::new();
    let mut current_width = 0;
    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            break;
        }
        result.push(c);
        current_width += char_width;
    }
    result.push('…');
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use phonebook::record::record;
    use serde_json::json;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn table_aligns_columns_and_hides_empty_ones() {
        plain();
        let entries = vec![
            Entry::new(1, record([("name", json!("Adam")), ("age", json!(30))])),
            Entry::new(12, record([("name", json!("Clarisse"))])),
        ];
        let out = render_table("personal", &["name", "email", "age"], &entries);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines[0], "personal");
        assert_eq!(lines[1], "ID  name      age");
        assert_eq!(lines[2], "1   Adam      30");
        assert_eq!(lines[3], "12  Clarisse");
    }

    #[test]
    fn empty_table_says_so() {
        plain();
        let out = render_table("work", &["name"], &[]);
        assert!(out.contains("No contacts found."));
    }

    #[test]
    fn long_values_are_truncated() {
        let long = "x".repeat(40);
        let cut = truncate_to_width(&long, 10);
        assert_eq!(cut.width(), 10);
        assert!(cut.ends_with('…'));
        assert_eq!(truncate_to_width("short", 10), "short");
    }
}
