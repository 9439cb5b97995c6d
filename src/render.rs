//! Presentation helpers for job and file listings.
//!
//! Pure string builders: the library never prints. The CLI boundary decides
//! where rendered text goes.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::remote::{FileEntry, WorkbenchEntry};

/// Summary row describing one job.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JobRow {
    /// Job identifier, or `"N/A"` for rejected submissions.
    pub identifier: String,
    /// Tool name.
    pub tool: String,
    /// Tool version.
    pub version: String,
    /// Status label, or the submission failure text.
    pub status: String,
    /// Full invocation command.
    pub command: String,
}

/// Renders jobs as an aligned table.
#[must_use]
pub fn job_table(rows: &[JobRow]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.identifier.clone(),
                row.tool.clone(),
                row.version.clone(),
                row.status.clone(),
                row.command.clone(),
            ]
        })
        .collect();
    render_table(&["ID", "TOOL", "VERSION", "STATUS", "COMMAND"], &cells)
}

/// Renders a flat file listing as an aligned table.
#[must_use]
pub fn file_table(entries: &[FileEntry]) -> String {
    let cells: Vec<Vec<String>> = entries
        .iter()
        .map(|entry| vec![entry.name.clone(), format_size(entry.size)])
        .collect();
    render_table(&["NAME", "SIZE"], &cells)
}

/// Renders the caller's workbenches as an aligned table.
#[must_use]
pub fn workbench_table(entries: &[WorkbenchEntry]) -> String {
    let cells: Vec<Vec<String>> = entries
        .iter()
        .map(|entry| {
            vec![
                entry.name.clone(),
                format_size(entry.size),
                entry.updated_at.clone(),
            ]
        })
        .collect();
    render_table(&["NAME", "SIZE", "UPDATED"], &cells)
}

/// Renders a flat listing of slash-separated paths as a nested tree.
///
/// Directories sort alphabetically at each level; leaves carry their size.
#[must_use]
pub fn file_tree(entries: &[FileEntry]) -> String {
    let mut root = TreeNode::default();
    for entry in entries {
        root.insert(entry.name.split('/').filter(|part| !part.is_empty()), entry.size);
    }
    let mut out = String::new();
    root.render(&mut out, 0);
    out
}

/// Formats a byte count with decimal SI units, keeping at most one
/// fractional digit.
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "kB", "MB", "GB", "TB"];
    let digits = bytes.to_string();
    let group = match digits.len() {
        0..=3 => 0_usize,
        4..=6 => 1,
        7..=9 => 2,
        10..=12 => 3,
        _ => 4,
    };
    let unit = UNITS.get(group).copied().unwrap_or("TB");
    let keep = digits.len().saturating_sub(group.saturating_mul(3));
    let whole: String = digits.chars().take(keep).collect();
    let tenth = digits.chars().nth(keep).filter(|digit| *digit != '0');
    tenth.map_or_else(
        || format!("{whole} {unit}"),
        |digit| format!("{whole}.{digit} {unit}"),
    )
}

#[derive(Default)]
struct TreeNode {
    children: BTreeMap<String, TreeNode>,
    size: Option<u64>,
}

impl TreeNode {
    fn insert<'a>(&mut self, mut parts: impl Iterator<Item = &'a str>, size: u64) {
        let Some(part) = parts.next() else {
            self.size = Some(size);
            return;
        };
        self.children
            .entry(part.to_owned())
            .or_default()
            .insert(parts, size);
    }

    fn render(&self, out: &mut String, depth: usize) {
        for (name, child) in &self.children {
            let indent = "    ".repeat(depth);
            if child.children.is_empty() {
                let size = child.size.map_or_else(String::new, |bytes| {
                    format!(" ({})", format_size(bytes))
                });
                writeln!(out, "{indent}{name}{size}").ok();
            } else {
                writeln!(out, "{indent}{name}/").ok();
                child.render(out, depth.saturating_add(1));
            }
        }
    }
}

fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|header| header.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &widths, headers.iter().copied());
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    push_row(&mut out, &widths, rule.iter().map(String::as_str));
    for row in rows {
        push_row(&mut out, &widths, row.iter().map(String::as_str));
    }
    out
}

fn push_row<'a>(out: &mut String, widths: &[usize], cells: impl Iterator<Item = &'a str>) {
    let mut line = String::new();
    for (width, cell) in widths.iter().zip(cells) {
        write!(line, "{cell:<width$}  ", width = *width).ok();
    }
    out.push_str(line.trim_end());
    out.push('\n');
}
