//! Column layout shared by the TUI and the plain-text `--once` output.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::core::system_monitor::{GroupSnapshot, RenderSnapshot, UNIT_WIDTH, VALUE_WIDTH};

/// Display columns reserved for a metric label.
pub const LABEL_WIDTH: usize = 16;

/// One statistic column: value, unit, and room for four-character units
/// such as `" RPM"`.
pub const FIELD_WIDTH: usize = VALUE_WIDTH + UNIT_WIDTH + 1;

pub const FIELD_NAMES: [&str; 4] = ["cur", "min", "max", "avg"];

const BRANCH: &str = "├";
const LAST_BRANCH: &str = "└";

/// Fit `label` into exactly `width` display columns, cutting with `…`.
pub fn fit_label(label: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }

    let truncated = if label.width() > width {
        let mut out = String::new();
        let mut w = 0usize;
        for ch in label.chars() {
            let cw = ch.width().unwrap_or(0);
            if w + cw > width - 1 {
                break;
            }
            out.push(ch);
            w += cw;
        }
        out.push('…');
        out
    } else {
        label.to_string()
    };

    let pad = width.saturating_sub(truncated.width());
    format!("{}{}", truncated, " ".repeat(pad))
}

/// Pad a formatted field to [`FIELD_WIDTH`].
pub fn pad_field(field: &str) -> String {
    let pad = FIELD_WIDTH.saturating_sub(field.width());
    format!("{}{}", field, " ".repeat(pad))
}

/// Tree symbol for row `index` out of `count`.
pub fn branch_symbol(index: usize, count: usize) -> &'static str {
    if index + 1 == count {
        LAST_BRANCH
    } else {
        BRANCH
    }
}

/// `cur min max avg`, aligned over the value part of each field.
pub fn header_line() -> String {
    let mut line = " ".repeat(2 + LABEL_WIDTH);
    for name in FIELD_NAMES {
        line.push_str(&pad_field(&format!("{:>width$}", name, width = VALUE_WIDTH)));
    }
    line.trim_end().to_string()
}

/// Rows of one group, without styling.
pub fn group_lines(group: &GroupSnapshot) -> Vec<String> {
    let mut lines = Vec::with_capacity(group.rows.len() + 1);
    lines.push(group.name.clone());

    for (index, row) in group.rows.iter().enumerate() {
        let mut line = format!(
            "{} {}",
            branch_symbol(index, group.rows.len()),
            fit_label(&row.label, LABEL_WIDTH)
        );
        for field in row.fields() {
            line.push_str(&pad_field(field));
        }
        lines.push(line.trim_end().to_string());
    }

    lines
}

/// Whole snapshot as text: header, then each group followed by a blank line.
pub fn render_text(snapshot: &RenderSnapshot) -> String {
    let mut out = header_line();
    out.push('\n');

    for group in &snapshot.groups {
        for line in group_lines(group) {
            out.push_str(&line);
            out.push('\n');
        }
        out.push('\n');
    }

    out
}
