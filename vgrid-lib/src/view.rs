//! Renderer-side helpers.
//!
//! [`TableView`] combines a [`GridSnapshot`] with the column declarations to
//! produce header and cell text, positions rows in the virtual content, and
//! dispatches row actions. [`TableView::render_text`] draws the window as a
//! plain-text table.

use unicode_width::UnicodeWidthChar;
use unicode_width::UnicodeWidthStr;

use crate::column::Column;
use crate::column::ColumnWidth;
use crate::grid::GridSnapshot;
use crate::grid::RowSlot;
use crate::model::Row;

const MAX_AUTO_WIDTH: usize = 40;
const INDEX_WIDTH: usize = 6;
const SEPARATOR: &str = " │ ";

/// One displayed row, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedRow {
    /// Absolute row index.
    pub index: usize,
    /// Pixel offset of the row's top edge in the virtual content.
    pub top: f64,
    /// Cell text, one per column.
    pub cells: Vec<String>,
    /// Whether the row data has been fetched.
    pub loaded: bool,
}

/// Column-aware view over grid snapshots.
#[derive(Debug, Clone, Default)]
pub struct TableView {
    columns: Vec<Column>,
}

impl TableView {
    /// Creates a view over the given columns.
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Returns the columns.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Header titles, in column order.
    pub fn header(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| column.title().to_string())
            .collect()
    }

    /// Cell text for one row (or a placeholder row when `None`).
    pub fn cells(&self, row: Option<&Row>) -> Vec<String> {
        self.columns.iter().map(|column| column.cell(row)).collect()
    }

    /// Every row of the snapshot's visible window.
    ///
    /// Empty while the snapshot is blocking.
    pub fn rows(&self, snapshot: &GridSnapshot) -> Vec<RenderedRow> {
        if snapshot.is_blocking() {
            return Vec::new();
        }
        snapshot
            .rows()
            .iter()
            .map(|(index, slot)| RenderedRow {
                index: *index,
                top: snapshot.row_top(*index),
                cells: self.cells(slot.as_row()),
                loaded: slot.is_loaded(),
            })
            .collect()
    }

    /// Triggers action `action` of column `column` for row `index`.
    ///
    /// Returns `false` (and does nothing) when the row is not loaded or
    /// outside the window, or when the column or action does not exist.
    pub fn activate(
        &self,
        snapshot: &GridSnapshot,
        index: usize,
        column: usize,
        action: usize,
    ) -> bool {
        let Some(RowSlot::Loaded(row)) = snapshot.row(index) else {
            return false;
        };
        let Some(action) = self
            .columns
            .get(column)
            .and_then(|column| column.actions().get(action))
        else {
            return false;
        };
        action.invoke(row);
        true
    }

    /// Draws the snapshot as a text table with a row-index gutter.
    pub fn render_text(&self, snapshot: &GridSnapshot) -> String {
        let header = self.header();
        let rows = self.rows(snapshot);
        let widths = self.column_widths(&header, &rows);

        let mut out = String::new();
        push_line(&mut out, "#", &header, &widths);
        let rule_width = INDEX_WIDTH
            + widths
                .iter()
                .map(|width| width + SEPARATOR.width())
                .sum::<usize>();
        out.push_str(&"─".repeat(rule_width));
        out.push('\n');

        if snapshot.is_blocking() {
            out.push_str("Loading...\n");
            return out;
        }
        if snapshot.is_empty() {
            out.push_str("No rows\n");
            return out;
        }

        for row in &rows {
            push_line(&mut out, &row.index.to_string(), &row.cells, &widths);
        }
        if let Some(range) = snapshot.visible_range() {
            out.push_str(&format!(
                "rows {}-{} of {} ({} loaded, {} cached)\n",
                range.start(),
                range.end(),
                snapshot.total_count(),
                snapshot.loaded_count(),
                snapshot.cached_rows()
            ));
        }
        out
    }

    fn column_widths(&self, header: &[String], rows: &[RenderedRow]) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, column)| match column.width() {
                Some(ColumnWidth::Fixed(width)) => usize::from(width).max(1),
                _ => rows
                    .iter()
                    .map(|row| row.cells[i].width())
                    .chain(std::iter::once(header[i].width()))
                    .max()
                    .unwrap_or(1)
                    .clamp(1, MAX_AUTO_WIDTH),
            })
            .collect()
    }
}

fn push_line(out: &mut String, gutter: &str, cells: &[String], widths: &[usize]) {
    out.push_str(&format!("{:>width$}", gutter, width = INDEX_WIDTH - 1));
    out.push(' ');
    for (cell, width) in cells.iter().zip(widths) {
        out.push_str(SEPARATOR);
        out.push_str(&fit(cell, *width));
    }
    out.push('\n');
}

/// Pads or truncates `text` to exactly `width` display columns.
fn fit(text: &str, width: usize) -> String {
    let text_width = text.width();
    if text_width <= width {
        return format!("{}{}", text, " ".repeat(width - text_width));
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if used + ch_width + 1 > width {
            break;
        }
        out.push(ch);
        used += ch_width;
    }
    out.push('…');
    used += 1;
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}
