//! Column declarations.
//!
//! Columns are plain data handed to the renderer: an ordered list of
//! property columns (a field of the row, optionally formatted) and template
//! columns (a caller-supplied renderer plus row actions). The engine never
//! interprets them.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::DateTime;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::model::Row;

/// Text shown for a row or field that has not been loaded.
pub const PLACEHOLDER: &str = "...";

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const NAIVE_DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

/// Display transformation for a property column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellFormat {
    /// Upper-case the text.
    Uppercase,
    /// Lower-case the text.
    Lowercase,
    /// Render RFC 3339 strings, `YYYY-MM-DD` dates or epoch milliseconds as
    /// `YYYY-MM-DD HH:MM:SS` (UTC). Unparseable values are shown as-is.
    Date,
}

/// Error returned when parsing an unknown cell format name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown cell format: {0}")]
pub struct ParseCellFormatError(String);

impl FromStr for CellFormat {
    type Err = ParseCellFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uppercase" => Ok(Self::Uppercase),
            "lowercase" => Ok(Self::Lowercase),
            "date" => Ok(Self::Date),
            _ => Err(ParseCellFormatError(s.to_string())),
        }
    }
}

/// Preferred column width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnWidth {
    /// Fixed width in pixels (or terminal cells for text renderers).
    Fixed(u16),
    /// Share of the table width.
    Percent(u8),
}

impl fmt::Display for ColumnWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(px) => write!(f, "{}px", px),
            Self::Percent(pct) => write!(f, "{}%", pct),
        }
    }
}

/// Callback invoked with the row an action was triggered on.
pub type ActionHandler = Arc<dyn Fn(&Row) + Send + Sync>;

/// Renders the content of a template cell from its row.
pub type CellRenderer = Arc<dyn Fn(&Row) -> String + Send + Sync>;

/// A per-row action such as "Edit" or "Delete".
///
/// The handler receives the row data as an argument.
#[derive(Clone)]
pub struct RowAction {
    label: String,
    handler: ActionHandler,
}

impl RowAction {
    /// Creates an action.
    pub fn new(label: impl Into<String>, handler: impl Fn(&Row) + Send + Sync + 'static) -> Self {
        Self {
            label: label.into(),
            handler: Arc::new(handler),
        }
    }

    /// Returns the action label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Runs the handler for `row`.
    pub fn invoke(&self, row: &Row) {
        (self.handler)(row);
    }
}

impl fmt::Debug for RowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowAction")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// A column showing one field of the row.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyColumn {
    /// Header text.
    pub title: String,
    /// Field of the row to display.
    pub data_key: String,
    /// Optional display transformation.
    pub format: Option<CellFormat>,
    /// Optional preferred width.
    pub width: Option<ColumnWidth>,
}

impl PropertyColumn {
    /// Creates a property column.
    pub fn new(title: impl Into<String>, data_key: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            data_key: data_key.into(),
            format: None,
            width: None,
        }
    }

    /// Sets the display format.
    pub fn format(mut self, format: CellFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Sets the preferred width.
    pub fn width(mut self, width: ColumnWidth) -> Self {
        self.width = Some(width);
        self
    }

    /// Text for this column's cell. Missing rows and missing or null fields
    /// render as [`PLACEHOLDER`].
    pub fn cell(&self, row: Option<&Row>) -> String {
        format_value(row.and_then(|row| row.get(&self.data_key)), self.format)
    }
}

/// A column rendered by caller code, optionally carrying row actions.
#[derive(Clone)]
pub struct TemplateColumn {
    /// Header text.
    pub title: String,
    /// Optional preferred width.
    pub width: Option<ColumnWidth>,
    render: Option<CellRenderer>,
    actions: Vec<RowAction>,
}

impl TemplateColumn {
    /// Creates a template column with no renderer and no actions.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            width: None,
            render: None,
            actions: Vec::new(),
        }
    }

    /// Sets the cell renderer.
    pub fn render(mut self, render: impl Fn(&Row) -> String + Send + Sync + 'static) -> Self {
        self.render = Some(Arc::new(render));
        self
    }

    /// Adds a row action.
    pub fn action(
        mut self,
        label: impl Into<String>,
        handler: impl Fn(&Row) + Send + Sync + 'static,
    ) -> Self {
        self.actions.push(RowAction::new(label, handler));
        self
    }

    /// Sets the preferred width.
    pub fn width(mut self, width: ColumnWidth) -> Self {
        self.width = Some(width);
        self
    }

    /// Returns the row actions.
    pub fn actions(&self) -> &[RowAction] {
        &self.actions
    }

    /// Text for this column's cell.
    ///
    /// Uses the renderer if set, otherwise lists the action labels.
    pub fn cell(&self, row: Option<&Row>) -> String {
        let Some(row) = row else {
            return PLACEHOLDER.to_string();
        };
        match &self.render {
            Some(render) => render(row),
            None => self
                .actions
                .iter()
                .map(|action| format!("[{}]", action.label))
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

impl fmt::Debug for TemplateColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateColumn")
            .field("title", &self.title)
            .field("width", &self.width)
            .field("has_render", &self.render.is_some())
            .field("actions", &self.actions)
            .finish()
    }
}

/// A column declaration.
///
/// # Example
///
/// ```
/// use vgrid_lib::column::{CellFormat, Column};
///
/// let columns: Vec<Column> = vec![
///     Column::property("Name", "name").into(),
///     Column::property("Created Date", "createdAt").format(CellFormat::Date).into(),
///     Column::template("Actions")
///         .action("Edit", |row| println!("edit {:?}", row.get("id")))
///         .into(),
/// ];
/// assert_eq!(columns[1].title(), "Created Date");
/// ```
#[derive(Debug, Clone)]
pub enum Column {
    /// Shows one field of the row.
    Property(PropertyColumn),
    /// Rendered by caller code.
    Template(TemplateColumn),
}

impl Column {
    /// Starts a property column.
    pub fn property(title: impl Into<String>, data_key: impl Into<String>) -> PropertyColumn {
        PropertyColumn::new(title, data_key)
    }

    /// Starts a template column.
    pub fn template(title: impl Into<String>) -> TemplateColumn {
        TemplateColumn::new(title)
    }

    /// Header text.
    pub fn title(&self) -> &str {
        match self {
            Self::Property(column) => &column.title,
            Self::Template(column) => &column.title,
        }
    }

    /// Preferred width.
    pub fn width(&self) -> Option<ColumnWidth> {
        match self {
            Self::Property(column) => column.width,
            Self::Template(column) => column.width,
        }
    }

    /// Row actions (always empty for property columns).
    pub fn actions(&self) -> &[RowAction] {
        match self {
            Self::Property(_) => &[],
            Self::Template(column) => column.actions(),
        }
    }

    /// Text for this column's cell.
    pub fn cell(&self, row: Option<&Row>) -> String {
        match self {
            Self::Property(column) => column.cell(row),
            Self::Template(column) => column.cell(row),
        }
    }
}

impl From<PropertyColumn> for Column {
    fn from(column: PropertyColumn) -> Self {
        Self::Property(column)
    }
}

impl From<TemplateColumn> for Column {
    fn from(column: TemplateColumn) -> Self {
        Self::Template(column)
    }
}

/// Formats a field value for display.
pub fn format_value(value: Option<&Value>, format: Option<CellFormat>) -> String {
    let Some(value) = value.filter(|value| !value.is_null()) else {
        return PLACEHOLDER.to_string();
    };

    match format {
        None => display_value(value),
        Some(CellFormat::Uppercase) => display_value(value).to_uppercase(),
        Some(CellFormat::Lowercase) => display_value(value).to_lowercase(),
        Some(CellFormat::Date) => format_date(value).unwrap_or_else(|| display_value(value)),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn format_date(value: &Value) -> Option<String> {
    let datetime = match value {
        Value::String(s) => parse_datetime(s.trim())?,
        Value::Number(n) => DateTime::from_timestamp_millis(n.as_i64()?)?.naive_utc(),
        _ => return None,
    };
    Some(datetime.format(DATE_FORMAT).to_string())
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(s) {
        return Some(datetime.naive_utc());
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(s, format) {
            return Some(datetime);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}
