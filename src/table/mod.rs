//! In-memory grid over loosely-typed records: column derivation, single-column sort,
//! free-text filter and fixed-size pagination.
//!
//! A [`Table`] is rebuilt from each snapshot and precomputes, per row, the lowercased
//! union of its visible cell values so filtering is a substring scan.

pub mod control;
pub mod live;

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

pub type Record = serde_json::Map<String, Value>;

const CELL_SEPARATOR: char = '\u{1f}';

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Column {
    pub key: String,
    pub header: String,
}

/// Which record keys stay out of the grid, and which headers differ from the key.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub hidden: &'static [&'static str],
    pub headers: &'static [(&'static str, &'static str)],
}

impl ColumnSpec {
    pub const fn open() -> Self {
        Self {
            hidden: &[],
            headers: &[],
        }
    }

    fn header_for(&self, key: &str) -> String {
        self.headers
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, header)| (*header).to_string())
            .unwrap_or_else(|| key.replace('_', " ").to_uppercase())
    }
}

/// Field-order record of any serializable struct; non-object values give an empty record.
pub fn to_record<T: Serialize>(value: &T) -> Record {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        Ok(_) => Record::new(),
        Err(err) => {
            tracing::warn!(error = %err, "record serialization failed");
            Record::new()
        }
    }
}

/// Columns come from the first record's keys, in key order.
pub fn derive_columns(records: &[Record], spec: &ColumnSpec) -> Vec<Column> {
    let Some(first) = records.first() else {
        return Vec::new();
    };
    first
        .keys()
        .filter(|key| !spec.hidden.contains(&key.as_str()))
        .map(|key| Column {
            key: key.clone(),
            header: spec.header_for(key),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SortBy {
    pub key: String,
    pub direction: SortDirection,
}

/// Rows per page; only 5, 10 and 20 are offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "usize", into = "usize")]
pub struct PageSize(usize);

impl PageSize {
    pub const OPTIONS: [usize; 3] = [5, 10, 20];

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize(10)
    }
}

impl TryFrom<usize> for PageSize {
    type Error = String;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        if PageSize::OPTIONS.contains(&value) {
            Ok(PageSize(value))
        } else {
            Err(format!("page size must be one of 5, 10, 20 (got {value})"))
        }
    }
}

impl From<PageSize> for usize {
    fn from(size: PageSize) -> usize {
        size.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PageNav {
    First,
    Previous,
    Next,
    Last,
}

/// Sort, filter and page position of one grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableState {
    pub sort: Option<SortBy>,
    pub filter: String,
    pub page_index: usize,
    pub page_size: PageSize,
}

impl TableState {
    /// Unsorted or another column -> ascending; same column flips direction.
    pub fn toggle_sort(&mut self, key: &str) {
        self.sort = Some(match self.sort.take() {
            Some(SortBy { key: current, direction }) if current == key => SortBy {
                key: current,
                direction: match direction {
                    SortDirection::Asc => SortDirection::Desc,
                    SortDirection::Desc => SortDirection::Asc,
                },
            },
            _ => SortBy {
                key: key.to_string(),
                direction: SortDirection::Asc,
            },
        });
        self.page_index = 0;
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        let filter = filter.into();
        if filter != self.filter {
            self.filter = filter;
            self.page_index = 0;
        }
    }

    pub fn set_page_size(&mut self, size: PageSize) {
        self.page_size = size;
        self.page_index = 0;
    }

    pub fn navigate(&mut self, nav: PageNav, page_count: usize) {
        let last = page_count.max(1) - 1;
        self.page_index = match nav {
            PageNav::First => 0,
            PageNav::Previous => self.page_index.saturating_sub(1),
            PageNav::Next => (self.page_index + 1).min(last),
            PageNav::Last => last,
        };
    }
}

#[derive(Debug, Clone)]
struct Row {
    record: Record,
    haystack: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TablePage {
    pub columns: Vec<Column>,
    #[schema(value_type = Vec<Object>)]
    pub rows: Vec<Record>,
    pub sort: Option<SortBy>,
    pub filter: String,
    pub page_index: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub total_rows: usize,
    pub filtered_rows: usize,
    pub can_previous: bool,
    pub can_next: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(records: Vec<Record>, spec: &ColumnSpec) -> Self {
        let columns = derive_columns(&records, spec);
        let rows = records
            .into_iter()
            .map(|record| Row {
                haystack: haystack(&record, &columns),
                record,
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Filter, then sort, then slice the requested page. An out-of-range page index is
    /// clamped to the last page.
    pub fn view(&self, state: &TableState) -> TablePage {
        let needle = state.filter.trim().to_lowercase();
        let mut matched: Vec<&Row> = self
            .rows
            .iter()
            .filter(|row| needle.is_empty() || row.haystack.contains(&needle))
            .collect();

        if let Some(sort) = &state.sort {
            matched.sort_by(|a, b| {
                let ord = compare_values(
                    a.record.get(&sort.key).unwrap_or(&Value::Null),
                    b.record.get(&sort.key).unwrap_or(&Value::Null),
                );
                match sort.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }

        let page_size = state.page_size.get();
        let filtered_rows = matched.len();
        let page_count = filtered_rows.div_ceil(page_size).max(1);
        let page_index = state.page_index.min(page_count - 1);

        let rows = matched
            .into_iter()
            .skip(page_index * page_size)
            .take(page_size)
            .map(|row| row.record.clone())
            .collect();

        TablePage {
            columns: self.columns.clone(),
            rows,
            sort: state.sort.clone(),
            filter: state.filter.clone(),
            page_index,
            page_size,
            page_count,
            total_rows: self.rows.len(),
            filtered_rows,
            can_previous: page_index > 0,
            can_next: page_index + 1 < page_count,
        }
    }
}

fn haystack(record: &Record, columns: &[Column]) -> String {
    let mut out = String::new();
    for column in columns {
        if let Some(value) = record.get(&column.key) {
            if !out.is_empty() {
                out.push(CELL_SEPARATOR);
            }
            out.push_str(&cell_text(value).to_lowercase());
        }
    }
    out
}

/// Display text of a cell, as matched by the filter.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(cell_text).collect::<Vec<_>>().join(" "),
        Value::Object(_) => value.to_string(),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn as_datetime(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s).ok()
}

/// Natural ordering per value type: numbers numerically, RFC 3339 strings as instants,
/// other strings lexicographically. Mixed types order by type rank, nulls first.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => match (as_datetime(x), as_datetime(y)) {
            (Some(dx), Some(dy)) => dx.cmp(&dy),
            _ => x.cmp(y),
        },
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        _ if type_rank(a) == type_rank(b) => cell_text(a).cmp(&cell_text(b)),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
