use serde::Serialize;

/// A single cell. `None` is a null (absent) value.
pub type Cell = Option<String>;

/// Immutable, column-ordered dataset loaded from one artifact.
///
/// Cells keep their on-disk text so identifiers never lose leading zeros; typed
/// access goes through [`Row`]. Every transform returns a new `Table`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table, padding short rows with nulls and dropping surplus cells.
    pub fn from_rows(name: impl Into<String>, columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    /// Artifact name used in log lines and error messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        (index < self.rows.len()).then_some(Row { table: self, index })
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> + '_ {
        (0..self.rows.len()).map(move |index| Row { table: self, index })
    }

    /// All values of a column, or `None` when the column does not exist.
    pub fn column(&self, column: &str) -> Option<Vec<Option<&str>>> {
        let idx = self.column_index(column)?;
        Some(self.rows.iter().map(|row| row[idx].as_deref()).collect())
    }

    /// Fraction of non-null cells in a column. An empty table counts as complete.
    pub fn non_null_fraction(&self, column: &str) -> Option<f64> {
        let values = self.column(column)?;
        if values.is_empty() {
            return Some(1.0);
        }
        let present = values.iter().filter(|v| v.is_some()).count();
        Some(present as f64 / values.len() as f64)
    }

    pub fn filter_rows<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&Row<'_>) -> bool,
    {
        let rows = self
            .rows()
            .filter(|row| keep(row))
            .map(|row| self.rows[row.index].clone())
            .collect();
        Table {
            name: self.name.clone(),
            columns: self.columns.clone(),
            rows,
        }
    }

    /// New table whose rows are taken from `order`. Every index must be in range.
    pub(crate) fn reorder(&self, order: &[usize]) -> Table {
        let rows = order.iter().map(|&i| self.rows[i].clone()).collect();
        Table {
            name: self.name.clone(),
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Replace a column's values, appending the column when it does not exist.
    pub fn with_column(&self, column: &str, values: Vec<Cell>) -> Table {
        debug_assert_eq!(values.len(), self.rows.len(), "column length mismatch");
        let mut next = self.clone();
        let idx = match next.column_index(column) {
            Some(idx) => idx,
            None => {
                next.columns.push(column.to_string());
                for row in &mut next.rows {
                    row.push(None);
                }
                next.columns.len() - 1
            }
        };
        for (row, value) in next.rows.iter_mut().zip(values) {
            row[idx] = value;
        }
        next
    }

    /// Derive a column from each row.
    pub fn map_column<F>(&self, column: &str, mut derive: F) -> Table
    where
        F: FnMut(&Row<'_>) -> Cell,
    {
        let values = self.rows().map(|row| derive(&row)).collect();
        self.with_column(column, values)
    }

    /// Copy `from` into `to` when `to` is absent and `from` exists.
    pub fn with_alias(&self, from: &str, to: &str) -> Table {
        match self.column(from) {
            Some(values) if !self.has_column(to) => {
                let values = values.into_iter().map(|v| v.map(str::to_string)).collect();
                self.with_column(to, values)
            }
            _ => self.clone(),
        }
    }
}

/// Borrowed view of one row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> Row<'a> {
    /// Position of the row in its table.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = self.table.column_index(column)?;
        self.table.rows[self.index][idx].as_deref()
    }

    pub fn get_f64(&self, column: &str) -> Option<f64> {
        self.get(column)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }

    /// Integer value, accepting float text with no fractional part ("12.0").
    pub fn get_i64(&self, column: &str) -> Option<i64> {
        let raw = self.get(column)?.trim();
        raw.parse::<i64>().ok().or_else(|| {
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && v.fract() == 0.0)
                .map(|v| v as i64)
        })
    }

    pub fn get_bool(&self, column: &str) -> Option<bool> {
        self.get(column).and_then(parse_bool)
    }
}

pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "1.0" | "yes" | "y" | "t" => Some(true),
        "false" | "0" | "0.0" | "no" | "n" | "f" => Some(false),
        _ => None,
    }
}
