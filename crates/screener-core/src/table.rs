//! Column-named tabular data shared by the pipeline stages, the CSV store and
//! the dashboard.
//!
//! Cells are optional text: `None` is an unknown value and is written as an
//! empty CSV cell. Typed records convert into a `Table` through [`TableRecord`].

use serde::Serialize;
use serde_json::{Map, Value};

use crate::numeric::parse_f64;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

/// Borrowed view of one row with by-name access.
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    table: &'a Table,
    cells: &'a [Option<String>],
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn from_records<T: TableRecord>(records: &[T]) -> Self {
        let mut table = Table::new(T::headers().iter().copied());
        for record in records {
            table.push_row(record.cells());
        }
        table
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Append a row, padding or truncating it to the header width.
    pub fn push_row(&mut self, mut cells: Vec<Option<String>>) {
        cells.resize(self.headers.len(), None);
        self.rows.push(cells);
    }

    /// Append a column filled from `values`; missing trailing values are unknown.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<Option<String>>) {
        self.headers.push(name.into());
        let mut values = values.into_iter();
        for row in &mut self.rows {
            row.push(values.next().flatten());
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = RowRef<'_>> + '_ {
        self.rows.iter().map(move |cells| RowRef { table: self, cells })
    }

    pub fn row(&self, index: usize) -> Option<RowRef<'_>> {
        self.rows.get(index).map(|cells| RowRef { table: self, cells })
    }

    /// Keep only the rows matching `keep`, preserving order.
    pub fn filter<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&RowRef<'_>) -> bool,
    {
        let rows = self
            .rows()
            .filter(|r| keep(r))
            .map(|r| r.cells.to_vec())
            .collect();
        Table {
            headers: self.headers.clone(),
            rows,
        }
    }

    /// Non-empty values of one column, in row order.
    pub fn column_values(&self, name: &str) -> Vec<&str> {
        match self.column_index(name) {
            Some(i) => self.rows.iter().filter_map(|r| r[i].as_deref()).collect(),
            None => Vec::new(),
        }
    }

    pub fn to_json_rows(&self) -> Vec<Value> {
        self.rows().map(|r| r.to_json()).collect()
    }
}

impl<'a> RowRef<'a> {
    pub fn get(&self, column: &str) -> Option<&'a str> {
        self.table
            .column_index(column)
            .and_then(|i| self.cells[i].as_deref())
    }

    pub fn get_f64(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(parse_f64)
    }

    pub fn cells(&self) -> &'a [Option<String>] {
        self.cells
    }

    /// Cells as a JSON object. Numeric text becomes a JSON number and
    /// `true`/`false` a boolean; zero-padded identifiers stay text.
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        for (header, cell) in self.table.headers.iter().zip(self.cells) {
            let value = match cell.as_deref() {
                None => Value::Null,
                Some(text) => cell_to_json(text),
            };
            obj.insert(header.clone(), value);
        }
        Value::Object(obj)
    }
}

fn cell_to_json(text: &str) -> Value {
    match text {
        "true" | "True" => return Value::Bool(true),
        "false" | "False" => return Value::Bool(false),
        _ => {}
    }
    let zero_padded = text.len() > 1 && text.starts_with('0') && !text.starts_with("0.");
    if !zero_padded {
        if let Some(n) = parse_f64(text).and_then(serde_json::Number::from_f64) {
            return Value::Number(n);
        }
    }
    Value::String(text.to_string())
}

/// A typed record with a fixed column layout.
pub trait TableRecord {
    fn headers() -> &'static [&'static str];
    fn cells(&self) -> Vec<Option<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut t = Table::new(["ticker", "price", "sector"]);
        t.push_row(vec![Some("AAA".into()), Some("10.5".into()), Some("Technology".into())]);
        t.push_row(vec![Some("BBB".into()), None]);
        t
    }

    #[test]
    fn test_short_rows_are_padded() {
        let t = sample();
        let row = t.row(1).unwrap();
        assert_eq!(row.get("ticker"), Some("BBB"));
        assert_eq!(row.get("sector"), None);
        assert_eq!(row.cells().len(), 3);
    }

    #[test]
    fn test_filter_and_column_values() {
        let t = sample().filter(|r| r.get_f64("price").is_some());
        assert_eq!(t.len(), 1);
        assert_eq!(sample().column_values("sector"), vec!["Technology"]);
    }

    #[test]
    fn test_push_column() {
        let mut t = sample();
        t.push_column("flag", vec![Some("green".into())]);
        assert_eq!(t.row(0).unwrap().get("flag"), Some("green"));
        assert_eq!(t.row(1).unwrap().get("flag"), None);
    }

    #[test]
    fn test_to_json_types_numbers() {
        let json = sample().row(0).unwrap().to_json();
        assert_eq!(json["price"], serde_json::json!(10.5));
        assert_eq!(json["ticker"], serde_json::json!("AAA"));
        assert!(sample().row(1).unwrap().to_json()["sector"].is_null());
    }

    #[test]
    fn test_to_json_keeps_identifiers_and_flags() {
        let mut t = Table::new(["cik", "qoq", "zero", "ratio"]);
        t.push_row(vec![
            Some("0000320193".into()),
            Some("true".into()),
            Some("0".into()),
            Some("0.5".into()),
        ]);
        let json = t.row(0).unwrap().to_json();
        assert_eq!(json["cik"], serde_json::json!("0000320193"));
        assert_eq!(json["qoq"], serde_json::json!(true));
        assert_eq!(json["zero"], serde_json::json!(0.0));
        assert_eq!(json["ratio"], serde_json::json!(0.5));
    }
}
