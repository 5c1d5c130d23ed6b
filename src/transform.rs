//! Reshape raw GraphQL `data` into a tabular [`Frame`].

use crate::catalog;
use crate::error::{Result, SanError};
use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde_json::{Map, Value};

/// Column-ordered table of JSON values; `datetime` leads when present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Frame {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let i = self.column_index(name)?;
        Some(self.rows.iter().filter_map(|r| r.get(i)).collect())
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let i = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(i))
    }

    /// Build a frame from records. Non-object records land in a `value` column.
    pub fn from_records(records: Vec<Value>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        let objects: Vec<Map<String, Value>> = records
            .into_iter()
            .map(|rec| match rec {
                Value::Object(m) => m,
                other => {
                    let mut m = Map::new();
                    m.insert("value".to_string(), other);
                    m
                }
            })
            .collect();
        for obj in &objects {
            for key in obj.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
        if let Some(pos) = columns.iter().position(|c| c == "datetime") {
            let dt = columns.remove(pos);
            columns.insert(0, dt);
        }
        let rows = objects
            .into_iter()
            .map(|mut obj| {
                columns
                    .iter()
                    .map(|c| obj.remove(c).unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        Frame { columns, rows }
    }

    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        let header: Vec<String> = self.columns.iter().map(|c| csv_field(c)).collect();
        out.push_str(&header.join(","));
        out.push('\n');
        for row in &self.rows {
            let cells: Vec<String> = row
                .iter()
                .map(|v| match v {
                    Value::Null => String::new(),
                    Value::String(s) => csv_field(s),
                    other => csv_field(&other.to_string()),
                })
                .collect();
            out.push_str(&cells.join(","));
            out.push('\n');
        }
        out
    }
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

impl Serialize for Frame {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let records = self.to_records();
        let mut seq = serializer.serialize_seq(Some(records.len()))?;
        for rec in &records {
            seq.serialize_element(rec)?;
        }
        seq.end()
    }
}

// One row per element of `field`, each carrying the parent's other columns.
fn explode(records: Vec<Value>, field: &str) -> Vec<Value> {
    let mut out = Vec::new();
    for rec in records {
        let mut parent = match rec {
            Value::Object(m) => m,
            other => {
                out.push(other);
                continue;
            }
        };
        let Some(Value::Array(children)) = parent.remove(field) else {
            out.push(Value::Object(parent));
            continue;
        };
        for child in children {
            let mut row = parent.clone();
            match child {
                Value::Object(fields) => row.extend(fields),
                other => {
                    row.insert(field.to_string(), other);
                }
            }
            out.push(Value::Object(row));
        }
    }
    out
}

/// Turn the `query_{idx}` entry of a response into a frame.
///
/// `getMetric` results are unwrapped from `timeseriesData`; metrics with a
/// nested list in the mapping table are exploded into one row per element.
pub fn transform_query_result(idx: usize, metric: &str, data: &Value) -> Result<Frame> {
    let key = format!("query_{}", idx);
    let raw = data.get(&key).ok_or(SanError::UnexpectedResponse)?;
    let raw = match raw.get("timeseriesData") {
        Some(series) => series,
        None => raw,
    };
    let records = match raw {
        Value::Array(items) => items.clone(),
        Value::Null => Vec::new(),
        other => vec![other.clone()],
    };
    let records = match catalog::explode_field(metric) {
        Some(field) => explode(records, field),
        None => records,
    };
    Ok(Frame::from_records(records))
}
