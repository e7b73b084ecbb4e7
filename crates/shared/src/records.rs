use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type Record = Map<String, Value>;

/// Ordered rows of flat column -> scalar mappings.
///
/// Rows are not required to share a key set; the column list is the union of
/// keys in first-seen order and must be re-read after every transformation.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct RecordSet {
    rows: Vec<Record>,
}

impl RecordSet {
    pub fn new(rows: Vec<Record>) -> Self {
        Self { rows }
    }

    /// Builds a record set from a JSON array of objects.
    pub fn from_value(value: &Value) -> anyhow::Result<Self> {
        let rows = value
            .as_array()
            .ok_or_else(|| anyhow::anyhow!("expected an array of records"))?
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row.as_object()
                    .cloned()
                    .ok_or_else(|| anyhow::anyhow!("record {} is not an object", i))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut Vec<Record> {
        &mut self.rows
    }

    pub fn into_rows(self) -> Vec<Record> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for row in &self.rows {
            for key in row.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
        columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.rows.iter().any(|row| row.contains_key(column))
    }

    /// Cell value, with a missing key read as null.
    pub fn cell<'a>(row: &'a Record, column: &str) -> &'a Value {
        row.get(column).unwrap_or(&Value::Null)
    }

    pub fn to_value(&self) -> Value {
        Value::Array(self.rows.iter().cloned().map(Value::Object).collect())
    }
}

/// Equality key for a cell. Numbers compare by value, so `1` and `1.0` match;
/// a string never matches a number.
pub fn value_key(value: &Value) -> String {
    match value {
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                (f as i64).to_string()
            }
            (_, _, Some(f)) => f.to_string(),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

impl From<Vec<Record>> for RecordSet {
    fn from(rows: Vec<Record>) -> Self {
        Self::new(rows)
    }
}
