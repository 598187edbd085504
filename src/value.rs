//! Row and cell types for schema-less result sets.
//!
//! Result sets come back as JSON objects with no declared schema. Cells are
//! modeled as a closed scalar variant so downstream branching (chart
//! inference, rendering) is exhaustive; anything non-scalar is rejected at
//! deserialization time rather than carried around as an open dynamic value.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A single cell of a result row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Null,
}

impl CellValue {
    pub fn is_text(&self) -> bool {
        matches!(self, CellValue::Text(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, CellValue::Number(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Null => write!(f, ""),
        }
    }
}

/// One result row: an ordered mapping of column name to cell value.
///
/// Key order is the JSON object's natural order, preserved on the way in.
/// The chart heuristic depends on it, so `Row` keeps its own entry list
/// instead of a hash map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row(Vec<(String, CellValue)>);

impl Row {
    pub fn new(entries: Vec<(String, CellValue)>) -> Self {
        Self(entries)
    }

    pub fn get(&self, name: &str) -> Option<&CellValue> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, CellValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, CellValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RowVisitor;

        impl<'de> Visitor<'de> for RowVisitor {
            type Value = Row;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of column name to scalar value")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Row, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, CellValue>()? {
                    entries.push((key, value));
                }
                Ok(Row(entries))
            }
        }

        deserializer.deserialize_map(RowVisitor)
    }
}

/// The column list plus row data returned by query execution.
///
/// Replaced wholesale per submission, never merged. Every row's key set is
/// assumed, not verified, to equal `columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl ResultSet {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_row(json: &str) -> Row {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn row_preserves_json_key_order() {
        let row = parse_row(r#"{"zeta": 1, "alpha": "x", "mid": null}"#);
        let keys: Vec<&str> = row.keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn scalar_values_decode_to_closed_variants() {
        let row = parse_row(r#"{"t": "a", "n": 2.5, "i": 7, "b": true, "z": null}"#);
        assert_eq!(row.get("t"), Some(&CellValue::Text("a".into())));
        assert_eq!(row.get("n"), Some(&CellValue::Number(2.5)));
        assert_eq!(row.get("i"), Some(&CellValue::Number(7.0)));
        assert_eq!(row.get("b"), Some(&CellValue::Bool(true)));
        assert_eq!(row.get("z"), Some(&CellValue::Null));
    }

    #[test]
    fn nested_values_are_rejected() {
        assert!(serde_json::from_str::<Row>(r#"{"bad": [1, 2]}"#).is_err());
        assert!(serde_json::from_str::<Row>(r#"{"bad": {"k": 1}}"#).is_err());
    }

    #[test]
    fn row_round_trips_in_order() {
        let row = parse_row(r#"{"b": 1, "a": "x"}"#);
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"b":1.0,"a":"x"}"#);
    }

    #[test]
    fn null_displays_as_empty() {
        assert_eq!(CellValue::Null.to_string(), "");
        assert_eq!(CellValue::Number(10.0).to_string(), "10");
    }
}
