//! Chart-encoding inference from the shape of a result set.

use crate::value::Row;
use serde::Serialize;

/// The (x-axis, y-axis) column pair inferred from a result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartEncoding {
    pub x_key: Option<String>,
    pub y_key: Option<String>,
}

impl ChartEncoding {
    /// A chart is worth drawing only when a numeric y column exists.
    pub fn is_presentable(&self) -> bool {
        self.y_key.is_some()
    }
}

/// First-row-defines-the-schema heuristic.
///
/// Inspects only the first row, in its natural key order: `x_key` is the
/// first text-typed column (falling back to the first column regardless of
/// type), `y_key` the first number-typed column, unset if there is none.
/// Column typing is assumed homogeneous across rows and not verified.
/// Returns `None` on empty input; callers must guard.
pub fn first_row_encoding(rows: &[Row]) -> Option<ChartEncoding> {
    let first = rows.first()?;

    let x_key = first
        .iter()
        .find(|(_, v)| v.is_text())
        .map(|(k, _)| k.to_string())
        .or_else(|| first.keys().next().map(str::to_string));

    let y_key = first
        .iter()
        .find(|(_, v)| v.is_number())
        .map(|(k, _)| k.to_string());

    Some(ChartEncoding { x_key, y_key })
}
