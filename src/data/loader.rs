use crate::data::{FeatureTable, FIRST_TABLE, METADATA_COLUMNS, SECOND_TABLE};
use crate::error::{Error, Result};
use ndarray::{concatenate, Array2, Axis};
use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use tracing::{debug, info};

/// Rows of one table as returned by SQLite, with the column names
#[derive(Debug, Clone)]
struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

/// Reads the QC metrics store
#[derive(Debug, Clone, Copy, Default)]
pub struct DataLoader;

impl DataLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load both QC tables and merge them into one feature table.
    ///
    /// The store is opened read-only so a wrong path fails instead of
    /// creating an empty database.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<FeatureTable> {
        let path = path.as_ref();
        info!("Loading QC metrics from {:?}", path);

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| connection_error(path, e))?;

        let first = fetch_table(&conn, FIRST_TABLE)
            .map_err(|e| connection_error(path, e))?;
        let second = fetch_table(&conn, SECOND_TABLE)
            .map_err(|e| connection_error(path, e))?;
        drop(conn);

        debug!(
            "{}: {} rows x {} columns, {}: {} rows x {} columns",
            FIRST_TABLE,
            first.rows.len(),
            first.columns.len(),
            SECOND_TABLE,
            second.rows.len(),
            second.columns.len()
        );

        let table = merge(first, second)?;
        info!(
            "Loaded {} runs with {} numeric features",
            table.n_samples(),
            table.n_features()
        );
        Ok(table)
    }
}

/// Split metadata off the first table and stack both numeric blocks
fn merge(first: RawTable, second: RawTable) -> Result<FeatureTable> {
    let skip = METADATA_COLUMNS;
    for (name, table) in [
        (FIRST_TABLE, &first),
        (SECOND_TABLE, &second),
    ] {
        if table.columns.len() < skip {
            return Err(Error::shape(format!(
                "table '{}' has {} columns, expected at least {}",
                name,
                table.columns.len(),
                skip
            )));
        }
    }
    if first.rows.len() != second.rows.len() {
        return Err(Error::shape(format!(
            "'{}' has {} rows but '{}' has {}",
            FIRST_TABLE,
            first.rows.len(),
            SECOND_TABLE,
            second.rows.len()
        )));
    }

    let n_rows = first.rows.len();
    let meta_cells: Vec<String> = first
        .rows
        .iter()
        .flat_map(|row| row[..skip].iter().map(render_meta))
        .collect();
    let meta = Array2::from_shape_vec((n_rows, skip), meta_cells)
        .map_err(|e| Error::shape(e.to_string()))?;

    let numeric_1 = numeric_block(&first, skip)?;
    let numeric_2 = numeric_block(&second, skip)?;
    let features = concatenate(Axis(1), &[numeric_1.view(), numeric_2.view()])
        .map_err(|e| Error::shape(e.to_string()))?;

    let mut names = first.columns;
    names.extend(second.columns.into_iter().skip(skip));

    Ok(FeatureTable {
        meta,
        features,
        names,
    })
}

fn connection_error(path: &Path, err: rusqlite::Error) -> Error {
    Error::Connection {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

/// Fetch every row of a table together with its column names
fn fetch_table(conn: &Connection, table: &str) -> rusqlite::Result<RawTable> {
    let mut stmt = conn.prepare(&format!("SELECT * FROM \"{}\"", table.replace('"', "\"\"")))?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = columns.len();

    let rows = stmt
        .query_map([], |row| {
            (0..width)
                .map(|i| row.get::<_, Value>(i))
                .collect::<rusqlite::Result<Vec<_>>>()
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(RawTable { columns, rows })
}

/// Cast every column after the first `skip` ones to `f64`
fn numeric_block(table: &RawTable, skip: usize) -> Result<Array2<f64>> {
    let width = table.columns.len() - skip;
    let mut values = Vec::with_capacity(table.rows.len() * width);

    for (row_idx, row) in table.rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate().skip(skip) {
            values.push(to_f64(value).ok_or_else(|| Error::Conversion {
                column: table.columns[col_idx].clone(),
                row: row_idx,
                value: render_meta(value),
            })?);
        }
    }

    Array2::from_shape_vec((table.rows.len(), width), values)
        .map_err(|e| Error::shape(e.to_string()))
}

/// NULL becomes NaN; text must parse as a float
fn to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(f64::NAN),
        Value::Integer(i) => Some(*i as f64),
        Value::Real(r) => Some(*r),
        Value::Text(s) => s.trim().parse::<f64>().ok(),
        Value::Blob(_) => None,
    }
}

fn render_meta(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(i) => i.to_string(),
        Value::Real(r) => r.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => format!("<blob {} bytes>", b.len()),
    }
}
