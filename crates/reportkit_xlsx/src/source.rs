//! Row source collaborators: data sources, result sets and loaders.

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::{AnyValue, DataFrame};
use rusqlite::Connection;
use rusqlite::types::ValueRef;

use crate::error::ReportError;
use crate::order::KeyedRowSource;
use crate::spec::{EnumRawValue, EnumTypedValue};

////////////////////////////////////////////////////////////////////////////////
// #region RowTraits

/// Structured record whose fields map 1:1 onto the report columns.
pub trait ReportRecord {
    /// Field values in declaration order.
    fn cells(&self) -> Vec<EnumTypedValue>;
}

/// Caller-supplied loader that fills a keyed row collection.
///
/// The engine calls [`Self::load_rows`] exactly once per sheet and drops the
/// result set right after.
pub trait ReportData {
    /// Populate the collection from one query result.
    fn load_rows(&mut self, result_set: SpecResultSet) -> Result<(), ReportError>;

    /// The loaded collection.
    fn keyed_rows(&self) -> &dyn KeyedRowSource;
}

/// Query-executing data source.
pub trait DataSource {
    /// Execute `query` and fetch its full result.
    fn query(&self, query: &str) -> Result<SpecResultSet, ReportError>;
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ResultSet

/// Fetched loosely-typed query result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecResultSet {
    /// Column names in result order.
    pub columns: Vec<String>,
    /// Row values aligned with `columns`.
    pub rows: Vec<Vec<EnumRawValue>>,
}

impl SpecResultSet {
    /// Position of column `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c_name| c_name == name)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the result has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SqliteSource

const TUP_SQL_DECL_TIMESTAMP: [&str; 3] = ["DATE", "DATETIME", "TIMESTAMP"];
const TUP_TIMESTAMP_LAYOUTS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// SQLite-backed data source.
pub struct SqliteSource {
    conn: Connection,
}

impl SqliteSource {
    /// Open a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, ReportError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Wrap an existing connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl DataSource for SqliteSource {
    fn query(&self, query: &str) -> Result<SpecResultSet, ReportError> {
        let mut stmt = self.conn.prepare(query)?;

        let l_columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(ToString::to_string)
            .collect();
        let l_if_timestamp_col: Vec<bool> = stmt
            .columns()
            .iter()
            .map(|col| col.decl_type().is_some_and(is_timestamp_decl_type))
            .collect();

        let mut l_rows = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut l_values = Vec::with_capacity(l_columns.len());
            for n_idx_col in 0..l_columns.len() {
                let value = derive_raw_value_from_value_ref(row.get_ref(n_idx_col)?);
                l_values.push(match value {
                    EnumRawValue::Text(val) if l_if_timestamp_col[n_idx_col] => {
                        parse_sql_timestamp(&val)
                            .map(EnumRawValue::Timestamp)
                            .unwrap_or(EnumRawValue::Text(val))
                    }
                    other => other,
                });
            }
            l_rows.push(l_values);
        }

        Ok(SpecResultSet {
            columns: l_columns,
            rows: l_rows,
        })
    }
}

fn is_timestamp_decl_type(decl_type: &str) -> bool {
    let c_decl = decl_type.trim().to_ascii_uppercase();
    TUP_SQL_DECL_TIMESTAMP.contains(&c_decl.as_str())
}

fn derive_raw_value_from_value_ref(value: ValueRef<'_>) -> EnumRawValue {
    match value {
        ValueRef::Null => EnumRawValue::Null,
        ValueRef::Integer(val) => EnumRawValue::Integer(val),
        ValueRef::Real(val) => EnumRawValue::Real(val),
        ValueRef::Text(val) => EnumRawValue::Text(String::from_utf8_lossy(val).into_owned()),
        ValueRef::Blob(val) => EnumRawValue::Blob(val.to_vec()),
    }
}

/// Parse the timestamp layouts SQLite date functions produce.
pub fn parse_sql_timestamp(text: &str) -> Option<NaiveDateTime> {
    let c_text = text.trim();
    for c_layout in TUP_TIMESTAMP_LAYOUTS {
        if let Ok(val) = NaiveDateTime::parse_from_str(c_text, c_layout) {
            return Some(val);
        }
    }
    NaiveDate::parse_from_str(c_text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DataFrameSource

/// Read a DataFrame as a fetched loosely-typed result set.
pub fn derive_result_set_from_dataframe(df: &DataFrame) -> Result<SpecResultSet, ReportError> {
    let l_columns: Vec<String> = df
        .get_column_names_str()
        .into_iter()
        .map(ToString::to_string)
        .collect();
    let l_cols = df.get_columns();

    let mut l_rows = Vec::with_capacity(df.height());
    for n_idx_row in 0..df.height() {
        let mut l_values = Vec::with_capacity(l_cols.len());
        for col in l_cols {
            l_values.push(derive_raw_value_from_any_value(col.get(n_idx_row)?));
        }
        l_rows.push(l_values);
    }

    Ok(SpecResultSet {
        columns: l_columns,
        rows: l_rows,
    })
}

fn derive_raw_value_from_any_value(value: AnyValue<'_>) -> EnumRawValue {
    match value {
        AnyValue::Null => EnumRawValue::Null,
        AnyValue::Boolean(val) => EnumRawValue::Boolean(val),
        AnyValue::String(val) => EnumRawValue::Text(val.to_string()),
        AnyValue::StringOwned(val) => EnumRawValue::Text(val.to_string()),
        AnyValue::UInt8(val) => EnumRawValue::Integer(i64::from(val)),
        AnyValue::UInt16(val) => EnumRawValue::Integer(i64::from(val)),
        AnyValue::UInt32(val) => EnumRawValue::Integer(i64::from(val)),
        AnyValue::UInt64(val) => match i64::try_from(val) {
            Ok(val) => EnumRawValue::Integer(val),
            Err(_) => EnumRawValue::Real(val as f64),
        },
        AnyValue::Int8(val) => EnumRawValue::Integer(i64::from(val)),
        AnyValue::Int16(val) => EnumRawValue::Integer(i64::from(val)),
        AnyValue::Int32(val) => EnumRawValue::Integer(i64::from(val)),
        AnyValue::Int64(val) => EnumRawValue::Integer(val),
        AnyValue::Int128(val) => match i64::try_from(val) {
            Ok(val) => EnumRawValue::Integer(val),
            Err(_) => EnumRawValue::Real(val as f64),
        },
        AnyValue::Float32(val) => EnumRawValue::Real(f64::from(val)),
        AnyValue::Float64(val) => EnumRawValue::Real(val),
        _ => EnumRawValue::Text(value.to_string()),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use polars::prelude::{Column, NamedFrom};

    use super::*;

    fn create_customer_db() -> SqliteSource {
        let source = SqliteSource::open_in_memory().unwrap();
        source
            .connection()
            .execute_batch(
                "CREATE TABLE customer (
                    created DATETIME,
                    name TEXT,
                    number INTEGER,
                    balance REAL,
                    note BLOB
                );
                INSERT INTO customer VALUES ('2024-01-15 08:30:00', 'Ada', 7, 12.5, NULL);
                INSERT INTO customer VALUES ('not a date', 'Bob', 3, 99.0, x'00ff');",
            )
            .unwrap();
        source
    }

    #[test]
    fn test_sqlite_query_maps_value_kinds() {
        let source = create_customer_db();
        let result_set = source
            .query("SELECT created, name, number, balance, note FROM customer ORDER BY number DESC")
            .unwrap();

        assert_eq!(
            result_set.columns,
            vec!["created", "name", "number", "balance", "note"]
        );
        assert_eq!(result_set.len(), 2);

        let created = parse_sql_timestamp("2024-01-15 08:30:00").unwrap();
        assert_eq!(
            result_set.rows[0],
            vec![
                EnumRawValue::Timestamp(created),
                EnumRawValue::Text("Ada".to_string()),
                EnumRawValue::Integer(7),
                EnumRawValue::Real(12.5),
                EnumRawValue::Null,
            ]
        );
        assert_eq!(
            result_set.rows[1][0],
            EnumRawValue::Text("not a date".to_string())
        );
        assert_eq!(result_set.rows[1][4], EnumRawValue::Blob(vec![0x00, 0xff]));
    }

    #[test]
    fn test_sqlite_query_error_is_surfaced() {
        let source = create_customer_db();
        assert!(matches!(
            source.query("SELECT * FROM missing_table"),
            Err(ReportError::Sqlite(_))
        ));
    }

    #[test]
    fn test_parse_sql_timestamp_layouts() {
        assert!(parse_sql_timestamp("2024-01-15").is_some());
        assert!(parse_sql_timestamp("2024-01-15T08:30:00.250").is_some());
        assert!(parse_sql_timestamp("2024-01-15 08:30").is_some());
        assert!(parse_sql_timestamp("15/01/2024").is_none());
    }

    #[test]
    fn test_any_value_integers_of_every_width_map_to_integer() {
        assert_eq!(
            derive_raw_value_from_any_value(AnyValue::Int8(-5)),
            EnumRawValue::Integer(-5)
        );
        assert_eq!(
            derive_raw_value_from_any_value(AnyValue::Int16(-300)),
            EnumRawValue::Integer(-300)
        );
        assert_eq!(
            derive_raw_value_from_any_value(AnyValue::UInt8(200)),
            EnumRawValue::Integer(200)
        );
        assert_eq!(
            derive_raw_value_from_any_value(AnyValue::UInt16(60_000)),
            EnumRawValue::Integer(60_000)
        );
        assert_eq!(
            derive_raw_value_from_any_value(AnyValue::Int128(-7)),
            EnumRawValue::Integer(-7)
        );
        assert_eq!(
            derive_raw_value_from_any_value(AnyValue::Int128(i128::MAX)),
            EnumRawValue::Real(i128::MAX as f64)
        );
    }

    #[test]
    fn test_sqlite_source_opens_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.db");
        {
            let source = SqliteSource::open(&path).unwrap();
            source
                .connection()
                .execute_batch("CREATE TABLE t (v INTEGER); INSERT INTO t VALUES (11);")
                .unwrap();
        }

        let source = SqliteSource::open(&path).unwrap();
        let result_set = source.query("SELECT v FROM t").unwrap();
        assert_eq!(result_set.rows, vec![vec![EnumRawValue::Integer(11)]]);
    }

    #[test]
    fn test_dataframe_result_set() {
        let df = DataFrame::new(vec![
            Column::new("name".into(), &["a", "b"]),
            Column::new("qty".into(), &[1i64, 2]),
            Column::new("price".into(), &[0.5f64, 1.5]),
        ])
        .unwrap();

        let result_set = derive_result_set_from_dataframe(&df).unwrap();
        assert_eq!(result_set.columns, vec!["name", "qty", "price"]);
        assert_eq!(
            result_set.rows[1],
            vec![
                EnumRawValue::Text("b".to_string()),
                EnumRawValue::Integer(2),
                EnumRawValue::Real(1.5),
            ]
        );
        assert_eq!(result_set.column_index("price"), Some(2));
    }
}
