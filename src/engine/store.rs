use crate::table::{Cell, ColumnType, Table};
use crate::{EtlError, EtlResult};
use rusqlite::types::{Null, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OpenFlags, ToSql, params_from_iter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

impl ToSql for Cell {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            _ if self.is_missing() => ToSqlOutput::from(Null),
            Cell::Int(v) => ToSqlOutput::from(*v),
            Cell::Float(f) => ToSqlOutput::from(*f),
            Cell::Text(s) => ToSqlOutput::from(s.as_str()),
            Cell::Missing => ToSqlOutput::from(Null),
        })
    }
}

/// Single-file SQLite database holding the cleaned churn table.
///
/// The store owns its connection for the whole run; dropping the store closes it.
pub struct ChurnStore {
    conn: Connection,
    path: PathBuf,
}

impl ChurnStore {
    /// Opens the database, creating the file if it does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> EtlResult<Self> {
        let path = path.as_ref().to_path_buf();
        info!(path = %path.display(), "Connecting to database");
        let conn = Connection::open(&path).map_err(|source| EtlError::Connection {
            path: path.clone(),
            source,
        })?;
        Ok(Self { conn, path })
    }

    /// Opens an existing database read-only. Never creates a file.
    pub fn open_existing<P: AsRef<Path>>(path: P) -> EtlResult<Self> {
        let path = path.as_ref().to_path_buf();
        info!(path = %path.display(), "Connecting to database");
        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| EtlError::Connection {
            path: path.clone(),
            source,
        })?;

        // a file that is not a database only fails on first read
        conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))
            .map_err(|source| EtlError::Connection {
                path: path.clone(),
                source,
            })?;

        Ok(Self { conn, path })
    }

    /// Drops `name` if present and recreates it holding exactly `table`'s rows.
    /// Runs in one transaction, so a failed load leaves the previous table in place.
    pub fn replace_table(&mut self, name: &str, table: &Table) -> EtlResult<usize> {
        let ident = table_identifier(name)?;
        let definitions: Vec<String> = table
            .columns()
            .iter()
            .zip(table.column_types())
            .map(|(column, ty)| -> EtlResult<String> {
                Ok(format!("{} {}", column_identifier(column)?, ty.sql_type()))
            })
            .collect::<EtlResult<_>>()?;
        if definitions.is_empty() {
            return Err(EtlError::NoColumns);
        }

        let tx = self.conn.transaction()?;
        tx.execute(&format!("DROP TABLE IF EXISTS {ident}"), [])?;
        tx.execute(
            &format!("CREATE TABLE {ident} ({})", definitions.join(", ")),
            [],
        )?;

        let mut written = 0;
        {
            let placeholders = vec!["?"; definitions.len()].join(", ");
            let mut stmt = tx.prepare(&format!("INSERT INTO {ident} VALUES ({placeholders})"))?;
            for row in table.rows() {
                stmt.execute(params_from_iter(row.iter()))?;
                written += 1;
            }
        }
        tx.commit()?;

        debug!(table = name, rows = written, "Replaced table");
        Ok(written)
    }

    /// Reads `name` with its column order intact. `limit` caps the rows returned.
    pub fn read_table(&self, name: &str, limit: Option<usize>) -> EtlResult<Table> {
        let ident = table_identifier(name)?;
        let sql = match limit {
            Some(n) => format!("SELECT * FROM {ident} LIMIT {n}"),
            None => format!("SELECT * FROM {ident}"),
        };

        let mut stmt = self.conn.prepare(&sql)?;
        let (columns, types): (Vec<String>, Vec<ColumnType>) = stmt
            .columns()
            .iter()
            .map(|c| (c.name().to_string(), ColumnType::from_sql_decl(c.decl_type())))
            .unzip();

        let mut table = Table::new(columns, types)?;
        let width = table.columns().len();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(width);
            for idx in 0..width {
                cells.push(match row.get_ref(idx)? {
                    ValueRef::Null => Cell::Missing,
                    ValueRef::Integer(v) => Cell::Int(v),
                    ValueRef::Real(f) => Cell::Float(f),
                    ValueRef::Text(t) | ValueRef::Blob(t) => {
                        Cell::Text(String::from_utf8_lossy(t).into_owned())
                    }
                });
            }
            table.push_row(cells)?;
        }

        Ok(table)
    }

    pub fn row_count(&self, name: &str) -> EtlResult<usize> {
        let ident = table_identifier(name)?;
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {ident}"), [], |row| row.get(0))?;
        Ok(count as usize)
    }

}

impl Drop for ChurnStore {
    fn drop(&mut self) {
        info!(path = %self.path.display(), "Database connection closed");
    }
}

fn table_identifier(name: &str) -> EtlResult<String> {
    if name.trim().is_empty() || name.contains('\0') {
        return Err(EtlError::InvalidTableName(name.to_string()));
    }
    Ok(quote_identifier(name))
}

fn column_identifier(name: &str) -> EtlResult<String> {
    if name.is_empty() || name.contains('\0') {
        return Err(EtlError::InvalidColumnName(name.to_string()));
    }
    Ok(quote_identifier(name))
}

// Double-quoted SQL identifier; embedded quotes are doubled.
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn churn_table() -> Table {
        let mut table = Table::new(
            vec![
                "CustomerID".into(),
                "Usage Frequency".into(),
                "Total Spend".into(),
                "Gender".into(),
            ],
            vec![ColumnType::Int, ColumnType::Int, ColumnType::Float, ColumnType::Text],
        )
        .unwrap();
        table
            .push_row(vec![Cell::Int(7), Cell::Int(5), Cell::Float(199.5), Cell::Text("Female".into())])
            .unwrap();
        table
            .push_row(vec![Cell::Int(8), Cell::Missing, Cell::Float(100.0), Cell::Text("Male".into())])
            .unwrap();
        table
    }

    #[test]
    fn test_replace_and_read_back() {
        let temp_dir = tempdir().unwrap();
        let mut store = ChurnStore::open(temp_dir.path().join("churn.db")).unwrap();

        let written = store.replace_table("ChurnData", &churn_table()).unwrap();
        assert_eq!(written, 2);

        let read = store.read_table("ChurnData", None).unwrap();
        assert_eq!(read, churn_table());
    }

    #[test]
    fn test_replace_is_total() {
        let temp_dir = tempdir().unwrap();
        let mut store = ChurnStore::open(temp_dir.path().join("churn.db")).unwrap();

        store.replace_table("ChurnData", &churn_table()).unwrap();
        store.replace_table("ChurnData", &churn_table()).unwrap();
        assert_eq!(store.row_count("ChurnData").unwrap(), 2);

        let smaller = churn_table().head(1);
        store.replace_table("ChurnData", &smaller).unwrap();
        assert_eq!(store.row_count("ChurnData").unwrap(), 1);
    }

    #[test]
    fn test_read_with_limit() {
        let temp_dir = tempdir().unwrap();
        let mut store = ChurnStore::open(temp_dir.path().join("churn.db")).unwrap();
        store.replace_table("ChurnData", &churn_table()).unwrap();

        let head = store.read_table("ChurnData", Some(1)).unwrap();
        assert_eq!(head.len(), 1);
        assert_eq!(head.columns()[1], "Usage Frequency");
    }

    #[test]
    fn test_open_existing_missing_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("absent.db");

        let err = match ChurnStore::open_existing(&path) {
            Err(e) => e,
            Ok(_) => panic!("Expected connection error"),
        };
        assert!(matches!(err, EtlError::Connection { .. }));
        assert!(err.to_string().contains("absent.db"));
        assert!(!path.exists());
    }

    #[test]
    fn test_open_existing_rejects_non_database() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("not_a.db");
        std::fs::write(&path, "CustomerID,Age\n1,2\n".repeat(50)).unwrap();

        assert!(matches!(
            ChurnStore::open_existing(&path),
            Err(EtlError::Connection { .. })
        ));
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("Total Spend"), "\"Total Spend\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
        assert!(matches!(table_identifier(" "), Err(EtlError::InvalidTableName(_))));
    }

    #[test]
    fn test_blank_column_name_is_a_column_error() {
        let temp_dir = tempdir().unwrap();
        let mut store = ChurnStore::open(temp_dir.path().join("churn.db")).unwrap();
        let table = Table::new(vec!["".into(), "Age".into()], vec![ColumnType::Int; 2]).unwrap();

        let err = store.replace_table("ChurnData", &table).unwrap_err();
        assert!(matches!(err, EtlError::InvalidColumnName(ref name) if name.is_empty()));
    }
}
