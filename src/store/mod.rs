//! # SQLite Store
//!
//! Access to the browsed database file. Every operation opens its own
//! connection and drops it before returning; nothing is cached between
//! calls.

use crate::error::{Error, Result};
use crate::{log_query, log_query_result};
use rusqlite::Batch;
use rusqlite::types::ValueRef;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Catalog query listing user tables; `sqlite_%` tables are internal
const USER_TABLES_SQL: &str =
    "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'";

/// Column names and rendered rows of one statement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// An owned SQLite value, kept so results can be rendered both as table
/// cells and as literals
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Literal {
    fn from_ref(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Literal::Null,
            ValueRef::Integer(i) => Literal::Integer(i),
            ValueRef::Real(f) => Literal::Real(f),
            ValueRef::Text(t) => Literal::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Literal::Blob(b.to_vec()),
        }
    }

    /// Text shown in a table cell
    #[must_use]
    pub fn to_cell(&self) -> String {
        match self {
            Literal::Null => "NULL".to_string(),
            Literal::Integer(i) => i.to_string(),
            // keeps the fraction on whole values: 1.0, not 1
            Literal::Real(f) => format!("{f:?}"),
            Literal::Text(s) => s.clone(),
            Literal::Blob(b) => hex_literal(b),
        }
    }

    /// Text shown inside a result tuple: strings quoted, NULL as `None`
    #[must_use]
    pub fn to_literal(&self) -> String {
        match self {
            Literal::Null => "None".to_string(),
            Literal::Text(s) => format!("'{}'", s.replace('\'', "\\'")),
            other => other.to_cell(),
        }
    }
}

/// Render rows the way a Python DB-API cursor prints them:
/// `[(1, 'Alice'), (2, 'Bob')]`. This is the SQL result text handed to the
/// language model.
#[must_use]
pub fn tuple_text(rows: &[Vec<Literal>]) -> String {
    let rendered: Vec<String> = rows
        .iter()
        .map(|row| {
            let values: Vec<String> = row.iter().map(Literal::to_literal).collect();
            if values.len() == 1 {
                format!("({},)", values[0])
            } else {
                format!("({})", values.join(", "))
            }
        })
        .collect();
    format!("[{}]", rendered.join(", "))
}

fn hex_literal(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2 + 3);
    out.push_str("x'");
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out.push('\'');
    out
}

/// Quote an identifier for use in generated SQL
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `SELECT *` over one table; the memo and default view both use this form
#[must_use]
pub fn select_all(table: &str) -> String {
    format!("SELECT * FROM {}", quote_identifier(table))
}

/// Handle to a database file
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the parent directory and the database file if missing
    pub fn ensure_exists(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let _ = self.connect()?;
        tracing::debug!("Database ready at {}", self.path.display());
        Ok(())
    }

    /// Open a fresh connection for one operation
    pub fn connect(&self) -> Result<rusqlite::Connection> {
        Ok(rusqlite::Connection::open(&self.path)?)
    }

    /// User tables in catalog (creation) order
    pub fn tables(&self) -> Result<Vec<String>> {
        self.table_names(USER_TABLES_SQL)
    }

    /// User tables sorted by name
    pub fn tables_by_name(&self) -> Result<Vec<String>> {
        self.table_names(&format!("{USER_TABLES_SQL} ORDER BY name"))
    }

    fn table_names(&self, sql: &str) -> Result<Vec<String>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(sql)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    /// Run a statement and collect its columns and rendered rows
    pub fn fetch(&self, sql: &str) -> Result<ResultSet> {
        let (columns, raw) = self.fetch_raw(sql)?;
        let rows = raw
            .iter()
            .map(|row| row.iter().map(Literal::to_cell).collect())
            .collect();
        Ok(ResultSet { columns, rows })
    }

    /// Run a single row-returning statement and keep the typed values.
    ///
    /// More than one statement is rejected, as is a statement without
    /// result columns; neither is executed.
    pub fn fetch_raw(&self, sql: &str) -> Result<(Vec<String>, Vec<Vec<Literal>>)> {
        log_query!(sql);
        let conn = self.connect()?;
        let mut batch = Batch::new(&conn, sql);
        let Some(mut stmt) = batch.next()? else {
            return Err(Error::NotAQuery(sql.trim().to_string()));
        };
        if batch.next()?.is_some() {
            return Err(rusqlite::Error::MultipleStatement.into());
        }
        if stmt.column_count() == 0 {
            return Err(Error::NotAQuery(sql.trim().to_string()));
        }

        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let column_count = columns.len();

        let mut rows = stmt.query([])?;
        let mut all_rows = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                values.push(Literal::from_ref(row.get_ref(i)?));
            }
            all_rows.push(values);
        }

        log_query_result!(column_count, all_rows.len());
        Ok((columns, all_rows))
    }

    /// Run a mutating statement inside a transaction and commit it
    pub fn execute(&self, sql: &str) -> Result<()> {
        log_query!(sql);
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.commit()?;
        Ok(())
    }

    /// `CREATE` statements of every table and view, in catalog order
    pub fn schema(&self) -> Result<Vec<(String, String)>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT name, sql FROM sqlite_master \
             WHERE type IN ('table', 'view') AND sql IS NOT NULL AND name NOT LIKE 'sqlite_%'",
        )?;
        let entries = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// Describe every user table for a language model prompt: its
    /// `CREATE` statement followed by up to `sample_rows` example rows
    pub fn table_info(&self, sample_rows: usize) -> Result<String> {
        let mut blocks = Vec::new();
        for (name, sql) in self.schema()? {
            let mut block = sql.trim().to_string();
            if sample_rows > 0 {
                let sample = self.fetch(&format!(
                    "{} LIMIT {sample_rows}",
                    select_all(&name)
                ))?;
                block.push_str(&format!(
                    "\n\n/*\n{sample_rows} rows from {name} table:\n{}",
                    sample.columns.join("\t")
                ));
                for row in &sample.rows {
                    block.push('\n');
                    block.push_str(&row.join("\t"));
                }
                block.push_str("\n*/");
            }
            blocks.push(block);
        }
        Ok(blocks.join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("nested").join("test.db"));
        store.ensure_exists().unwrap();
        (dir, store)
    }

    #[test]
    fn test_ensure_exists_creates_file() {
        let (_dir, store) = test_store();
        assert!(store.path().exists());
        assert!(store.tables().unwrap().is_empty());
    }

    #[test]
    fn test_table_orders() {
        let (_dir, store) = test_store();
        store
            .execute("CREATE TABLE zebra (id INTEGER); CREATE TABLE apple (id INTEGER);")
            .unwrap();
        assert_eq!(store.tables().unwrap(), vec!["zebra", "apple"]);
        assert_eq!(store.tables_by_name().unwrap(), vec!["apple", "zebra"]);
    }

    #[test]
    fn test_internal_tables_hidden() {
        let (_dir, store) = test_store();
        store
            .execute("CREATE TABLE a (id INTEGER PRIMARY KEY AUTOINCREMENT, v TEXT); INSERT INTO a (v) VALUES ('x');")
            .unwrap();
        assert_eq!(store.tables_by_name().unwrap(), vec!["a"]);
    }

    #[test]
    fn test_fetch_renders_values() {
        let (_dir, store) = test_store();
        let result = store
            .fetch("SELECT 1 AS i, 2.5 AS r, 'txt' AS t, NULL AS n, x'0aff' AS b")
            .unwrap();
        assert_eq!(result.columns, vec!["i", "r", "t", "n", "b"]);
        assert_eq!(result.rows, vec![vec!["1", "2.5", "txt", "NULL", "x'0aff'"]]);

        let whole = store.fetch("SELECT 1.0, -3.0, 0.1").unwrap();
        assert_eq!(whole.rows, vec![vec!["1.0", "-3.0", "0.1"]]);
    }

    #[test]
    fn test_fetch_rejects_multiple_statements() {
        let (_dir, store) = test_store();
        store
            .execute("CREATE TABLE t (a INTEGER); INSERT INTO t VALUES (1);")
            .unwrap();

        match store.fetch("SELECT a FROM t; SELECT 2") {
            Err(Error::Database(rusqlite::Error::MultipleStatement)) => {}
            other => panic!("Expected MultipleStatement, got {other:?}"),
        }
        assert!(store.fetch("SELECT a FROM t; DELETE FROM t").is_err());
        assert_eq!(store.fetch("SELECT COUNT(*) FROM t").unwrap().rows, vec![vec!["1"]]);

        // a trailing semicolon or comment is still one statement
        assert_eq!(store.fetch("SELECT a FROM t; -- done").unwrap().rows, vec![vec!["1"]]);
    }

    #[test]
    fn test_fetch_rejects_statements_without_columns() {
        let (_dir, store) = test_store();
        store.execute("CREATE TABLE t (a INTEGER PRIMARY KEY)").unwrap();

        match store.fetch("REPLACE INTO t VALUES (9)") {
            Err(Error::NotAQuery(sql)) => assert_eq!(sql, "REPLACE INTO t VALUES (9)"),
            other => panic!("Expected NotAQuery, got {other:?}"),
        }
        assert!(matches!(
            store.fetch("PRAGMA user_version = 3"),
            Err(Error::NotAQuery(_))
        ));
        assert!(matches!(store.fetch("-- nothing here"), Err(Error::NotAQuery(_))));

        assert_eq!(store.fetch("SELECT COUNT(*) FROM t").unwrap().rows, vec![vec!["0"]]);
        assert_eq!(store.fetch("PRAGMA user_version").unwrap().rows, vec![vec!["0"]]);
    }

    #[test]
    fn test_execute_rolls_back_failed_batch() {
        let (_dir, store) = test_store();
        store.execute("CREATE TABLE t (id INTEGER)").unwrap();
        let err = store.execute("INSERT INTO t VALUES (1); INSERT INTO missing VALUES (2);");
        assert!(err.is_err());
        let result = store.fetch("SELECT COUNT(*) FROM t").unwrap();
        assert_eq!(result.rows, vec![vec!["0"]]);
    }

    #[test]
    fn test_tuple_text() {
        let (_dir, store) = test_store();
        let (_, raw) = store.fetch_raw("SELECT 'Paris', 42, NULL").unwrap();
        assert_eq!(tuple_text(&raw), "[('Paris', 42, None)]");

        let (_, single) = store.fetch_raw("SELECT 7").unwrap();
        assert_eq!(tuple_text(&single), "[(7,)]");
        assert_eq!(tuple_text(&[]), "[]");
    }

    #[test]
    fn test_table_info_with_samples() {
        let (_dir, store) = test_store();
        store
            .execute("CREATE TABLE users (name TEXT, age INTEGER); INSERT INTO users VALUES ('Ann', 30), ('Bo', 41);")
            .unwrap();

        let bare = store.table_info(0).unwrap();
        assert_eq!(bare, "CREATE TABLE users (name TEXT, age INTEGER)");

        let sampled = store.table_info(1).unwrap();
        assert!(sampled.contains("1 rows from users table:"));
        assert!(sampled.contains("name\tage"));
        assert!(sampled.contains("Ann\t30"));
        assert!(!sampled.contains("Bo\t41"));
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("users"), "\"users\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(select_all("users"), "SELECT * FROM \"users\"");
    }
}
