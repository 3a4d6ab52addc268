//! # Table View
//!
//! Routes submitted SQL to the read or write path and keeps the displayed
//! result in step with the database. After a mutation the view is rebuilt
//! from the last SELECT shown (the memo), from the newly created table, or
//! from the first table in the catalog.

pub mod display;
pub mod statement;

pub use display::DisplayedResult;
pub use statement::StatementKind;

use crate::error::Result;
use crate::store::{Store, select_all};
use statement::{created_table_name, is_memoizable};
use tracing::{debug, warn};

/// Results view over one database file
#[derive(Debug)]
pub struct TableView {
    store: Store,
    display: DisplayedResult,
    memo: Option<String>,
}

impl TableView {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            display: DisplayedResult::empty(),
            memo: None,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// The result currently shown
    pub fn display(&self) -> &DisplayedResult {
        &self.display
    }

    /// Last read statement shown, used to refresh after a mutation
    pub fn memo(&self) -> Option<&str> {
        self.memo.as_deref()
    }

    /// Run a statement and update the display.
    ///
    /// DDL and DML are committed and followed by a refresh; everything else
    /// is shown directly. Failures replace the display with a single error
    /// cell.
    pub fn execute_query(&mut self, sql: &str) {
        let sql = sql.trim();
        if sql.is_empty() {
            return;
        }

        let kind = StatementKind::classify(sql);
        debug!("Statement classified as {kind}");

        if !kind.is_mutating() {
            self.load_data(Some(sql));
            return;
        }

        if let Err(e) = self.store.execute(sql) {
            warn!("{kind} statement failed: {e}");
            self.display = DisplayedResult::from(&e);
            return;
        }

        match kind {
            StatementKind::CreateTable => self.refresh_after_create(sql),
            StatementKind::Drop => {
                self.memo = None;
                self.load_data(None);
            }
            _ => self.refresh_current_view(),
        }
    }

    /// Show the result of `query`, or of the default table when `None`.
    ///
    /// The default table is the first user table in catalog order; with no
    /// tables the display becomes empty.
    pub fn load_data(&mut self, query: Option<&str>) {
        if let Err(e) = self.try_load_data(query) {
            warn!("Loading data failed: {e}");
            self.display = DisplayedResult::from(&e);
        }
    }

    fn try_load_data(&mut self, query: Option<&str>) -> Result<()> {
        let query = match query {
            Some(q) => q.to_string(),
            None => match self.store.tables()?.into_iter().next() {
                Some(table) => select_all(&table),
                None => {
                    debug!("No tables found, showing an empty view");
                    self.display = DisplayedResult::empty();
                    return Ok(());
                }
            },
        };

        let result = self.store.fetch(&query)?;
        if is_memoizable(&query) {
            self.memo = Some(query);
        }
        self.display = result.into();
        Ok(())
    }

    /// Re-run the memo, or show the default table when there is none
    pub fn refresh_current_view(&mut self) {
        match self.memo.clone() {
            Some(memo) => self.load_data(Some(&memo)),
            None => self.load_data(None),
        }
    }

    /// Show the table a `CREATE TABLE` statement just made. The name comes
    /// from the statement; when it cannot be read the last table in name
    /// order is used. Falls back to the default view on failure.
    pub fn refresh_after_create(&mut self, sql: &str) {
        if let Err(e) = self.try_refresh_after_create(sql) {
            warn!("Refresh after CREATE TABLE failed: {e}");
            self.load_data(None);
        }
    }

    fn try_refresh_after_create(&mut self, sql: &str) -> Result<()> {
        let tables = self.store.tables_by_name()?;
        let table = created_table_name(sql)
            .filter(|name| tables.iter().any(|t| t.eq_ignore_ascii_case(name)))
            .or_else(|| tables.last().cloned());

        let Some(table) = table else {
            self.load_data(None);
            return Ok(());
        };

        let query = select_all(&table);
        let result = self.store.fetch(&query)?;
        self.memo = Some(query);
        self.display = result.into();
        Ok(())
    }
}
