// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Statement execution on a [`Database`].

use rusqlite::Statement;
use tracing::debug;

use crate::connection::{Database, LogLevel};
use crate::error::{Error, Result};
use crate::value::{ResultSet, ScalarValue};

impl Database {
    /// Run `sql` to completion with `params` bound positionally.
    ///
    /// The compiled statement stays cached under its SQL text. Any rows the
    /// statement produces are stepped through and discarded.
    pub fn execute(&self, sql: &str, params: &[ScalarValue]) -> Result<()> {
        self.trace_sql(sql, params);
        let mut stmt = self.connection()?.prepare_cached(sql)?;
        bind_parameters(&mut stmt, params)?;

        let mut rows = stmt.raw_query();
        while rows.next()?.is_some() {}
        Ok(())
    }

    /// Run `sql` and collect every row it produces.
    pub fn query(&self, sql: &str, params: &[ScalarValue]) -> Result<ResultSet> {
        self.trace_sql(sql, params);
        let mut stmt = self.connection()?.prepare_cached(sql)?;
        bind_parameters(&mut stmt, params)?;

        let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_owned).collect();
        let mut result = ResultSet::default();
        let mut rows = stmt.raw_query();
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(columns.len());
            for index in 0..columns.len() {
                cells.push(ScalarValue::from_column(row.get_ref(index)?));
            }
            result.rows.push(cells);
        }
        if !result.rows.is_empty() {
            result.columns = columns;
        }
        Ok(result)
    }

    /// Rows modified by the most recently completed statement.
    ///
    /// Must be called right after the write it reports on; any statement run
    /// in between on this connection replaces the counter.
    pub fn changes(&self) -> Result<i64> {
        let result = self.query("SELECT changes()", &[])?;
        Ok(result.first_value().and_then(ScalarValue::as_i64).unwrap_or(0))
    }

    /// Row id of the most recent successful INSERT on this connection.
    pub fn last_insert_id(&self) -> Result<i64> {
        let result = self.query("SELECT last_insert_rowid()", &[])?;
        Ok(result.first_value().and_then(ScalarValue::as_i64).unwrap_or(0))
    }

    /// `changes()` and `last_insert_rowid()` read in a single statement.
    ///
    /// The row id is reported as 0 when no row was inserted.
    pub fn insert_changes(&self) -> Result<(i64, i64)> {
        let result = self.query("SELECT changes(), last_insert_rowid()", &[])?;
        let row = result.rows.first();
        let cell = |index: usize| {
            row.and_then(|row| row.get(index))
                .and_then(ScalarValue::as_i64)
                .unwrap_or(0)
        };
        let changes = cell(0);
        let last_id = if changes > 0 { cell(1) } else { 0 };
        Ok((changes, last_id))
    }

    fn trace_sql(&self, sql: &str, params: &[ScalarValue]) {
        match self.log_level {
            LogLevel::None => {}
            LogLevel::Sql => debug!(path = %self.path(), "{sql}"),
            LogLevel::Verbose => debug!(path = %self.path(), ?params, "{sql}"),
        }
    }
}

/// Bind `params` to the statement's placeholders in order.
///
/// Placeholders left without a parameter stay NULL.
fn bind_parameters(stmt: &mut Statement<'_>, params: &[ScalarValue]) -> Result<()> {
    let count = stmt.parameter_count();
    for (offset, value) in params.iter().enumerate() {
        let index = offset + 1;
        if index > count {
            return Err(Error::Bind { index, count });
        }
        stmt.raw_bind_parameter(index, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{MEMORY_PATH, OpenMode};

    fn memory_db() -> Database {
        let db = Database::open(MEMORY_PATH, OpenMode::ReadWrite).unwrap();
        db.execute("CREATE TABLE t(a INTEGER, b TEXT)", &[]).unwrap();
        db
    }

    #[test]
    fn test_bind_out_of_range() {
        let db = memory_db();
        let err = db
            .execute(
                "INSERT INTO t VALUES (?, ?)",
                &[1i64.into(), "x".into(), "extra".into()],
            )
            .unwrap_err();
        assert_eq!(err, Error::Bind { index: 3, count: 2 });
    }

    #[test]
    fn test_missing_parameters_bind_null() {
        let db = memory_db();
        db.execute("INSERT INTO t VALUES (?, ?)", &[1i64.into()]).unwrap();
        let result = db.query("SELECT b FROM t", &[]).unwrap();
        assert_eq!(result.rows, vec![vec![ScalarValue::Null]]);
    }

    #[test]
    fn test_cached_statement_rebinds() {
        let db = memory_db();
        for i in 0..3i64 {
            db.execute("INSERT INTO t VALUES (?, ?)", &[i.into(), "x".into()])
                .unwrap();
        }
        let result = db.query("SELECT a FROM t ORDER BY a", &[]).unwrap();
        assert_eq!(
            result.rows,
            vec![
                vec![ScalarValue::Integer(0)],
                vec![ScalarValue::Integer(1)],
                vec![ScalarValue::Integer(2)],
            ]
        );
    }

    #[test]
    fn test_insert_changes() {
        let db = memory_db();
        db.execute("INSERT INTO t VALUES (1, 'x')", &[]).unwrap();
        assert_eq!(db.insert_changes().unwrap(), (1, 1));

        db.execute("DELETE FROM t WHERE a = 42", &[]).unwrap();
        assert_eq!(db.insert_changes().unwrap(), (0, 0));
    }
}
