use super::models::HistoryEvent;
use super::schema::{self, HISTORY};
use crate::error::Error;
use crate::utils::path::now_local;
use ahash::AHashMap;
use rusqlite::types::{ToSql, Value};
use rusqlite::Connection;
use tracing::{debug, error, info, trace, warn};

/// One result row, column values in select order.
pub type Row = Vec<Value>;

/// Rows per compound insert statement unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Connection wrapper that owns the SQLite handle, reconciles the declared
/// schema on open and keeps the `History` audit trail.
pub struct StorageGate {
    db_path: String,
    conn: Option<Connection>,
    required: Vec<String>,
    schemas: AHashMap<String, String>,
    batch_size: usize,
}

impl StorageGate {
    /// Create a gate for a database file, or `:memory:`. Nothing is opened
    /// until [`StorageGate::open`].
    pub fn new(db_path: &str) -> Self {
        let mut gate = StorageGate {
            db_path: db_path.to_string(),
            conn: None,
            required: vec![HISTORY.to_string()],
            schemas: AHashMap::new(),
            batch_size: DEFAULT_BATCH_SIZE,
        };
        gate.define_schema(HISTORY, schema::HISTORY_COLUMNS);
        gate
    }

    pub fn in_memory() -> Self {
        Self::new(":memory:")
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Set the tables that must exist after `open`. `History` is always kept.
    pub fn declare_required_tables(&mut self, names: &[&str]) {
        debug!("need tables: {:?}", names);
        self.required = names.iter().map(|n| n.to_string()).collect();
        if !self.required.iter().any(|n| n == HISTORY) {
            self.required.push(HISTORY.to_string());
        }
    }

    pub fn required_tables(&self) -> &[String] {
        &self.required
    }

    /// Record the expected column definition of a table. Used only to create
    /// missing tables and to validate existing ones.
    pub fn define_schema(&mut self, table: &str, columns: &str) {
        self.schemas.insert(
            table.to_string(),
            format!("create table {} ({})", table, columns),
        );
    }

    /// Connect and reconcile every required table against its declared
    /// schema. Missing tables are created; a differing schema, or a missing
    /// table with no definition, is an error and is traced. `History` is
    /// reconciled first so those traces have somewhere to go.
    pub fn open(&mut self) -> Result<(), Error> {
        if self.conn.is_none() {
            debug!("sqlite open({})", self.db_path);
            let conn = Connection::open(&self.db_path).map_err(|e| {
                error!("sqlite open {} failed: {}", self.db_path, e);
                Error::Database(e)
            })?;
            conn.execute_batch(
                "PRAGMA foreign_keys = ON;
                 PRAGMA synchronous = NORMAL;",
            )?;
            debug!("sqlite open OK");
            self.conn = Some(conn);
        }

        let mut tables = self.required.clone();
        tables.sort_by_key(|t| t != HISTORY);

        for table in tables {
            let expected = self.schemas.get(&table).cloned();
            let existing = self.execute(
                "select sql from sqlite_master where type = 'table' and name = ?1",
                &[&table],
            )?;

            match (existing.first(), expected) {
                (Some(row), Some(expected)) => {
                    let actual = match row.first() {
                        Some(Value::Text(sql)) => sql.clone(),
                        _ => String::new(),
                    };
                    if actual.to_lowercase() != expected.to_lowercase() {
                        self.trace(
                            "error",
                            &format!("schema mismatch, \"{}\" <> \"{}\"", actual, expected),
                        );
                        return Err(Error::SchemaMismatch {
                            table,
                            expected,
                            actual,
                        });
                    }
                }
                (Some(_), None) => {}
                (None, Some(expected)) => {
                    self.execute(&expected, &[])?;
                    debug!("created table {}", table);
                }
                (None, None) => {
                    self.trace(
                        "error",
                        &format!("create table, table \"{}\" is not defined", table),
                    );
                    return Err(Error::UndefinedTable(table));
                }
            }
        }
        Ok(())
    }

    /// Run one statement and fetch all result rows. Backend errors are logged
    /// here and handed back; whether they are fatal is up to the caller.
    pub fn execute(&self, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, Error> {
        let conn = self.conn.as_ref().ok_or(Error::NotOpen)?;
        trace!("query = \"{}\"", sql);

        let run = || -> rusqlite::Result<Vec<Row>> {
            let mut stmt = conn.prepare_cached(sql)?;
            let columns = stmt.column_count();
            let rows = stmt
                .query_map(params, |row| {
                    (0..columns)
                        .map(|i| row.get::<_, Value>(i))
                        .collect::<rusqlite::Result<Row>>()
                })?
                .collect::<rusqlite::Result<Vec<Row>>>()?;
            Ok(rows)
        };

        match run() {
            Ok(rows) => {
                trace!("rowcount = {}", rows.len());
                Ok(rows)
            }
            Err(e) => {
                error!("query failed: {} [{}]", e, sql);
                Err(Error::Database(e))
            }
        }
    }

    /// Insert rows through compound `insert ... values (..), (..)` statements
    /// of at most `batch_size` rows each. Stops at the first failing batch.
    pub fn insert_rows(
        &self,
        table: &str,
        columns: &[&str],
        rows: &[Row],
    ) -> Result<usize, Error> {
        let placeholders = format!("({})", vec!["?"; columns.len()].join(", "));
        let mut inserted = 0;

        for chunk in rows.chunks(self.batch_size) {
            let sql = format!(
                "insert into {} ({}) values {}",
                table,
                columns.join(", "),
                vec![placeholders.as_str(); chunk.len()].join(", ")
            );
            let params: Vec<&dyn ToSql> = chunk
                .iter()
                .flatten()
                .map(|v| v as &dyn ToSql)
                .collect();
            self.execute(&sql, &params)?;
            inserted += chunk.len();
        }
        Ok(inserted)
    }

    /// Log an event and append it to the `History` table. A failed history
    /// write is logged by `execute` and otherwise ignored.
    pub fn trace(&self, event: &str, message: &str) {
        match event {
            "error" => error!("{}", message),
            "warning" => warn!("{}", message),
            _ => info!("{}, {}", event, message),
        }

        if self.conn.is_none() {
            return;
        }
        let _ = self.execute(
            "insert into History (timestamp, event, msg) values (?1, ?2, ?3)",
            &[&now_local(), &event, &message],
        );
    }

    /// The audit trail in insertion order.
    pub fn history(&self) -> Result<Vec<HistoryEvent>, Error> {
        self.execute(
            "select timestamp, event, msg from History order by rowid",
            &[],
        )?
        .iter()
        .map(HistoryEvent::from_row)
        .collect()
    }

    pub fn close(&mut self) -> Result<(), Error> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| {
                error!("sqlite close {} failed: {}", self.db_path, e);
                Error::Database(e)
            })?;
            debug!("sqlite closed {}", self.db_path);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_always_required() {
        let mut gate = StorageGate::in_memory();
        gate.declare_required_tables(&["A", "B"]);
        assert_eq!(gate.required_tables(), &["A", "B", "History"]);

        gate.declare_required_tables(&["History", "A"]);
        assert_eq!(gate.required_tables(), &["History", "A"]);
    }

    #[test]
    fn test_open_creates_declared_tables() {
        let mut gate = StorageGate::in_memory();
        gate.declare_required_tables(&["Things"]);
        gate.define_schema("Things", "name text, size integer");
        gate.open().unwrap();

        let rows = gate
            .execute("select name from sqlite_master where type = 'table' order by name", &[])
            .unwrap();
        let names: Vec<Value> = rows.into_iter().flatten().collect();
        assert_eq!(
            names,
            vec![Value::Text("History".into()), Value::Text("Things".into())]
        );
    }

    #[test]
    fn test_open_fails_for_undefined_table() {
        let mut gate = StorageGate::in_memory();
        gate.declare_required_tables(&["Nope"]);
        assert!(matches!(gate.open(), Err(Error::UndefinedTable(t)) if t == "Nope"));
    }

    #[test]
    fn test_undefined_table_is_traced() {
        let mut gate = StorageGate::in_memory();
        gate.declare_required_tables(&["Nope", "History"]);
        assert!(gate.open().is_err());

        let history = gate.history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].event, "error");
        assert!(history[0].message.contains("\"Nope\" is not defined"));
    }

    #[test]
    fn test_execute_failure_is_returned() {
        let mut gate = StorageGate::in_memory();
        gate.open().unwrap();
        assert!(matches!(
            gate.execute("select * from missing_table", &[]),
            Err(Error::Database(_))
        ));
    }

    #[test]
    fn test_execute_before_open() {
        let gate = StorageGate::in_memory();
        assert!(matches!(gate.execute("select 1", &[]), Err(Error::NotOpen)));
    }

    #[test]
    fn test_trace_appends_history() {
        let mut gate = StorageGate::in_memory();
        gate.open().unwrap();
        gate.trace("scan-start", "root=[/x/]");
        gate.trace("warning", "it's odd");

        let history = gate.history().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].event, "scan-start");
        assert_eq!(history[1].message, "it's odd");
    }

    #[test]
    fn test_trace_survives_missing_history_table() {
        let mut gate = StorageGate::in_memory();
        gate.open().unwrap();
        gate.execute("drop table History", &[]).unwrap();
        gate.trace("error", "nowhere to write");
        assert!(gate.history().is_err());
    }

    #[test]
    fn test_insert_rows_batches() {
        let mut gate = StorageGate::in_memory().with_batch_size(3);
        gate.declare_required_tables(&["T"]);
        gate.define_schema("T", "n integer");
        gate.open().unwrap();

        let rows: Vec<Row> = (0..7).map(|i| vec![Value::Integer(i)]).collect();
        assert_eq!(gate.insert_rows("T", &["n"], &rows).unwrap(), 7);

        let count = gate.execute("select count(*), sum(n) from T", &[]).unwrap();
        assert_eq!(count[0], vec![Value::Integer(7), Value::Integer(21)]);
    }

    #[test]
    fn test_close_releases_connection() {
        let mut gate = StorageGate::in_memory();
        gate.open().unwrap();
        gate.close().unwrap();
        assert!(!gate.is_open());
        assert!(matches!(gate.execute("select 1", &[]), Err(Error::NotOpen)));
    }
}
