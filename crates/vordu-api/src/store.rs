//! Matrix store
//!
//! The store is an explicit handle built once at startup and shared with
//! every handler. Writes are upserts keyed by natural keys:
//! - systems by `name`
//! - rows by `(system_name, key)`
//! - matrix cells by `(project_name, row_id, phase_id)`

use crate::error::StoreError;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use vordu_core::{CellStatus, Component, Granularity, MatrixCell, ScenarioRecord, SystemDescriptor};

/// A configured row as reported by `GET /config`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowView {
    pub id: String,
    pub label: String,
    pub parent: Option<String>,
}

/// A configured system with its rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemView {
    pub id: String,
    /// Label, falling back to the id
    pub name: String,
    pub granularity: Granularity,
    pub rows: Vec<RowView>,
}

/// Persistence operations behind the HTTP API
#[cfg_attr(test, mockall::automock)]
pub trait MatrixStore: Send + Sync {
    /// Insert or update a system and its components
    fn upsert_config(
        &self,
        system: &SystemDescriptor,
        components: &[Component],
    ) -> Result<(), StoreError>;

    /// Insert or fully overwrite cells; returns the number written
    fn upsert_cells(&self, cells: &[MatrixCell]) -> Result<usize, StoreError>;

    /// All persisted cells in insertion order
    fn list_cells(&self) -> Result<Vec<MatrixCell>, StoreError>;

    /// All systems with their rows
    fn list_systems(&self) -> Result<Vec<SystemView>, StoreError>;

    /// Delete every cell, row and system
    fn reset(&self) -> Result<(), StoreError>;
}

const SCHEMA: &str = "\
    CREATE TABLE IF NOT EXISTS systems (\
        id INTEGER PRIMARY KEY AUTOINCREMENT,\
        name TEXT NOT NULL UNIQUE,\
        label TEXT NOT NULL,\
        description TEXT,\
        domain TEXT,\
        granularity TEXT NOT NULL DEFAULT 'component'\
    );\
    CREATE TABLE IF NOT EXISTS rows (\
        id INTEGER PRIMARY KEY AUTOINCREMENT,\
        system_name TEXT NOT NULL,\
        key TEXT NOT NULL,\
        label TEXT NOT NULL,\
        parent_row TEXT,\
        UNIQUE (system_name, key)\
    );\
    CREATE TABLE IF NOT EXISTS matrix_cells (\
        id INTEGER PRIMARY KEY AUTOINCREMENT,\
        project_name TEXT NOT NULL,\
        row_id TEXT NOT NULL,\
        phase_id INTEGER NOT NULL,\
        status TEXT NOT NULL,\
        completion INTEGER NOT NULL,\
        scenarios_total INTEGER NOT NULL,\
        scenarios_passed INTEGER NOT NULL,\
        steps_total INTEGER NOT NULL,\
        steps_passed INTEGER NOT NULL,\
        details TEXT NOT NULL DEFAULT '[]',\
        UNIQUE (project_name, row_id, phase_id)\
    );\
    CREATE INDEX IF NOT EXISTS idx_rows_system ON rows(system_name);";

/// SQLite-backed store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

/// File named by a database URL; `None` for an in-memory database
fn database_path(url: &str) -> Option<PathBuf> {
    let target = url
        .strip_prefix("sqlite:///")
        .or_else(|| url.strip_prefix("sqlite://"))
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);

    if target.is_empty() || target == ":memory:" {
        return None;
    }
    Some(PathBuf::from(target))
}

impl SqliteStore {
    /// Open a store from a database URL
    ///
    /// Accepts `:memory:`, `sqlite::memory:`, a plain path or a SQLAlchemy-style
    /// `sqlite:///<path>` URL, where `sqlite:///rel.db` is relative to the
    /// working directory and `sqlite:////abs.db` is absolute.
    ///
    /// # Errors
    /// Fails when the file cannot be opened or the schema cannot be created.
    pub fn open(url: &str) -> Result<Self, StoreError> {
        match database_path(url) {
            Some(path) => Self::open_path(&path),
            None => Self::in_memory(),
        }
    }

    /// Open (or create) a database file
    ///
    /// # Errors
    /// Fails when the parent directory or database cannot be created.
    pub fn open_path(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;\
             PRAGMA synchronous=NORMAL;\
             PRAGMA busy_timeout=5000;",
        )?;
        tracing::info!(path = %path.display(), "Opened matrix store");
        Self::init(conn)
    }

    /// Private in-memory database, for tests and ephemeral runs
    ///
    /// # Errors
    /// Fails only if SQLite cannot allocate the database.
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    /// Look up one cell by its key
    ///
    /// # Errors
    /// Query or decoding failures.
    pub fn get_cell(
        &self,
        project: &str,
        row: &str,
        phase: u8,
    ) -> Result<Option<MatrixCell>, StoreError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT project_name, row_id, phase_id, status, completion, scenarios_total, \
                 scenarios_passed, steps_total, steps_passed, details \
                 FROM matrix_cells WHERE project_name = ?1 AND row_id = ?2 AND phase_id = ?3",
                params![project, row, phase],
                CellRow::from_row,
            )
            .optional()?
            .map(CellRow::into_cell)
            .transpose()
        })
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<F, R>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<R, StoreError>,
    {
        let mut guard = self.conn.lock();
        f(&mut *guard)
    }
}

/// Columns as stored, before domain parsing
struct CellRow {
    project_name: String,
    row_id: String,
    phase_id: u8,
    status: String,
    completion: u8,
    scenarios_total: u32,
    scenarios_passed: u32,
    steps_total: u32,
    steps_passed: u32,
    details: String,
}

impl CellRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            project_name: row.get(0)?,
            row_id: row.get(1)?,
            phase_id: row.get(2)?,
            status: row.get(3)?,
            completion: row.get(4)?,
            scenarios_total: row.get(5)?,
            scenarios_passed: row.get(6)?,
            steps_total: row.get(7)?,
            steps_passed: row.get(8)?,
            details: row.get(9)?,
        })
    }

    fn into_cell(self) -> Result<MatrixCell, StoreError> {
        let status: CellStatus = self
            .status
            .parse()
            .map_err(|_| StoreError::corrupt("matrix_cells", format!("status '{}'", self.status)))?;
        let details: Vec<ScenarioRecord> = serde_json::from_str(&self.details)?;
        Ok(MatrixCell {
            project_name: self.project_name,
            row_id: self.row_id,
            phase_id: self.phase_id,
            status,
            completion: self.completion,
            scenarios_total: self.scenarios_total,
            scenarios_passed: self.scenarios_passed,
            steps_total: self.steps_total,
            steps_passed: self.steps_passed,
            details,
        })
    }
}

impl MatrixStore for SqliteStore {
    fn upsert_config(
        &self,
        system: &SystemDescriptor,
        components: &[Component],
    ) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO systems (name, label, description, domain, granularity) \
                 VALUES (?1, ?2, ?3, ?4, ?5) \
                 ON CONFLICT(name) DO UPDATE SET \
                 label = excluded.label, description = excluded.description, \
                 domain = excluded.domain, granularity = excluded.granularity",
                params![
                    system.name,
                    system.label,
                    system.description,
                    system.domain,
                    system.granularity.as_str(),
                ],
            )?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO rows (system_name, key, label, parent_row) \
                     VALUES (?1, ?2, ?3, ?4) \
                     ON CONFLICT(system_name, key) DO UPDATE SET \
                     label = excluded.label, parent_row = excluded.parent_row",
                )?;
                for component in components {
                    stmt.execute(params![
                        system.name,
                        component.name,
                        component.label,
                        component.parent,
                    ])?;
                }
            }
            tx.commit()?;
            tracing::debug!(
                system = %system.name,
                rows = components.len(),
                "Upserted config"
            );
            Ok(())
        })
    }

    fn upsert_cells(&self, cells: &[MatrixCell]) -> Result<usize, StoreError> {
        let encoded: Vec<String> = cells
            .iter()
            .map(|c| serde_json::to_string(&c.details))
            .collect::<Result<_, _>>()?;

        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            let mut written = 0usize;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO matrix_cells (project_name, row_id, phase_id, status, completion, \
                     scenarios_total, scenarios_passed, steps_total, steps_passed, details) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10) \
                     ON CONFLICT(project_name, row_id, phase_id) DO UPDATE SET \
                     status = excluded.status, completion = excluded.completion, \
                     scenarios_total = excluded.scenarios_total, \
                     scenarios_passed = excluded.scenarios_passed, \
                     steps_total = excluded.steps_total, steps_passed = excluded.steps_passed, \
                     details = excluded.details",
                )?;
                for (cell, details) in cells.iter().zip(&encoded) {
                    written += stmt.execute(params![
                        cell.project_name,
                        cell.row_id,
                        cell.phase_id,
                        cell.status.as_str(),
                        cell.completion,
                        cell.scenarios_total,
                        cell.scenarios_passed,
                        cell.steps_total,
                        cell.steps_passed,
                        details,
                    ])?;
                }
            }
            tx.commit()?;
            Ok(written)
        })
    }

    fn list_cells(&self) -> Result<Vec<MatrixCell>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT project_name, row_id, phase_id, status, completion, scenarios_total, \
                 scenarios_passed, steps_total, steps_passed, details \
                 FROM matrix_cells ORDER BY id",
            )?;
            let rows = stmt
                .query_map([], CellRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows.into_iter().map(CellRow::into_cell).collect()
        })
    }

    fn list_systems(&self) -> Result<Vec<SystemView>, StoreError> {
        self.with_conn(|conn| {
            let mut systems_stmt = conn.prepare(
                "SELECT name, label, granularity FROM systems ORDER BY id",
            )?;
            let systems = systems_stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            let mut rows_stmt = conn.prepare(
                "SELECT key, label, parent_row FROM rows WHERE system_name = ?1 ORDER BY id",
            )?;
            let mut views = Vec::with_capacity(systems.len());
            for (name, label, granularity) in systems {
                let rows = rows_stmt
                    .query_map(params![name], |row| {
                        Ok(RowView {
                            id: row.get(0)?,
                            label: row.get(1)?,
                            parent: row.get(2)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                views.push(SystemView {
                    name: label.filter(|l| !l.is_empty()).unwrap_or_else(|| name.clone()),
                    id: name,
                    granularity: Granularity::parse(&granularity),
                    rows,
                });
            }
            Ok(views)
        })
    }

    fn reset(&self) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            tx.execute_batch(
                "DELETE FROM matrix_cells;\
                 DELETE FROM rows;\
                 DELETE FROM systems;",
            )?;
            tx.commit()?;
            tracing::warn!("Matrix store reset");
            Ok(())
        })
    }
}
