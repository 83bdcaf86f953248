//! SQLite storage at `~/.leadbook/leadbook.db`.
//!
//! One table per collection, each with a `position` column that preserves
//! list order. `save` rewrites every table inside one `BEGIN IMMEDIATE`
//! transaction; a failure rolls back to the previous contents.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};

use super::{ensure_dir, DbError, Repository};
use crate::state::Snapshot;
use crate::types::{Activity, AiAnalysis, Client, Enquiry, FollowUp, Project};

pub struct SqliteRepository {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteRepository {
    /// Open (or create) the database at `path` and apply the schema.
    pub fn open_at(path: PathBuf) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }

        let conn = Connection::open(&path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        crate::migrations::run_migrations(&conn).map_err(DbError::Migration)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path),
        })
    }

    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        crate::migrations::run_migrations(&conn).map_err(DbError::Migration)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Execute a closure within a SQLite transaction.
    /// Commits on Ok, rolls back on Err.
    fn with_transaction<F, T>(conn: &Connection, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&Connection) -> Result<T, DbError>,
    {
        conn.execute_batch("BEGIN IMMEDIATE")?;
        match f(conn) {
            Ok(val) => {
                conn.execute_batch("COMMIT")?;
                Ok(val)
            }
            Err(e) => {
                let _ = conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }
}

impl Repository for SqliteRepository {
    fn load(&self) -> Result<Snapshot, DbError> {
        let conn = self.conn.lock();
        Ok(Snapshot {
            enquiries: load_enquiries(&conn)?,
            clients: load_clients(&conn)?,
            follow_ups: load_follow_ups(&conn)?,
            activities: load_activities(&conn)?,
            projects: load_projects(&conn)?,
        })
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), DbError> {
        let conn = self.conn.lock();
        Self::with_transaction(&conn, |conn| {
            conn.execute_batch(
                "DELETE FROM enquiries;
                 DELETE FROM clients;
                 DELETE FROM follow_ups;
                 DELETE FROM activities;
                 DELETE FROM projects;",
            )?;
            insert_enquiries(conn, &snapshot.enquiries)?;
            insert_clients(conn, &snapshot.clients)?;
            insert_follow_ups(conn, &snapshot.follow_ups)?;
            insert_activities(conn, &snapshot.activities)?;
            insert_projects(conn, &snapshot.projects)?;
            Ok(())
        })
    }

    fn describe(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => ":memory:".to_string(),
        }
    }

    /// Hot copy through SQLite's online backup API.
    fn backup_to(&self, dest: &Path) -> Result<(), DbError> {
        let conn = self.conn.lock();
        let mut backup_conn = Connection::open(dest)?;
        let backup = rusqlite::backup::Backup::new(&conn, &mut backup_conn)?;
        backup.step(-1)?;
        log::info!("Database backed up to {}", dest.display());
        Ok(())
    }
}

/// Read a text column through the type's `FromStr`.
fn parse_col<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_opt_col<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        s.parse()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

// =============================================================================
// Enquiries
// =============================================================================

fn load_enquiries(conn: &Connection) -> Result<Vec<Enquiry>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, phone, website, message, created_at, status,
                hold_reason, ai_is_relevant, ai_reason
         FROM enquiries ORDER BY position",
    )?;
    let rows = stmt.query_map([], |row| {
        let is_relevant: Option<bool> = row.get(9)?;
        let reason: Option<String> = row.get(10)?;
        Ok(Enquiry {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            phone: row.get(3)?,
            website: row.get(4)?,
            message: row.get(5)?,
            created_at: row.get(6)?,
            status: parse_col(row, 7)?,
            hold_reason: row.get(8)?,
            ai_analysis: is_relevant.map(|is_relevant| AiAnalysis {
                is_relevant,
                reason: reason.unwrap_or_default(),
            }),
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

fn insert_enquiries(conn: &Connection, enquiries: &[Enquiry]) -> Result<(), DbError> {
    let mut stmt = conn.prepare(
        "INSERT INTO enquiries (id, position, name, email, phone, website, message,
                                created_at, status, hold_reason, ai_is_relevant, ai_reason)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    )?;
    for (position, e) in enquiries.iter().enumerate() {
        stmt.execute(params![
            e.id,
            position as i64,
            e.name,
            e.email,
            e.phone,
            e.website,
            e.message,
            e.created_at,
            e.status.as_str(),
            e.hold_reason,
            e.ai_analysis.as_ref().map(|a| a.is_relevant),
            e.ai_analysis.as_ref().map(|a| a.reason.as_str()),
        ])?;
    }
    Ok(())
}

// =============================================================================
// Clients
// =============================================================================

fn load_clients(conn: &Connection) -> Result<Vec<Client>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, company, email, phone, status, lead_type, is_converted,
                industry, notes, website, joined_date, last_contact
         FROM clients ORDER BY position",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(Client {
            id: row.get(0)?,
            name: row.get(1)?,
            company: row.get(2)?,
            email: row.get(3)?,
            phone: row.get(4)?,
            status: parse_col(row, 5)?,
            lead_type: parse_opt_col(row, 6)?,
            is_converted: row.get(7)?,
            industry: row.get(8)?,
            notes: row.get(9)?,
            website: row.get(10)?,
            joined_date: row.get(11)?,
            last_contact: row.get(12)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

fn insert_clients(conn: &Connection, clients: &[Client]) -> Result<(), DbError> {
    let mut stmt = conn.prepare(
        "INSERT INTO clients (id, position, name, company, email, phone, status, lead_type,
                              is_converted, industry, notes, website, joined_date, last_contact)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
    )?;
    for (position, c) in clients.iter().enumerate() {
        stmt.execute(params![
            c.id,
            position as i64,
            c.name,
            c.company,
            c.email,
            c.phone,
            c.status.as_str(),
            c.lead_type.map(|t| t.as_str()),
            c.is_converted,
            c.industry,
            c.notes,
            c.website,
            c.joined_date,
            c.last_contact,
        ])?;
    }
    Ok(())
}

// =============================================================================
// Follow-ups
// =============================================================================

fn load_follow_ups(conn: &Connection) -> Result<Vec<FollowUp>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT id, client_id, title, description, due_date, status, priority
         FROM follow_ups ORDER BY position",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(FollowUp {
            id: row.get(0)?,
            client_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            due_date: parse_col(row, 4)?,
            status: parse_col(row, 5)?,
            priority: parse_col(row, 6)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

fn insert_follow_ups(conn: &Connection, follow_ups: &[FollowUp]) -> Result<(), DbError> {
    let mut stmt = conn.prepare(
        "INSERT INTO follow_ups (id, position, client_id, title, description, due_date,
                                 status, priority)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    for (position, f) in follow_ups.iter().enumerate() {
        stmt.execute(params![
            f.id,
            position as i64,
            f.client_id,
            f.title,
            f.description,
            f.due_date.to_string(),
            f.status.as_str(),
            f.priority.as_str(),
        ])?;
    }
    Ok(())
}

// =============================================================================
// Activities
// =============================================================================

fn load_activities(conn: &Connection) -> Result<Vec<Activity>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT id, client_id, kind, description, timestamp
         FROM activities ORDER BY position",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(Activity {
            id: row.get(0)?,
            client_id: row.get(1)?,
            kind: parse_col(row, 2)?,
            description: row.get(3)?,
            timestamp: row.get(4)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

fn insert_activities(conn: &Connection, activities: &[Activity]) -> Result<(), DbError> {
    let mut stmt = conn.prepare(
        "INSERT INTO activities (id, position, client_id, kind, description, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for (position, a) in activities.iter().enumerate() {
        stmt.execute(params![
            a.id,
            position as i64,
            a.client_id,
            a.kind.as_str(),
            a.description,
            a.timestamp,
        ])?;
    }
    Ok(())
}

// =============================================================================
// Projects
// =============================================================================

fn load_projects(conn: &Connection) -> Result<Vec<Project>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT id, client_id, name, status, category, priority, description,
                scope_document, budget, deadline, progress, created_at
         FROM projects ORDER BY position",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(Project {
            id: row.get(0)?,
            client_id: row.get(1)?,
            name: row.get(2)?,
            status: parse_col(row, 3)?,
            category: row.get(4)?,
            priority: parse_col(row, 5)?,
            description: row.get(6)?,
            scope_document: row.get(7)?,
            budget: row.get(8)?,
            deadline: row.get(9)?,
            progress: row.get(10)?,
            created_at: row.get(11)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

fn insert_projects(conn: &Connection, projects: &[Project]) -> Result<(), DbError> {
    let mut stmt = conn.prepare(
        "INSERT INTO projects (id, position, client_id, name, status, category, priority,
                               description, scope_document, budget, deadline, progress,
                               created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
    )?;
    for (position, p) in projects.iter().enumerate() {
        stmt.execute(params![
            p.id,
            position as i64,
            p.client_id,
            p.name,
            p.status.as_str(),
            p.category,
            p.priority.as_str(),
            p.description,
            p.scope_document,
            p.budget,
            p.deadline,
            p.progress,
            p.created_at,
        ])?;
    }
    Ok(())
}
