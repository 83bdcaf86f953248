//! Schema migrations for the SQLite backend.
//!
//! Numbered SQL migrations are embedded at compile time via `include_str!`.
//! Each migration runs exactly once, tracked by the `schema_version` table.

use rusqlite::Connection;

struct Migration {
    version: i32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("migrations/001_baseline.sql"),
}];

fn ensure_schema_version_table(conn: &Connection) -> Result<(), String> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .map_err(|e| format!("Failed to create schema_version table: {}", e))
}

/// Highest applied migration version, or 0 if none.
fn current_version(conn: &Connection) -> Result<i32, String> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| format!("Failed to read schema version: {}", e))
}

/// Hot copy to `<db_path>.pre-migration.bak` via the online backup API.
/// Skipped for in-memory databases and for a database with nothing applied
/// yet.
fn backup_before_migration(conn: &Connection, current: i32) -> Result<(), String> {
    if current == 0 {
        return Ok(());
    }

    let db_path: String = conn
        .query_row("PRAGMA database_list", [], |row| row.get(2))
        .map_err(|e| format!("Failed to get database path: {}", e))?;

    if db_path.is_empty() || db_path == ":memory:" {
        return Ok(());
    }

    let backup_path = format!("{}.pre-migration.bak", db_path);
    let mut backup_conn = Connection::open(&backup_path)
        .map_err(|e| format!("Failed to open backup file: {}", e))?;

    let backup = rusqlite::backup::Backup::new(conn, &mut backup_conn)
        .map_err(|e| format!("Failed to initialize pre-migration backup: {}", e))?;

    backup
        .step(-1)
        .map_err(|e| format!("Pre-migration backup failed: {}", e))?;

    log::info!("Pre-migration backup created at {}", backup_path);
    Ok(())
}

/// Run all pending migrations. Returns the number applied.
///
/// A database with a higher version than this build knows about is rejected
/// rather than written to.
pub fn run_migrations(conn: &Connection) -> Result<usize, String> {
    ensure_schema_version_table(conn)?;

    let current = current_version(conn)?;
    let max_known = MIGRATIONS.last().map(|m| m.version).unwrap_or(0);

    if current > max_known {
        return Err(format!(
            "Database schema version ({}) is newer than this build of leadbook supports ({}). \
             Please upgrade leadbook.",
            current, max_known
        ));
    }

    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > current).collect();
    if pending.is_empty() {
        return Ok(0);
    }

    backup_before_migration(conn, current)?;

    for migration in &pending {
        conn.execute_batch(migration.sql)
            .map_err(|e| format!("Migration v{} failed: {}", migration.version, e))?;

        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [migration.version],
        )
        .map_err(|e| format!("Failed to record migration v{}: {}", migration.version, e))?;

        log::info!("Applied migration v{}", migration.version);
    }

    Ok(pending.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mem_db() -> Connection {
        Connection::open_in_memory().expect("in-memory db")
    }

    #[test]
    fn test_fresh_db_applies_baseline() {
        let conn = mem_db();
        let applied = run_migrations(&conn).expect("migrations should succeed");
        assert_eq!(applied, 1);
        assert_eq!(current_version(&conn).expect("version"), 1);

        for table in ["enquiries", "clients", "follow_ups", "activities", "projects"] {
            let count: i32 = conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
                .expect("table should exist");
            assert_eq!(count, 0, "{table} should start empty");
        }
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = mem_db();
        run_migrations(&conn).expect("first run");
        assert_eq!(run_migrations(&conn).expect("second run"), 0);
    }

    #[test]
    fn test_follow_ups_have_no_client_foreign_key() {
        let conn = mem_db();
        run_migrations(&conn).expect("migrations");
        conn.execute(
            "INSERT INTO follow_ups (id, position, client_id, title, due_date, status, priority)
             VALUES ('f1', 0, 'deleted-client', 'Call', '2023-11-20', 'pending', 'High')",
            [],
        )
        .expect("orphaned follow-up should be accepted");
    }

    #[test]
    fn test_newer_schema_is_rejected() {
        let conn = mem_db();
        run_migrations(&conn).expect("migrations");
        conn.execute("INSERT INTO schema_version (version) VALUES (99)", [])
            .expect("insert");
        let err = run_migrations(&conn).unwrap_err();
        assert!(err.contains("newer"));
    }
}
