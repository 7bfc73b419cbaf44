use crate::error::Result;
use crate::filter::LOWER_FN;
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::Path;

const MIGRATION_CATALOG_SQL: &str = include_str!("migrations/0000_catalog.sql");

/// Ordered list of schema migrations. Applied ids are recorded in
/// `schema_migrations` and never re-run.
const MIGRATIONS: &[(&str, &str)] = &[("0000_catalog", MIGRATION_CATALOG_SQL)];

/// Opens the catalog database at `path`, creating the parent directory and
/// bringing the schema up to date.
pub fn init_db(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir)?;
        }
    }

    let conn = connect(path)?;
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            id TEXT PRIMARY KEY NOT NULL,
            applied_at INTEGER NOT NULL
        );",
    )?;
    for (id, sql) in MIGRATIONS {
        apply_migration(&conn, id, sql)?;
    }
    Ok(conn)
}

/// Opens a connection on an already initialized database. Foreign keys are a
/// per-connection setting in SQLite, so cascades depend on this running for
/// every connection.
pub fn connect(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.create_scalar_function(
        LOWER_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value: Option<String> = ctx.get(0)?;
            Ok(value.map(|text| text.to_lowercase()))
        },
    )?;
    Ok(conn)
}

fn apply_migration(conn: &Connection, id: &str, sql: &str) -> Result<()> {
    let existing: Option<String> = conn
        .query_row(
            "SELECT id FROM schema_migrations WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    if existing.is_some() {
        return Ok(());
    }
    conn.execute_batch(sql)?;
    conn.execute(
        "INSERT INTO schema_migrations (id, applied_at) VALUES (?1, ?2)",
        params![id, chrono::Utc::now().timestamp_millis()],
    )?;
    log::info!("applied migration {}", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_db_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("catalog.db");
        init_db(&path).unwrap();
        let conn = init_db(&path).unwrap();
        let applied: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(applied, MIGRATIONS.len() as i64);
    }

    #[test]
    fn connections_lowercase_unicode() {
        let dir = TempDir::new().unwrap();
        let conn = init_db(&dir.path().join("catalog.db")).unwrap();
        let lowered: String = conn
            .query_row("SELECT unicode_lower('ÉL Ñandú')", [], |row| row.get(0))
            .unwrap();
        assert_eq!(lowered, "él ñandú");
        let null: Option<String> = conn
            .query_row("SELECT unicode_lower(NULL)", [], |row| row.get(0))
            .unwrap();
        assert_eq!(null, None);
    }

    #[test]
    fn stock_cannot_go_negative() {
        let dir = TempDir::new().unwrap();
        let conn = init_db(&dir.path().join("catalog.db")).unwrap();
        conn.execute("INSERT INTO publishers (name) VALUES ('P')", [])
            .unwrap();
        let result = conn.execute(
            "INSERT INTO books (publisher_id, title, publication_date, stock) \
             VALUES (1, 'T', '2020-01-01', -1)",
            [],
        );
        assert!(result.is_err());
    }
}
