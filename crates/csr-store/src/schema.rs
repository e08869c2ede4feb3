use rusqlite::Connection;
use tracing::warn;

use crate::error::Result;

const CREATE_SCHEMA: &str = include_str!("../sql/create_schema.sql");

/// Latest schema version this build knows how to read and write.
pub const SCHEMA_LATEST_VERSION: u32 = 1;

/// Ordered `(target_version, script)` migrations applied when an opened
/// database's version is older than [`SCHEMA_LATEST_VERSION`]. Empty today;
/// the first schema change lands as `(2, include_str!("../sql/migrate_2.sql"))`.
const MIGRATIONS: &[(u32, &str)] = &[];

fn read_version(conn: &Connection) -> Option<u32> {
    let exists: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'SCHEMA_INFO'",
            [],
            |_| Ok(true),
        )
        .unwrap_or(false);
    if !exists {
        return None;
    }
    conn.query_row("SELECT value FROM SCHEMA_INFO WHERE name = 'version'", [], |row| {
        row.get::<_, String>(0)
    })
    .ok()
    .and_then(|v| v.parse().ok())
}

fn drop_all_tables(conn: &Connection) -> Result<()> {
    for table in ["SCHEMA_INFO", "ENGINE_STATE", "SCAN_REQUEST", "DETECTED_MALWARE_FILE", "NAME", "WORST"] {
        conn.execute(&format!("DROP TABLE IF EXISTS {table}"), [])?;
    }
    Ok(())
}

fn create_fresh(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_SCHEMA)?;
    Ok(())
}

fn set_version(conn: &Connection, version: u32) -> Result<()> {
    conn.execute(
        "INSERT INTO SCHEMA_INFO (name, value) VALUES ('version', ?1)
         ON CONFLICT(name) DO UPDATE SET value = excluded.value",
        [version.to_string()],
    )?;
    Ok(())
}

/// Brings `conn` up to [`SCHEMA_LATEST_VERSION`]: an absent version runs
/// the fresh schema, an older version runs migrations in order, and a
/// corrupt or newer-than-known version drops and recreates.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    match read_version(conn) {
        None => create_fresh(conn),
        Some(v) if v == SCHEMA_LATEST_VERSION => Ok(()),
        Some(v) if v < SCHEMA_LATEST_VERSION => {
            for (target, script) in MIGRATIONS {
                if *target > v {
                    conn.execute_batch(script)?;
                    set_version(conn, *target)?;
                }
            }
            Ok(())
        }
        Some(v) => {
            warn!(found = v, latest = SCHEMA_LATEST_VERSION, "schema newer than this build understands, recreating");
            drop_all_tables(conn)?;
            create_fresh(conn)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_database_gets_schema() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        assert_eq!(read_version(&conn), Some(SCHEMA_LATEST_VERSION));
    }

    #[test]
    fn newer_unknown_version_is_recreated() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        set_version(&conn, SCHEMA_LATEST_VERSION + 99).unwrap();
        ensure_schema(&conn).unwrap();
        assert_eq!(read_version(&conn), Some(SCHEMA_LATEST_VERSION));
    }

    #[test]
    fn ensure_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();
        assert_eq!(read_version(&conn), Some(SCHEMA_LATEST_VERSION));
    }
}
