use std::path::Path;
use std::sync::Mutex;

use csr_model::{Detected, HistoryRow, Severity, UserResponse};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{Result, StoreError};
use crate::schema::ensure_schema;

fn severity_to_i64(s: Severity) -> i64 {
    match s {
        Severity::Low => 0,
        Severity::Medium => 1,
        Severity::High => 2,
    }
}

fn severity_from_i64(v: i64) -> Severity {
    match v {
        0 => Severity::Low,
        1 => Severity::Medium,
        _ => Severity::High,
    }
}

fn row_to_history(row: &Row<'_>) -> rusqlite::Result<HistoryRow> {
    let path: String = row.get("path")?;
    let detected = Detected {
        target_name: path,
        malware_name: row.get("malware_name")?,
        detailed_url: row.get("detailed_url")?,
        severity: severity_from_i64(row.get("severity")?),
        ts: row.get("detected_time")?,
        is_app: row.get::<_, i64>("threat")? != 0,
        pkg_id: row.get("pkg_id")?,
        user_response: UserResponse::NotAsked,
    };
    Ok(HistoryRow {
        detected,
        file_in_app_path: row.get("file_in_app_path")?,
        is_ignored: row.get::<_, i64>("ignored")? != 0,
        data_version: row.get("data_version")?,
        by_cloud: row.get::<_, i64>("by_cloud")? != 0,
    })
}

/// SQLite-backed persistence for detection history, scan-time watermarks,
/// and engine enable/disable state.
///
/// Guarded by a single `Mutex` — a process-wide mutex suffices since this
/// store is not a hot path.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        ensure_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// In-memory store for tests and `csrd check-config`-style dry runs.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        ensure_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Drops and recreates every table ( `resetDatabase`).
    pub fn reset_database(&self) -> Result<()> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        for table in ["SCHEMA_INFO", "ENGINE_STATE", "SCAN_REQUEST", "DETECTED_MALWARE_FILE", "NAME", "WORST"] {
            conn.execute(&format!("DROP TABLE IF EXISTS {table}"), [])?;
        }
        ensure_schema(&conn)
    }

    /// Inserts or overwrites the history row for `row.target_name()`, and
    /// if the detection is app-scoped, updates the per-package riskiest
    /// cache (invariant 3).
    pub fn upsert_history_row(&self, row: &HistoryRow) -> Result<()> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            "INSERT INTO DETECTED_MALWARE_FILE
                (path, data_version, severity, threat, malware_name, detailed_url,
                 detected_time, ignored, pkg_id, file_in_app_path, by_cloud)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(path) DO UPDATE SET
                data_version = excluded.data_version,
                severity = excluded.severity,
                threat = excluded.threat,
                malware_name = excluded.malware_name,
                detailed_url = excluded.detailed_url,
                detected_time = excluded.detected_time,
                ignored = excluded.ignored,
                pkg_id = excluded.pkg_id,
                file_in_app_path = excluded.file_in_app_path,
                by_cloud = excluded.by_cloud",
            params![
                row.target_name(),
                row.data_version,
                severity_to_i64(row.severity()),
                row.detected.is_app as i64,
                row.detected.malware_name,
                row.detected.detailed_url,
                row.detected.ts,
                row.is_ignored as i64,
                row.detected.pkg_id,
                row.file_in_app_path,
                row.by_cloud as i64,
            ],
        )?;

        if row.detected.is_app && !row.detected.pkg_id.is_empty() {
            update_worst_cache(&conn, &row.detected.pkg_id, row)?;
        }

        Ok(())
    }

    /// Non-ignored history row for an exact target, or `None`.
    pub fn get_detected(&self, target_name: &str) -> Result<Option<HistoryRow>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.query_row(
            "SELECT * FROM DETECTED_MALWARE_FILE WHERE path = ?1 AND ignored = 0",
            [target_name],
            row_to_history,
        )
        .optional()
        .map_err(StoreError::from)
    }

    /// All non-ignored history rows whose target lies under `dir_prefix`.
    pub fn get_detected_list(&self, dir_prefix: &str) -> Result<Vec<HistoryRow>> {
        self.list_by_prefix(dir_prefix, false)
    }

    /// Ignored history row for an exact target, or `None`.
    pub fn get_ignored(&self, target_name: &str) -> Result<Option<HistoryRow>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.query_row(
            "SELECT * FROM DETECTED_MALWARE_FILE WHERE path = ?1 AND ignored = 1",
            [target_name],
            row_to_history,
        )
        .optional()
        .map_err(StoreError::from)
    }

    /// All ignored history rows whose target lies under `dir_prefix`.
    pub fn get_ignored_list(&self, dir_prefix: &str) -> Result<Vec<HistoryRow>> {
        self.list_by_prefix(dir_prefix, true)
    }

    fn list_by_prefix(&self, dir_prefix: &str, ignored: bool) -> Result<Vec<HistoryRow>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let like_pattern = format!("{}%", dir_prefix.replace('%', "\\%").replace('_', "\\_"));
        let mut stmt = conn.prepare(
            "SELECT * FROM DETECTED_MALWARE_FILE WHERE path LIKE ?1 ESCAPE '\\' AND ignored = ?2",
        )?;
        let rows = stmt
            .query_map(params![like_pattern, ignored as i64], row_to_history)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Flips the ignore flag for an existing row. Errors with
    /// `StoreError::NotFound` if no row exists for `target_name`.
    pub fn set_ignored(&self, target_name: &str, ignored: bool) -> Result<()> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let changed = conn.execute(
            "UPDATE DETECTED_MALWARE_FILE SET ignored = ?1 WHERE path = ?2",
            params![ignored as i64, target_name],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(target_name.to_string()));
        }
        Ok(())
    }

    /// Deletes the history row for `target_name` (judge/remove action).
    /// Errors with `StoreError::NotFound` if no row exists.
    pub fn remove_detected(&self, target_name: &str) -> Result<()> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let changed = conn.execute("DELETE FROM DETECTED_MALWARE_FILE WHERE path = ?1", [target_name])?;
        if changed == 0 {
            return Err(StoreError::NotFound(target_name.to_string()));
        }
        Ok(())
    }

    /// Removes rows under `dir` whose `data_version` differs from
    /// `current_data_version`, so a rescan after an engine update doesn't
    /// leave stale rows behind. Returns the number of rows removed.
    pub fn delete_detected_deprecated(&self, dir: &str, current_data_version: &str) -> Result<usize> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let like_pattern = format!("{}%", dir.replace('%', "\\%").replace('_', "\\_"));
        let changed = conn.execute(
            "DELETE FROM DETECTED_MALWARE_FILE WHERE path LIKE ?1 ESCAPE '\\' AND data_version != ?2",
            params![like_pattern, current_data_version],
        )?;
        Ok(changed)
    }

    /// The riskiest currently-known detection for a package, per the
    /// `WORST` cache, re-read from `DETECTED_MALWARE_FILE` by its
    /// `file_in_app_path` so the returned row reflects the latest state.
    pub fn riskiest_for_app(&self, pkg_id: &str) -> Result<Option<HistoryRow>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let file_in_app_path: Option<String> = conn
            .query_row("SELECT file_in_app_path FROM WORST WHERE pkg_id = ?1", [pkg_id], |r| r.get(0))
            .optional()?;
        let Some(path) = file_in_app_path else {
            return Ok(None);
        };
        drop(conn);
        match self.get_detected(&path)? {
            Some(row) => Ok(Some(row)),
            None => self.get_ignored(&path),
        }
    }

    pub fn last_scan_time(&self, dir: &str, data_version: &str) -> Result<Option<i64>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.query_row(
            "SELECT last_scan FROM SCAN_REQUEST WHERE dir = ?1 AND data_version = ?2",
            params![dir, data_version],
            |r| r.get(0),
        )
        .optional()
        .map_err(StoreError::from)
    }

    pub fn set_last_scan_time(&self, dir: &str, data_version: &str, ts: i64) -> Result<()> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            "INSERT INTO SCAN_REQUEST (dir, data_version, last_scan) VALUES (?1, ?2, ?3)
             ON CONFLICT(dir, data_version) DO UPDATE SET last_scan = excluded.last_scan",
            params![dir, data_version, ts],
        )?;
        Ok(())
    }

    pub fn engine_state(&self, engine_id: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.query_row("SELECT state FROM ENGINE_STATE WHERE id = ?1", [engine_id], |r| r.get(0))
            .optional()
            .map_err(StoreError::from)
    }

    pub fn set_engine_state(&self, engine_id: &str, state: &str) -> Result<()> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            "INSERT INTO ENGINE_STATE (id, state) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET state = excluded.state",
            params![engine_id, state],
        )?;
        Ok(())
    }
}

fn update_worst_cache(conn: &Connection, pkg_id: &str, candidate: &HistoryRow) -> Result<()> {
    let current: Option<(i64, String)> = conn
        .query_row(
            "SELECT d.severity, w.file_in_app_path
             FROM WORST w JOIN DETECTED_MALWARE_FILE d ON d.path = w.file_in_app_path
             WHERE w.pkg_id = ?1",
            [pkg_id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;

    let candidate_path = if candidate.file_in_app_path.is_empty() {
        candidate.target_name().to_string()
    } else {
        candidate.file_in_app_path.clone()
    };
    let candidate_severity = severity_to_i64(candidate.severity());

    let should_replace = match &current {
        None => true,
        Some((worst_severity, _)) => candidate_severity >= *worst_severity,
    };
    if !should_replace {
        return Ok(());
    }

    conn.execute(
        "INSERT INTO WORST (pkg_id, name, file_in_app_path) VALUES (?1, ?2, ?3)
         ON CONFLICT(pkg_id) DO UPDATE SET name = excluded.name, file_in_app_path = excluded.file_in_app_path",
        params![pkg_id, candidate.detected.malware_name, candidate_path],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row(target: &str, severity: Severity) -> HistoryRow {
        let d = Detected::for_file(target, "eicar", "http://x", severity, 100);
        HistoryRow::new(d, "v1")
    }

    #[test]
    fn upsert_and_get_detected() {
        let store = Store::in_memory().unwrap();
        store.upsert_history_row(&sample_row("/tmp/a", Severity::High)).unwrap();

        let got = store.get_detected("/tmp/a").unwrap().unwrap();
        assert_eq!(got.target_name(), "/tmp/a");
        assert_eq!(got.severity(), Severity::High);
    }

    #[test]
    fn ignored_rows_are_excluded_from_get_detected() {
        let store = Store::in_memory().unwrap();
        let row = sample_row("/tmp/a", Severity::Medium).with_ignored(true);
        store.upsert_history_row(&row).unwrap();

        assert!(store.get_detected("/tmp/a").unwrap().is_none());
        assert!(store.get_ignored("/tmp/a").unwrap().is_some());
    }

    #[test]
    fn set_ignored_on_missing_row_errors() {
        let store = Store::in_memory().unwrap();
        let err = store.set_ignored("/nope", true).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn list_by_prefix_matches_directory_subtree() {
        let store = Store::in_memory().unwrap();
        store.upsert_history_row(&sample_row("/tmp/dir/a", Severity::Low)).unwrap();
        store.upsert_history_row(&sample_row("/tmp/dir/b", Severity::Low)).unwrap();
        store.upsert_history_row(&sample_row("/tmp/other/c", Severity::Low)).unwrap();

        let list = store.get_detected_list("/tmp/dir/").unwrap();
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn delete_deprecated_removes_stale_data_version_rows() {
        let store = Store::in_memory().unwrap();
        let d = Detected::for_file("/tmp/d/a", "x", "", Severity::Low, 1);
        store.upsert_history_row(&HistoryRow::new(d, "v1")).unwrap();

        let removed = store.delete_detected_deprecated("/tmp/d/", "v2").unwrap();
        assert_eq!(removed, 1);
        assert!(store.get_detected("/tmp/d/a").unwrap().is_none());
    }

    #[test]
    fn remove_detected_on_missing_row_errors() {
        let store = Store::in_memory().unwrap();
        let err = store.remove_detected("/nope").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn worst_cache_tracks_riskiest_app_file() {
        let store = Store::in_memory().unwrap();
        let mut low = Detected::for_file("/app/root/lib/a.so", "low_risk", "", Severity::Low, 1);
        low.is_app = true;
        low.pkg_id = "com.example.app".into();
        let mut low_row = HistoryRow::new(low, "v1");
        low_row.file_in_app_path = "/app/root/lib/a.so".into();
        store.upsert_history_row(&low_row).unwrap();

        let mut high = Detected::for_file("/app/root/lib/b.so", "high_risk", "", Severity::High, 2);
        high.is_app = true;
        high.pkg_id = "com.example.app".into();
        let mut high_row = HistoryRow::new(high, "v1");
        high_row.file_in_app_path = "/app/root/lib/b.so".into();
        store.upsert_history_row(&high_row).unwrap();

        let worst = store.riskiest_for_app("com.example.app").unwrap().unwrap();
        assert_eq!(worst.severity(), Severity::High);
        assert_eq!(worst.target_name(), "/app/root/lib/b.so");
    }

    #[test]
    fn scan_time_round_trips() {
        let store = Store::in_memory().unwrap();
        assert!(store.last_scan_time("/tmp", "v1").unwrap().is_none());
        store.set_last_scan_time("/tmp", "v1", 12345).unwrap();
        assert_eq!(store.last_scan_time("/tmp", "v1").unwrap(), Some(12345));
    }

    #[test]
    fn engine_state_round_trips() {
        let store = Store::in_memory().unwrap();
        assert!(store.engine_state("content").unwrap().is_none());
        store.set_engine_state("content", "enabled").unwrap();
        assert_eq!(store.engine_state("content").unwrap(), Some("enabled".to_string()));
    }

    #[test]
    fn reset_database_clears_all_rows() {
        let store = Store::in_memory().unwrap();
        store.upsert_history_row(&sample_row("/tmp/a", Severity::High)).unwrap();
        store.set_engine_state("content", "enabled").unwrap();

        store.reset_database().unwrap();

        assert!(store.get_detected("/tmp/a").unwrap().is_none());
        assert!(store.engine_state("content").unwrap().is_none());
    }
}
