use serde::{Deserialize, Serialize};

use crate::response::UserResponse;
use crate::severity::Severity;

/// Immutable verdict emitted by the content-screening engine adapter for a
/// single scanned artifact (data buffer, file, or application).
///
/// `target_name` is empty for data scans; `pkg_id` is only populated for
/// application-scoped detections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detected {
    pub target_name: String,
    pub malware_name: String,
    pub detailed_url: String,
    pub severity: Severity,
    /// Unix seconds, set at the moment of detection.
    pub ts: i64,
    pub is_app: bool,
    pub pkg_id: String,
    pub user_response: UserResponse,
}

impl Detected {
    /// A detection with no target, as produced by `scan_data`.
    pub fn for_data(malware_name: impl Into<String>, detailed_url: impl Into<String>, severity: Severity, ts: i64) -> Self {
        Self {
            target_name: String::new(),
            malware_name: malware_name.into(),
            detailed_url: detailed_url.into(),
            severity,
            ts,
            is_app: false,
            pkg_id: String::new(),
            user_response: UserResponse::NotAsked,
        }
    }

    pub fn for_file(
        target_name: impl Into<String>,
        malware_name: impl Into<String>,
        detailed_url: impl Into<String>,
        severity: Severity,
        ts: i64,
    ) -> Self {
        Self {
            target_name: target_name.into(),
            malware_name: malware_name.into(),
            detailed_url: detailed_url.into(),
            severity,
            ts,
            is_app: false,
            pkg_id: String::new(),
            user_response: UserResponse::NotAsked,
        }
    }

    pub fn is_data_scan(&self) -> bool {
        self.target_name.is_empty()
    }
}

/// A persisted detection, superset of [`Detected`] plus store-only fields
/// tracked by the history table: whether it's ignored, which engine data
/// version produced it, and whether the verdict came from the cloud.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub detected: Detected,
    /// Path of the riskiest file inside a multi-file app scan; empty
    /// otherwise.
    pub file_in_app_path: String,
    pub is_ignored: bool,
    /// Engine data-version string at the time of detection.
    pub data_version: String,
    pub by_cloud: bool,
}

impl HistoryRow {
    pub fn new(detected: Detected, data_version: impl Into<String>) -> Self {
        Self {
            detected,
            file_in_app_path: String::new(),
            is_ignored: false,
            data_version: data_version.into(),
            by_cloud: false,
        }
    }

    pub fn target_name(&self) -> &str {
        &self.detected.target_name
    }

    pub fn severity(&self) -> Severity {
        self.detected.severity
    }

    pub fn with_file_in_app_path(mut self, path: impl Into<String>) -> Self {
        self.file_in_app_path = path.into();
        self
    }

    pub fn with_ignored(mut self, ignored: bool) -> Self {
        self.is_ignored = ignored;
        self
    }

    pub fn with_by_cloud(mut self, by_cloud: bool) -> Self {
        self.by_cloud = by_cloud;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_scan_has_empty_target() {
        let d = Detected::for_data("test_risk", "", Severity::Medium, 100);
        assert!(d.is_data_scan());
    }

    #[test]
    fn file_scan_has_target() {
        let d = Detected::for_file("/tmp/m", "test_malware", "http://high.malware.com", Severity::High, 1);
        assert!(!d.is_data_scan());
        assert_eq!(d.target_name, "/tmp/m");
    }

    #[test]
    fn history_row_builder() {
        let d = Detected::for_file("/tmp/m", "x", "", Severity::High, 1);
        let row = HistoryRow::new(d, "v1").with_ignored(true);
        assert!(row.is_ignored);
        assert_eq!(row.data_version, "v1");
        assert_eq!(row.target_name(), "/tmp/m");
    }
}
