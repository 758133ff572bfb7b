//! Shared scan types used across the workspace.
//!
//! Everything here is a transient snapshot of appliance state. Values are
//! fetched fresh on every query and never cached between calls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A scan folder as reported by `GET /scans`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanFolder {
    /// Display name, e.g. "My Scans"
    pub name: String,
    /// Folder identifier (identity of the folder)
    pub id: i64,
}

/// A scan together with the name of the folder it lives in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Scan name, assumed unique across the appliance
    pub name: String,
    /// Scan identifier used by the launch endpoint
    pub id: i64,
    /// Identifier of the containing folder
    pub folder_id: i64,
    /// Current status
    pub status: ScanStatus,
    /// Folder name resolved from `folder_id` at query time
    pub folder_name: Option<String>,
    /// Last modification time reported by the appliance
    pub last_modified: Option<DateTime<Utc>>,
}

/// Scan status as reported by the appliance.
///
/// The appliance owns this vocabulary, so the enum is open: any string not
/// listed here is kept verbatim in [`ScanStatus::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ScanStatus {
    /// Queued, not yet running
    Pending,
    /// Actively scanning
    Running,
    /// Stop requested
    Stopping,
    /// Pause requested
    Pausing,
    /// Paused
    Paused,
    /// Resume requested
    Resuming,
    /// Finished normally
    Completed,
    /// Aborted before finishing
    Aborted,
    /// Imported from a file, cannot be launched
    Imported,
    /// Canceled by a user
    Canceled,
    /// Never launched
    Empty,
    /// Any status this client does not know about
    Unknown(String),
}

impl ScanStatus {
    /// Statuses from which a launch request is refused.
    pub const NON_STARTABLE: [ScanStatus; 7] = [
        ScanStatus::Running,
        ScanStatus::Stopping,
        ScanStatus::Imported,
        ScanStatus::Pausing,
        ScanStatus::Paused,
        ScanStatus::Pending,
        ScanStatus::Resuming,
    ];

    /// String form used on the wire.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Pausing => "pausing",
            Self::Paused => "paused",
            Self::Resuming => "resuming",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
            Self::Imported => "imported",
            Self::Canceled => "canceled",
            Self::Empty => "empty",
            Self::Unknown(s) => s,
        }
    }

    /// Whether a scan in this status may be launched.
    #[must_use]
    pub fn is_startable(&self) -> bool {
        !Self::NON_STARTABLE.contains(self)
    }

    /// Whether the scan is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Any status other than running counts as terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !self.is_running()
    }
}

impl From<String> for ScanStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => Self::Pending,
            "running" => Self::Running,
            "stopping" => Self::Stopping,
            "pausing" => Self::Pausing,
            "paused" => Self::Paused,
            "resuming" => Self::Resuming,
            "completed" => Self::Completed,
            "aborted" => Self::Aborted,
            "imported" => Self::Imported,
            "canceled" => Self::Canceled,
            "empty" => Self::Empty,
            _ => Self::Unknown(s),
        }
    }
}

impl From<&str> for ScanStatus {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<ScanStatus> for String {
    fn from(status: ScanStatus) -> Self {
        match status {
            ScanStatus::Unknown(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
