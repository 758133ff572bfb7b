//! Read-only queries over the appliance's folders and scans.
//!
//! Every call fetches a fresh `GET /scans`; nothing is cached, since the
//! lifecycle controller depends on observing current status.

use crate::client::{NessusApi, RawScan};
use crate::error::{ApiError, Result};
use nessus_core::{ScanFolder, ScanStatus, ScanSummary};
use std::sync::Arc;

/// Scan directory backed by a [`NessusApi`] implementation.
#[derive(Clone)]
pub struct ScanDirectory {
    api: Arc<dyn NessusApi>,
}

impl ScanDirectory {
    /// Create a directory over the given API client.
    #[must_use]
    pub fn new(api: Arc<dyn NessusApi>) -> Self {
        Self { api }
    }

    /// The underlying API client.
    #[must_use]
    pub fn api(&self) -> &Arc<dyn NessusApi> {
        &self.api
    }

    /// All scan folders.
    pub async fn list_folders(&self) -> Result<Vec<ScanFolder>> {
        let payload = self.api.list_scans().await?;
        Ok(payload.folders)
    }

    /// All scans with their folder names resolved.
    pub async fn list_scans(&self) -> Result<Vec<ScanSummary>> {
        let payload = self.api.list_scans().await?;
        let scans = payload.scans.unwrap_or_default();
        Ok(resolve_folder_names(scans, &payload.folders))
    }

    /// The scan whose name matches exactly. First match wins on duplicates.
    pub async fn find_scan(&self, name: &str) -> Result<ScanSummary> {
        self.list_scans()
            .await?
            .into_iter()
            .find(|scan| scan.name == name)
            .ok_or_else(|| ApiError::ScanNotFound(name.to_string()))
    }

    /// Current status of the named scan.
    pub async fn get_status(&self, name: &str) -> Result<ScanStatus> {
        Ok(self.find_scan(name).await?.status)
    }

    /// Fail with [`ApiError::ScanNotFound`] unless the scan exists.
    pub async fn assert_scan_exists(&self, name: &str) -> Result<()> {
        self.find_scan(name).await.map(|_| ())
    }
}

/// Join each scan's `folder_id` against the folder list.
///
/// The first folder with a matching id supplies the name; scans whose
/// folder is missing keep `folder_name: None`.
#[must_use]
pub fn resolve_folder_names(scans: Vec<RawScan>, folders: &[ScanFolder]) -> Vec<ScanSummary> {
    scans
        .into_iter()
        .map(|scan| {
            let folder_name = folders
                .iter()
                .find(|folder| folder.id == scan.folder_id)
                .map(|folder| folder.name.clone());

            ScanSummary {
                name: scan.name,
                id: scan.id,
                folder_id: scan.folder_id,
                status: scan.status,
                folder_name,
                last_modified: scan.last_modification_date,
            }
        })
        .collect()
}
