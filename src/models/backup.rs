//! Backup model: a started Firestore export.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    /// Name of the long-running export operation
    #[serde(rename = "backupID")]
    pub backup_id: String,
    /// Object storage prefix the export writes under
    pub backup_prefix: String,
}
