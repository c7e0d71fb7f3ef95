//! Order file attachment domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Who a stored file is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    /// Artwork or proofs shared with the client.
    Cliente,
    /// Internal production files.
    Interno,
}

impl FileCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Cliente => "cliente",
            FileCategory::Interno => "interno",
        }
    }
}

impl FromStr for FileCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cliente" => Ok(FileCategory::Cliente),
            "interno" => Ok(FileCategory::Interno),
            _ => Err(format!("Invalid file category: {}", s)),
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metadata row for a stored blob.
///
/// `order_id` is `None` for files in the general (non-order) pool. The blob
/// itself lives with the storage collaborator under `file_path`; deletion is
/// a compensating two-step (blob first, then this row).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFile {
    pub id: Uuid,
    pub order_id: Option<Uuid>,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    /// MIME type.
    pub file_type: String,
    pub category: FileCategory,
    pub uploaded_by: Uuid,
    pub created_at: DateTime<Utc>,
}
