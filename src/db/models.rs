use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Which of the two record tables an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Success,
    Failure,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Success => "success",
            RecordKind::Failure => "failure",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(RecordKind::Success),
            "failure" => Ok(RecordKind::Failure),
            _ => Err(()),
        }
    }
}

/// Image column selector. Anything other than `doctor` means the signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Doctor,
    Signature,
}

impl ImageKind {
    pub fn from_param(param: &str) -> Self {
        if param == "doctor" {
            ImageKind::Doctor
        } else {
            ImageKind::Signature
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageKind::Doctor => "doctor",
            ImageKind::Signature => "signature",
        }
    }
}

/// Provenance and images shared by both tables on insert.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub user_ip: String,
    pub user_agent: Option<String>,
    pub user_name: String,
    pub original_image: String,
    pub doctor_image: String,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessSummary {
    pub id: i64,
    pub user_ip: String,
    pub user_agent: Option<String>,
    pub user_name: String,
    pub analysis_text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureSummary {
    pub id: i64,
    pub user_ip: String,
    pub user_agent: Option<String>,
    pub user_name: String,
    pub error_message: String,
    pub created_at: DateTime<Utc>,
}

/// Image columns plus the outcome text of a single record.
#[derive(Debug, Clone, FromRow)]
pub struct RecordDetail {
    pub id: i64,
    pub user_name: String,
    pub original_image: String,
    pub doctor_image: String,
    pub outcome_text: String,
}

impl RecordDetail {
    pub fn image(&self, kind: ImageKind) -> &str {
        match kind {
            ImageKind::Doctor => &self.doctor_image,
            ImageKind::Signature => &self.original_image,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct DashboardStats {
    pub total: i64,
    pub success: i64,
    pub failure: i64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadStats {
    pub total_uploads: i64,
    pub today_uploads: i64,
}
