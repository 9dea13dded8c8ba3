use crate::domain::task::{TaskId, UserId};
use crate::error::{Result, ValidationErrors};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type SubmissionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
}

/// Proof attached to a submission: the stored screenshot URL and an optional
/// link to the social post it documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub screenshot_url: String,
    pub social_url: Option<String>,
}

/// One user's claim of having completed one task, pending review.
///
/// At most one submission exists per (user, task) pair, and the status leaves
/// `Pending` exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub user_id: UserId,
    pub task_id: TaskId,
    pub evidence: Evidence,
    pub status: SubmissionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const MAX_SCREENSHOT_BYTES: usize = 2 * 1024 * 1024;
const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Raw screenshot upload as received from the transport layer, validated
/// before it is handed to the media store.
#[derive(Debug, Clone)]
pub struct ScreenshotUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ScreenshotUpload {
    pub fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::new();
        if self.bytes.is_empty() {
            errors.push("screenshot", "file is required");
        }
        if self.bytes.len() > MAX_SCREENSHOT_BYTES {
            errors.push("screenshot", "file exceeds the 2 MiB limit");
        }
        match self.extension() {
            Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => {}
            _ => errors.push("screenshot", "must be a jpg, jpeg or png image"),
        }
        errors.into_result()
    }

    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }
}
