// ABOUTME: Data structures for job documents returned by the media service
// ABOUTME: Decoding doubles as schema validation; closed enums reject unknown states

use serde::Deserialize;

use crate::error::PollerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Ready,
    Started,
    VidinetJob,
    Finished,
    FinishedWarning,
    FailedTotal,
    Waiting,
    AbortedPending,
    Aborted,
}

impl JobStatus {
    /// No further progress updates are expected once a job is in one of these.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Finished
                | JobStatus::FinishedWarning
                | JobStatus::FailedTotal
                | JobStatus::AbortedPending
                | JobStatus::Aborted
        )
    }

    pub fn is_success(self) -> bool {
        matches!(self, JobStatus::Finished | JobStatus::FinishedWarning)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobType {
    Import,
    PlaceholderImport,
    RawImport,
    AutoImport,
    ShapeImport,
    SidecarImport,
    EssenceVersion,
    Transcode,
    Conform,
    Timeline,
    Thumbnail,
    ShapeUpdate,
    CopyFile,
    MoveFile,
    DeleteFile,
    Export,
    MetadataExport,
    DeleteItem,
    Analyze,
    ListItems,
    FileAnalyze,
    ExportLocation,
    ShapeAnalyze,
    Transfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobPriority {
    Lowest,
    Low,
    Medium,
    High,
    Highest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    None,
    Ready,
    Started,
    StartedAsynchronous,
    StartedParallel,
    StartedParallelAsynchronous,
    StartedSubtasks,
    Finished,
    FailedRetry,
    FailedFatal,
    FailedTotal,
    Waiting,
    Disappeared,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StepProgress {
    pub value: f64,
    pub total: Option<f64>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobStep {
    pub description: Option<String>,
    pub number: Option<i64>,
    pub status: Option<StepStatus>,
    pub progress: Option<StepProgress>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MetadataEntry {
    pub key: String,
    pub value: String,
}

/// One observation of a remote job. Replaced wholesale on every poll.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    pub job_id: String,
    pub status: JobStatus,
    pub priority: JobPriority,
    #[serde(rename = "type")]
    pub job_type: Option<JobType>,
    pub user: Option<String>,
    pub started: Option<String>,
    pub current_step: Option<JobStep>,
    #[serde(default)]
    pub total_steps: i64,
    #[serde(rename = "data")]
    pub metadata_entries: Option<Vec<MetadataEntry>>,
}

impl JobSnapshot {
    pub fn from_value(value: serde_json::Value) -> Result<Self, PollerError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_slice(body: &[u8]) -> Result<Self, PollerError> {
        Ok(serde_json::from_slice(body)?)
    }

    pub fn did_finish(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn was_success(&self) -> bool {
        self.status.is_success()
    }

    /// First metadata value stored under `key`.
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata_entries
            .as_ref()?
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.value.as_str())
    }

    /// All values stored under `key`, in document order.
    ///
    /// Returns `None` only when the job carries no metadata list at all; a list
    /// without matches yields an empty vector.
    pub fn metadata_all(&self, key: &str) -> Option<Vec<&str>> {
        let entries = self.metadata_entries.as_ref()?;
        Some(
            entries
                .iter()
                .filter(|entry| entry.key == key)
                .map(|entry| entry.value.as_str())
                .collect(),
        )
    }
}
