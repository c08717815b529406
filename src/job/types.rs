//! Job and artifact types shared across the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// One step of the generation pipeline.
///
/// Stages run strictly in declaration order; `Compose` assembles the
/// outputs of the four generation stages into the final video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Script,
    Voice,
    Music,
    Video,
    Compose,
}

impl Stage {
    /// Key under which this stage's artifact is recorded.
    ///
    /// The compose stage produces the `final` artifact.
    pub fn artifact_key(&self) -> &'static str {
        match self {
            Stage::Script => "script",
            Stage::Voice => "voice",
            Stage::Music => "music",
            Stage::Video => "video",
            Stage::Compose => "final",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Script => "script",
            Stage::Voice => "voice",
            Stage::Music => "music",
            Stage::Video => "video",
            Stage::Compose => "compose",
        };
        write!(f, "{}", name)
    }
}

/// Lifecycle state of a job.
///
/// `Completed` and `Failed` are terminal: no transition leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// What kind of media an artifact holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Text,
    Audio,
    Video,
}

/// Handle to one generated media unit.
///
/// Immutable once created; owned by the job that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    /// Measured duration in seconds; audio and video kinds only.
    pub duration_secs: Option<f64>,
    /// Provider that produced the artifact.
    pub provider: String,
    /// Prompt sent to the provider.
    pub prompt: String,
}

/// Structured failure recorded on a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobError {
    pub stage: Stage,
    pub message: String,
}

/// Parameters of a creation request, validated at submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRequest {
    pub topic: String,
    pub target_duration_secs: u64,
    pub captions: bool,
    /// Provider voice id; the voice stage picks one automatically if absent.
    pub voice: Option<String>,
}

impl CreateRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            target_duration_secs: crate::defaults::TARGET_DURATION_SECS,
            captions: true,
            voice: None,
        }
    }
}

/// One user request's full lifecycle.
///
/// Mutated exclusively by the task driving the job; everyone else reads
/// clones taken from the [`JobStore`](crate::job::JobStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub request: CreateRequest,
    pub status: JobStatus,
    /// 0–100, non-decreasing while processing; 100 iff completed.
    pub progress: u8,
    /// Artifacts of stages that completed successfully, keyed by
    /// `script|voice|music|video|final`. Entries are never removed.
    pub artifacts: BTreeMap<String, Artifact>,
    /// Present iff the job failed.
    pub error: Option<JobError>,
    pub created_at: DateTime<Utc>,
    /// Stamped exactly once, on the terminal transition.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(request: CreateRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
            status: JobStatus::Queued,
            progress: 0,
            artifacts: BTreeMap::new(),
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// The recorded final artifact, if the job completed.
    pub fn final_artifact(&self) -> Option<&Artifact> {
        self.artifacts.get(Stage::Compose.artifact_key())
    }

    /// Cheap client-visible view of this job.
    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            id: self.id,
            topic: self.request.topic.clone(),
            status: self.status,
            progress: self.progress,
            artifacts: self
                .artifacts
                .iter()
                .map(|(k, a)| (k.clone(), a.path.display().to_string()))
                .collect(),
            error: self.error.clone(),
            created_at: self.created_at,
            completed_at: self.completed_at,
        }
    }
}

/// Serializable job view sent to polling clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: Uuid,
    pub topic: String,
    pub status: JobStatus,
    pub progress: u8,
    /// Stage name → artifact path.
    pub artifacts: BTreeMap<String, String>,
    pub error: Option<JobError>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}
