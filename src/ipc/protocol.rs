//! JSON message protocol for IPC communication between CLI and daemon.

use crate::job::JobSnapshot;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Commands sent by CLI to the daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Submit a new generation job
    Submit {
        topic: String,
        duration_secs: u64,
        captions: bool,
        voice: Option<String>,
    },
    /// Get one job's status
    Status { id: Uuid },
    /// List all jobs, newest first
    List,
    /// Get the final artifact location of a completed job
    Fetch { id: Uuid },
    /// Cancel a running job
    Cancel { id: Uuid },
    /// Shutdown the daemon
    Shutdown,
}

impl Command {
    /// Serialize command to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize command from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Responses sent by daemon to CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Command succeeded
    Ok { message: String },
    /// Job accepted
    Submitted { id: Uuid },
    /// One job snapshot
    Job { job: JobSnapshot },
    /// All job snapshots, newest first
    Jobs { jobs: Vec<JobSnapshot> },
    /// Final artifact location
    Artifact { path: String },
    /// Error occurred
    Error { message: String },
}

impl Response {
    /// Serialize response to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize response from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
