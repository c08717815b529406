//! shortsmith - short-form video generation pipeline
//!
//! Turns a single topic into a finished vertical video by orchestrating
//! four external generation stages (script, voiceover, music, video) and
//! deterministically assembling their outputs onto one timeline.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod cli;
pub mod config;
pub mod daemon;
pub mod defaults;
pub mod error;
pub mod ipc;
pub mod job;
pub mod media;
pub mod pipeline;
pub mod providers;

// Core seams (generate → reconcile → compose)
pub use media::{AudioClip, CaptionPosition, CommandRunner, MediaComposer, SystemCommandRunner};
pub use providers::{GenerationRequest, Generator};

// Pipeline
pub use pipeline::{Orchestrator, OutputLayout, ProviderSet};

// Job lifecycle
pub use job::{Artifact, CreateRequest, Job, JobSnapshot, JobStatus, JobStore, Stage};

// Error handling
pub use error::{Result, ShortsmithError};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.0.1+abc1234"` when git hash is available, `"0.0.1"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {}",
            ver
        );
    }

    #[test]
    fn version_string_contains_plus_when_git_hash_present() {
        let ver = version_string();
        // In a git repo build, GIT_HASH is set → expect "0.0.1+<hash>"
        // In CI without git, expect plain "0.0.1"
        if option_env!("GIT_HASH").is_some_and(|h| !h.is_empty()) {
            assert!(
                ver.contains('+'),
                "With GIT_HASH set, version should contain '+', got: {}",
                ver
            );
        } else {
            assert_eq!(ver, env!("CARGO_PKG_VERSION"));
        }
    }
}
