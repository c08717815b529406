//! Testable execution of external media tools.
//!
//! Video work (probing, looping, muxing, caption overlay) shells out to
//! ffmpeg/ffprobe. The `CommandRunner` trait is the seam that keeps every
//! caller testable without the tools installed.

use crate::error::{Result, ShortsmithError};
use async_trait::async_trait;

/// Trait for running external media tools.
///
/// Object-safe, Send + Sync for use across concurrent jobs.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Execute a program with arguments.
    ///
    /// Returns the stdout of the command on success.
    /// Returns an error if the command fails or is not found.
    async fn run(&self, program: &str, args: &[String]) -> Result<String>;
}

/// Production runner using tokio's process API.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<String> {
        let output = tokio::process::Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ShortsmithError::ToolNotFound {
                        tool: program.to_string(),
                    }
                } else {
                    ShortsmithError::ToolFailed {
                        tool: program.to_string(),
                        message: format!("Failed to execute: {}", e),
                    }
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ShortsmithError::ToolFailed {
                tool: program.to_string(),
                message: format!("exited with {:?}: {}", output.status.code(), stderr.trim()),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Mock runner for testing without ffmpeg installed.
///
/// Records every invocation, answers probes with a configured duration,
/// and creates the output file (the final argument) so downstream
/// existence checks pass.
#[derive(Debug)]
pub struct MockCommandRunner {
    probe_duration_secs: std::sync::Mutex<f64>,
    fail_with: std::sync::Mutex<Option<String>>,
    invocations: std::sync::Mutex<Vec<(String, Vec<String>)>>,
}

impl Default for MockCommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCommandRunner {
    pub fn new() -> Self {
        Self {
            probe_duration_secs: std::sync::Mutex::new(10.0),
            fail_with: std::sync::Mutex::new(None),
            invocations: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Duration reported for every ffprobe call.
    pub fn with_probe_duration(self, secs: f64) -> Self {
        *self.probe_duration_secs.lock().unwrap() = secs;
        self
    }

    /// Make every invocation fail with the given message.
    pub fn with_failure(self, message: &str) -> Self {
        *self.fail_with.lock().unwrap() = Some(message.to_string());
        self
    }

    /// All recorded `(program, args)` invocations.
    pub fn invocations(&self) -> Vec<(String, Vec<String>)> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for MockCommandRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<String> {
        self.invocations
            .lock()
            .unwrap()
            .push((program.to_string(), args.to_vec()));

        if let Some(message) = self.fail_with.lock().unwrap().clone() {
            return Err(ShortsmithError::ToolFailed {
                tool: program.to_string(),
                message,
            });
        }

        if args.iter().any(|a| a == "-version") {
            return Ok(format!("{} version 0.0-mock", program));
        }

        if program == "ffprobe" {
            return Ok(format!("{}\n", self.probe_duration_secs.lock().unwrap()));
        }

        // ffmpeg-style invocation: materialize the output file (last arg)
        if let Some(output) = args.last() {
            let path = std::path::Path::new(output);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, b"mock media")?;
        }
        Ok(String::new())
    }
}
