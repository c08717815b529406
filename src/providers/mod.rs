//! Generation providers.
//!
//! Each external service (script, voice, music, video) is wrapped behind
//! the single [`Generator`] capability: one network call plus one local
//! file write, returning an [`Artifact`] or a stage-tagged provider error.
//! The orchestrator never branches on a concrete provider type.

pub mod elevenlabs;
pub mod runway;
pub mod rytr;
pub mod suno;

pub use elevenlabs::ElevenLabsGenerator;
pub use runway::RunwayGenerator;
pub use rytr::RytrGenerator;
pub use suno::SunoGenerator;

use crate::defaults::{PROVIDER_POLL_INTERVAL_SECS, PROVIDER_POLL_MAX_ATTEMPTS};
use crate::error::{Result, ShortsmithError};
use crate::job::{Artifact, ArtifactKind, Stage};
use crate::media::AudioClip;
use async_trait::async_trait;
use futures_util::StreamExt;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Everything a provider needs to produce one artifact.
///
/// Built by the orchestrator from the pipeline context: `prompt` carries
/// the provider-specific prompt (for the voice stage, the script text
/// itself).
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub job_id: Uuid,
    pub topic: String,
    pub prompt: String,
    /// Target duration hint in seconds.
    pub target_duration_secs: f64,
    /// Preferred voice id, voice stage only.
    pub voice: Option<String>,
    /// Where the artifact must be written.
    pub output_path: PathBuf,
}

/// Capability wrapping one external generation service.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate one artifact: a network call plus a local file write.
    ///
    /// No retries happen here; a failure is reported up immediately as a
    /// stage failure.
    async fn generate(&self, request: &GenerationRequest) -> Result<Artifact>;

    /// Which pipeline stage this provider serves.
    fn stage(&self) -> Stage;

    /// Provider name recorded in artifact metadata.
    fn provider_name(&self) -> &str;
}

/// Stream a URL to a local file.
pub(crate) async fn download_to_path(
    client: &reqwest::Client,
    url: &str,
    output_path: &Path,
    stage: Stage,
) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ShortsmithError::provider(stage, format!("download failed: {e}")))?;

    if !response.status().is_success() {
        return Err(ShortsmithError::provider(
            stage,
            format!("download failed with status {}", response.status()),
        ));
    }

    let mut stream = response.bytes_stream();
    let mut file = std::fs::File::create(output_path)?;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk
            .map_err(|e| ShortsmithError::provider(stage, format!("download chunk failed: {e}")))?;
        file.write_all(&chunk)?;
    }
    Ok(())
}

/// Poll a provider's generation-status endpoint until it completes.
///
/// Returns the artifact URL extracted from the completed status payload.
/// Exceeding the attempt budget surfaces as an ordinary provider error.
pub(crate) async fn await_generation(
    client: &reqwest::Client,
    status_url: &str,
    api_key: &str,
    stage: Stage,
    extract_url: impl Fn(&serde_json::Value) -> Option<String>,
) -> Result<String> {
    for _ in 0..PROVIDER_POLL_MAX_ATTEMPTS {
        let response = client
            .get(status_url)
            .bearer_auth(api_key)
            .send()
            .await
            .map_err(|e| ShortsmithError::provider(stage, format!("status poll failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ShortsmithError::provider(
                stage,
                format!("status poll returned {}", response.status()),
            ));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ShortsmithError::provider(stage, format!("invalid status body: {e}")))?;

        match body["status"].as_str() {
            Some("completed") => {
                return extract_url(&body).ok_or_else(|| {
                    ShortsmithError::provider(stage, "completed generation has no artifact URL")
                });
            }
            Some("failed") => {
                let reason = body["error"].as_str().unwrap_or("unknown error");
                return Err(ShortsmithError::provider(
                    stage,
                    format!("generation failed: {reason}"),
                ));
            }
            _ => {
                tokio::time::sleep(std::time::Duration::from_secs(PROVIDER_POLL_INTERVAL_SECS))
                    .await;
            }
        }
    }

    Err(ShortsmithError::provider(stage, "generation timed out"))
}

/// Mock generator for testing and offline runs.
///
/// Produces deterministic artifacts on disk: script stages write the
/// configured text, audio stages synthesize a tone of the configured
/// duration, video stages write a placeholder container.
#[derive(Debug, Clone)]
pub struct MockGenerator {
    stage: Stage,
    provider: String,
    script: String,
    duration_secs: f64,
    delay: Option<std::time::Duration>,
    should_fail: bool,
}

impl MockGenerator {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            provider: format!("mock-{stage}"),
            script: "This is a mock script. Like and subscribe.".to_string(),
            duration_secs: 10.0,
            delay: None,
            should_fail: false,
        }
    }

    /// Text returned by a script-stage mock.
    pub fn with_script(mut self, script: &str) -> Self {
        self.script = script.to_string();
        self
    }

    /// Duration of synthesized audio/video artifacts.
    pub fn with_duration_secs(mut self, secs: f64) -> Self {
        self.duration_secs = secs;
        self
    }

    /// Simulate a slow provider.
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Configure the mock to fail on generate.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Artifact> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.should_fail {
            return Err(ShortsmithError::Provider {
                stage: self.stage,
                message: format!("mock {} failure", self.stage),
            });
        }

        if let Some(parent) = request.output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let duration_secs = match self.stage {
            Stage::Script | Stage::Compose => {
                std::fs::write(&request.output_path, &self.script)?;
                None
            }
            Stage::Voice | Stage::Music => {
                let rate = crate::defaults::VOICE_SAMPLE_RATE;
                let len = (self.duration_secs * rate as f64).round() as usize;
                // Quiet 220 Hz tone so mixes have visible content
                let samples: Vec<i16> = (0..len)
                    .map(|i| {
                        let t = i as f64 / rate as f64;
                        ((t * 220.0 * std::f64::consts::TAU).sin() * 8000.0) as i16
                    })
                    .collect();
                AudioClip::from_samples(samples, rate).save(&request.output_path)?;
                Some(self.duration_secs)
            }
            Stage::Video => {
                std::fs::write(&request.output_path, b"mock video container")?;
                Some(self.duration_secs)
            }
        };

        Ok(Artifact {
            kind: match self.stage {
                Stage::Script | Stage::Compose => ArtifactKind::Text,
                Stage::Voice | Stage::Music => ArtifactKind::Audio,
                Stage::Video => ArtifactKind::Video,
            },
            path: request.output_path.clone(),
            duration_secs,
            provider: self.provider.clone(),
            prompt: request.prompt.clone(),
        })
    }

    fn stage(&self) -> Stage {
        self.stage
    }

    fn provider_name(&self) -> &str {
        &self.provider
    }
}
