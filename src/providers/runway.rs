//! Video generation via the Runway text-to-video API.
//!
//! Like the music provider, Runway generations are asynchronous and the
//! finished clip is downloaded from a signed URL. The clip's measured
//! container duration is probed locally, since the provider's native
//! duration rarely equals the requested one exactly.

use crate::defaults::{VIDEO_FPS, VIDEO_HEIGHT, VIDEO_WIDTH};
use crate::error::{Result, ShortsmithError};
use crate::job::{Artifact, ArtifactKind, Stage};
use crate::media::ffmpeg::CommandRunner;
use crate::media::video;
use crate::providers::{GenerationRequest, Generator, await_generation, download_to_path};
use async_trait::async_trait;
use std::sync::Arc;

const DEFAULT_BASE_URL: &str = "https://api.runwayml.com/v1";
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(60);

/// Video provider backed by Runway.
pub struct RunwayGenerator {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    runner: Arc<dyn CommandRunner>,
}

impl RunwayGenerator {
    pub fn new(api_key: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ShortsmithError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            runner,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Generator for RunwayGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Artifact> {
        let payload = video_payload(&request.prompt, request.target_duration_secs);

        let response = self
            .client
            .post(format!("{}/text-to-video", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ShortsmithError::provider(Stage::Video, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ShortsmithError::provider(
                Stage::Video,
                format!("Runway returned {status}: {body}"),
            ));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ShortsmithError::provider(Stage::Video, e))?;
        let generation_id = body["id"].as_str().ok_or_else(|| {
            ShortsmithError::provider(Stage::Video, "generation response carried no id")
        })?;

        let video_url = await_generation(
            &self.client,
            &format!("{}/generations/{}", self.base_url, generation_id),
            &self.api_key,
            Stage::Video,
            |body| body["output"]["video"].as_str().map(ToString::to_string),
        )
        .await?;

        download_to_path(&self.client, &video_url, &request.output_path, Stage::Video).await?;

        let duration_secs = video::probe_duration(self.runner.as_ref(), &request.output_path)
            .await
            .map_err(|e| ShortsmithError::provider(Stage::Video, e))?;

        Ok(Artifact {
            kind: ArtifactKind::Video,
            path: request.output_path.clone(),
            duration_secs: Some(duration_secs),
            provider: self.provider_name().to_string(),
            prompt: request.prompt.clone(),
        })
    }

    fn stage(&self) -> Stage {
        Stage::Video
    }

    fn provider_name(&self) -> &str {
        "runway"
    }
}

/// Prompt for visuals matching a topic.
pub fn video_prompt(topic: &str) -> String {
    format!(
        "A visually engaging short vertical video about {topic}. Dynamic visuals with motion and energy."
    )
}

fn video_payload(prompt: &str, duration_secs: f64) -> serde_json::Value {
    let num_frames = (duration_secs * VIDEO_FPS as f64).round() as u64;
    serde_json::json!({
        "prompt": prompt,
        "num_frames": num_frames,
        "width": VIDEO_WIDTH,
        "height": VIDEO_HEIGHT,
    })
}
