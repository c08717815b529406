//! Background music generation via the Suno API.
//!
//! Suno generations are asynchronous: start, poll the status endpoint,
//! then download the finished track. The downloaded audio is transcoded to
//! mono WAV so the composer can mix it natively.

use crate::defaults::VOICE_SAMPLE_RATE;
use crate::error::{Result, ShortsmithError};
use crate::job::{Artifact, ArtifactKind, Stage};
use crate::media::ffmpeg::CommandRunner;
use crate::media::{AudioClip, video};
use crate::providers::{GenerationRequest, Generator, await_generation, download_to_path};
use async_trait::async_trait;
use std::sync::Arc;

const DEFAULT_BASE_URL: &str = "https://api.suno.ai/v1";
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(60);

/// Music provider backed by Suno.
pub struct SunoGenerator {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    runner: Arc<dyn CommandRunner>,
}

impl SunoGenerator {
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
impl Generator for SunoGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Artifact> {
        let payload = music_payload(&request.prompt, request.target_duration_secs);

        let response = self
            .client
            .post(format!("{}/generate", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ShortsmithError::provider(Stage::Music, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ShortsmithError::provider(
                Stage::Music,
                format!("Suno returned {status}: {body}"),
            ));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ShortsmithError::provider(Stage::Music, e))?;
        let generation_id = body["id"].as_str().ok_or_else(|| {
            ShortsmithError::provider(Stage::Music, "generation response carried no id")
        })?;

        let audio_url = await_generation(
            &self.client,
            &format!("{}/generations/{}", self.base_url, generation_id),
            &self.api_key,
            Stage::Music,
            |body| body["audio_url"].as_str().map(ToString::to_string),
        )
        .await?;

        // Suno serves compressed audio; keep the raw download next to the
        // WAV the pipeline consumes.
        let raw_path = request.output_path.with_extension("mp3");
        download_to_path(&self.client, &audio_url, &raw_path, Stage::Music).await?;
        video::transcode_to_wav(
            self.runner.as_ref(),
            &raw_path,
            &request.output_path,
            VOICE_SAMPLE_RATE,
        )
        .await?;

        let clip = AudioClip::load(&request.output_path)?;

        Ok(Artifact {
            kind: ArtifactKind::Audio,
            path: request.output_path.clone(),
            duration_secs: Some(clip.duration_secs()),
            provider: self.provider_name().to_string(),
            prompt: request.prompt.clone(),
        })
    }

    fn stage(&self) -> Stage {
        Stage::Music
    }

    fn provider_name(&self) -> &str {
        "suno"
    }
}

/// Prompt for background music complementing a voiceover on a topic.
pub fn music_prompt(topic: &str) -> String {
    format!(
        "Background music for a short video about {topic}. Upbeat, energetic, and engaging."
    )
}

fn music_payload(prompt: &str, duration_secs: f64) -> serde_json::Value {
    // Mood and duration ride along in the prompt; the duration field is a
    // hint the provider treats as approximate.
    let enhanced = format!(
        "{prompt}. Mood: Background. Duration: approximately {:.0} seconds",
        duration_secs
    );
    serde_json::json!({
        "prompt": enhanced,
        "duration": duration_secs.round() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MockCommandRunner;

    #[test]
    fn music_prompt_mentions_topic() {
        let prompt = music_prompt("city nightlife");
        assert!(prompt.contains("city nightlife"));
        assert!(prompt.contains("Background music"));
    }

    #[test]
    fn payload_embeds_mood_and_duration_hint() {
        let payload = music_payload("Background music for a short video about bees", 27.6);
        let prompt = payload["prompt"].as_str().unwrap();
        assert!(prompt.contains("Mood: Background"));
        assert!(prompt.contains("approximately 28 seconds"));
        assert_eq!(payload["duration"], 28);
    }

    #[test]
    fn generator_reports_music_stage() {
        let runner = Arc::new(MockCommandRunner::new());
        let generator = SunoGenerator::new("key", runner).unwrap();
        assert_eq!(generator.stage(), Stage::Music);
        assert_eq!(generator.provider_name(), "suno");
    }
}
