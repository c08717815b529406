//! Voiceover generation via the ElevenLabs text-to-speech API.
//!
//! Speech is requested as raw 16 kHz PCM and wrapped into a WAV locally,
//! which also yields the measured spoken duration — the reference duration
//! the rest of the pipeline reconciles against.

use crate::defaults::VOICE_SAMPLE_RATE;
use crate::error::{Result, ShortsmithError};
use crate::job::{Artifact, ArtifactKind, Stage};
use crate::media::AudioClip;
use crate::providers::{GenerationRequest, Generator};
use async_trait::async_trait;

const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io/v1";
const DEFAULT_MODEL_ID: &str = "eleven_turbo_v2";
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(120);

/// Voice provider backed by ElevenLabs.
pub struct ElevenLabsGenerator {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model_id: String,
    stability: f32,
    similarity_boost: f32,
}

impl ElevenLabsGenerator {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ShortsmithError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            stability: 0.5,
            similarity_boost: 0.75,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    pub fn with_voice_settings(mut self, stability: f32, similarity_boost: f32) -> Self {
        self.stability = stability;
        self.similarity_boost = similarity_boost;
        self
    }

    /// First available voice from the account, used when the request has
    /// no preference.
    async fn default_voice_id(&self) -> Result<String> {
        let response = self
            .client
            .get(format!("{}/voices", self.base_url))
            .header("xi-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| ShortsmithError::provider(Stage::Voice, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ShortsmithError::provider(
                Stage::Voice,
                format!("voice listing returned {status}"),
            ));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ShortsmithError::provider(Stage::Voice, e))?;
        body["voices"][0]["voice_id"]
            .as_str()
            .map(ToString::to_string)
            .ok_or_else(|| ShortsmithError::provider(Stage::Voice, "no voices available"))
    }
}

#[async_trait]
impl Generator for ElevenLabsGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Artifact> {
        let voice_id = match &request.voice {
            Some(id) => id.clone(),
            None => self.default_voice_id().await?,
        };

        let payload = speech_payload(
            &request.prompt,
            &self.model_id,
            self.stability,
            self.similarity_boost,
        );

        let response = self
            .client
            .post(format!(
                "{}/text-to-speech/{}?output_format=pcm_{}",
                self.base_url, voice_id, VOICE_SAMPLE_RATE
            ))
            .header("xi-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| ShortsmithError::provider(Stage::Voice, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ShortsmithError::provider(
                Stage::Voice,
                format!("ElevenLabs returned {status}: {body}"),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ShortsmithError::provider(Stage::Voice, e))?;
        let samples = pcm_to_samples(&bytes);
        if samples.is_empty() {
            return Err(ShortsmithError::provider(
                Stage::Voice,
                "provider returned no audio data",
            ));
        }

        let clip = AudioClip::from_samples(samples, VOICE_SAMPLE_RATE);
        clip.save(&request.output_path)?;

        Ok(Artifact {
            kind: ArtifactKind::Audio,
            path: request.output_path.clone(),
            duration_secs: Some(clip.duration_secs()),
            provider: self.provider_name().to_string(),
            prompt: request.prompt.clone(),
        })
    }

    fn stage(&self) -> Stage {
        Stage::Voice
    }

    fn provider_name(&self) -> &str {
        "elevenlabs"
    }
}

fn speech_payload(
    text: &str,
    model_id: &str,
    stability: f32,
    similarity_boost: f32,
) -> serde_json::Value {
    serde_json::json!({
        "text": text,
        "model_id": model_id,
        "voice_settings": {
            "stability": stability,
            "similarity_boost": similarity_boost,
        },
    })
}

/// Interpret raw little-endian 16-bit PCM as samples.
///
/// A trailing odd byte is dropped rather than misaligned.
fn pcm_to_samples(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}
