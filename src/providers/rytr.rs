//! Script generation via the Rytr API.

use crate::defaults::SPEAKING_RATE_WPM;
use crate::error::{Result, ShortsmithError};
use crate::job::{Artifact, ArtifactKind, Stage};
use crate::providers::{GenerationRequest, Generator};
use async_trait::async_trait;

const DEFAULT_BASE_URL: &str = "https://api.rytr.me/v1";
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(60);

/// Script provider backed by Rytr's content generation endpoint.
pub struct RytrGenerator {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl RytrGenerator {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ShortsmithError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Generator for RytrGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Artifact> {
        let payload = ryte_payload(&request.prompt);

        let response = self
            .client
            .post(format!("{}/ryte", self.base_url))
            .header("Authentication", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| ShortsmithError::provider(Stage::Script, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ShortsmithError::provider(
                Stage::Script,
                format!("Rytr returned {status}: {body}"),
            ));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ShortsmithError::provider(Stage::Script, e))?;
        let text = extract_text(&body).ok_or_else(|| {
            ShortsmithError::provider(Stage::Script, "response carried no script text")
        })?;

        if let Some(parent) = request.output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&request.output_path, &text)?;

        Ok(Artifact {
            kind: ArtifactKind::Text,
            path: request.output_path.clone(),
            duration_secs: None,
            provider: self.provider_name().to_string(),
            prompt: request.prompt.clone(),
        })
    }

    fn stage(&self) -> Stage {
        Stage::Script
    }

    fn provider_name(&self) -> &str {
        "rytr"
    }
}

/// Prompt for a short-form video script on a topic.
///
/// Word budget follows the average speaking rate so the spoken script
/// lands near the target duration.
pub fn script_prompt(topic: &str, target_duration_secs: u64) -> String {
    let word_count = target_duration_secs * SPEAKING_RATE_WPM / 60;
    format!(
        "Create a script for a short vertical video about {topic}. \
         The video should be engaging, concise, and approximately {target_duration_secs} seconds long. \
         Focus on delivering value quickly with a hook in the first 3 seconds. \
         Include a clear call-to-action at the end. \
         Keep the total word count around {word_count} words."
    )
}

fn ryte_payload(prompt: &str) -> serde_json::Value {
    serde_json::json!({
        "languageId": "English",
        "toneId": "engaging",
        "useCaseId": "social_media_post",
        "inputContexts": { "CONTEXT": prompt },
        "variations": 1,
        "creativityLevel": 3,
        "format": "text",
    })
}

fn extract_text(body: &serde_json::Value) -> Option<String> {
    body["data"][0]["text"]
        .as_str()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
