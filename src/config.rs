use crate::defaults;
use crate::media::CaptionPosition;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub compose: ComposeConfig,
    pub providers: ProvidersConfig,
}

/// Artifact output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

/// Composition configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ComposeConfig {
    /// Volume offset applied to background music, in dB.
    pub music_gain_db: f64,
    pub caption_position: CaptionPosition,
}

/// Per-stage provider endpoints and credentials
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ProvidersConfig {
    pub script: ScriptProviderConfig,
    pub voice: VoiceProviderConfig,
    pub music: MusicProviderConfig,
    pub video: VideoProviderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScriptProviderConfig {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VoiceProviderConfig {
    pub base_url: String,
    pub api_key: String,
    pub model_id: String,
    pub stability: f32,
    pub similarity_boost: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MusicProviderConfig {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VideoProviderConfig {
    pub base_url: String,
    pub api_key: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
        }
    }
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            music_gain_db: defaults::MUSIC_GAIN_DB,
            caption_position: CaptionPosition::Bottom,
        }
    }
}

impl Default for ScriptProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.rytr.me/v1".to_string(),
            api_key: String::new(),
        }
    }
}

impl Default for VoiceProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io/v1".to_string(),
            api_key: String::new(),
            model_id: "eleven_turbo_v2".to_string(),
            stability: 0.5,
            similarity_boost: 0.75,
        }
    }
}

impl Default for MusicProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.suno.ai/v1".to_string(),
            api_key: String::new(),
        }
    }
}

impl Default for VideoProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.runwayml.com/v1".to_string(),
            api_key: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Self::default()
                } else {
                    // Re-panic on invalid TOML or other errors
                    panic!("Failed to load config from {}: {}", path.display(), e);
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - RYTR_API_KEY → providers.script.api_key
    /// - ELEVENLABS_API_KEY → providers.voice.api_key
    /// - SUNO_API_KEY → providers.music.api_key
    /// - RUNWAY_API_KEY → providers.video.api_key
    /// - SHORTSMITH_OUTPUT_DIR → output.dir
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var("RYTR_API_KEY")
            && !key.is_empty()
        {
            self.providers.script.api_key = key;
        }

        if let Ok(key) = std::env::var("ELEVENLABS_API_KEY")
            && !key.is_empty()
        {
            self.providers.voice.api_key = key;
        }

        if let Ok(key) = std::env::var("SUNO_API_KEY")
            && !key.is_empty()
        {
            self.providers.music.api_key = key;
        }

        if let Ok(key) = std::env::var("RUNWAY_API_KEY")
            && !key.is_empty()
        {
            self.providers.video.api_key = key;
        }

        if let Ok(dir) = std::env::var("SHORTSMITH_OUTPUT_DIR")
            && !dir.is_empty()
        {
            self.output.dir = PathBuf::from(dir);
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/shortsmith/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("shortsmith")
            .join("config.toml")
    }
}
