//! Final composition: mix the audio bed, mux it into the video, burn captions.

use crate::defaults::MUSIC_GAIN_DB;
use crate::error::{Result, ShortsmithError};
use crate::media::clip::AudioClip;
use crate::media::ffmpeg::CommandRunner;
use crate::media::video::{self, CaptionPosition};
use std::path::Path;
use std::sync::Arc;

/// File paths consumed and produced by one composition run.
pub struct ComposeInputs<'a> {
    /// Voiceover WAV — the primary track, mixed at full gain.
    pub voice: &'a Path,
    /// Background music WAV, already reconciled to the voice duration.
    pub music: &'a Path,
    /// Video clip, already reconciled to the voice duration.
    pub video: &'a Path,
    /// Script text rendered as captions.
    pub script: &'a str,
    pub captions: bool,
    /// Work path for the mixed audio track.
    pub mixed_audio: &'a Path,
    /// Work path for the video with audio attached.
    pub with_audio: &'a Path,
    /// Final artifact path.
    pub output: &'a Path,
}

/// Merges the pipeline's media streams into one final video.
pub struct MediaComposer {
    runner: Arc<dyn CommandRunner>,
    music_gain_db: f64,
    caption_position: CaptionPosition,
}

impl MediaComposer {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            music_gain_db: MUSIC_GAIN_DB,
            caption_position: CaptionPosition::default(),
        }
    }

    /// Override the music attenuation (negative dB values attenuate).
    pub fn with_music_gain_db(mut self, gain_db: f64) -> Self {
        self.music_gain_db = gain_db;
        self
    }

    pub fn with_caption_position(mut self, position: CaptionPosition) -> Self {
        self.caption_position = position;
        self
    }

    /// Run the composition steps in order:
    /// mix voice + music, attach the mix to the video, overlay captions.
    ///
    /// Pure assembly — no step changes the clip duration, which already
    /// equals the reconciled video duration.
    pub async fn compose(&self, inputs: ComposeInputs<'_>) -> Result<()> {
        let mixed = self.mix_audio_bed(inputs.voice, inputs.music)?;
        mixed.save(inputs.mixed_audio)?;

        video::mux_audio(
            self.runner.as_ref(),
            inputs.video,
            inputs.mixed_audio,
            inputs.with_audio,
        )
        .await?;

        if inputs.captions {
            video::overlay_captions(
                self.runner.as_ref(),
                inputs.with_audio,
                inputs.script,
                self.caption_position,
                inputs.output,
            )
            .await?;
        } else {
            std::fs::copy(inputs.with_audio, inputs.output).map_err(|e| {
                ShortsmithError::Composition {
                    message: format!(
                        "failed to place final video at {}: {}",
                        inputs.output.display(),
                        e
                    ),
                }
            })?;
        }

        Ok(())
    }

    /// Voice at full gain plus attenuated music, resampled onto the voice
    /// track's rate before summation.
    fn mix_audio_bed(&self, voice_path: &Path, music_path: &Path) -> Result<AudioClip> {
        let voice = AudioClip::load(voice_path)?;
        if voice.is_empty() {
            return Err(ShortsmithError::Composition {
                message: format!("voice track {} is empty", voice_path.display()),
            });
        }

        let music = AudioClip::load(music_path)?;
        if music.is_empty() {
            return Err(ShortsmithError::Composition {
                message: format!("music track {} is empty", music_path.display()),
            });
        }

        let music = music.matched_to(&voice).with_gain_db(self.music_gain_db);
        voice.mixed_with(&music)
    }
}
