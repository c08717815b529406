//! Default configuration constants for shortsmith.
//!
//! Shared constants used across configuration types and pipeline stages
//! to ensure consistency and eliminate duplication.

/// Default target duration for a generated short, in seconds.
pub const TARGET_DURATION_SECS: u64 = 30;

/// Default volume offset applied to background music, in decibels.
///
/// Music is mixed under the voiceover; −10 dB keeps dialogue intelligible
/// while the music remains audible.
pub const MUSIC_GAIN_DB: f64 = -10.0;

/// Tolerance when comparing media durations, in seconds.
///
/// Two durations within this window are treated as equal: codecs and
/// sample-rate conversions introduce sub-frame drift below anything
/// audible or visible.
pub const DURATION_EPSILON_SECS: f64 = 0.05;

/// Sample rate for voiceover audio, in Hz.
///
/// The voice provider is asked for 16-bit PCM at this rate; music is
/// resampled to match before mixing.
pub const VOICE_SAMPLE_RATE: u32 = 16_000;

/// Frame rate requested from the video provider.
pub const VIDEO_FPS: u32 = 24;

/// Video geometry for vertical shorts (9:16).
pub const VIDEO_WIDTH: u32 = 768;
pub const VIDEO_HEIGHT: u32 = 1344;

/// Average speaking rate used to size scripts, in words per minute.
pub const SPEAKING_RATE_WPM: u64 = 150;

/// Progress checkpoint reached after the script stage completes.
pub const PROGRESS_SCRIPT: u8 = 25;
/// Progress checkpoint reached after the voice stage completes.
pub const PROGRESS_VOICE: u8 = 50;
/// Progress checkpoint reached after the music stage completes.
pub const PROGRESS_MUSIC: u8 = 75;
/// Progress checkpoint reached after the video stage completes.
pub const PROGRESS_VIDEO: u8 = 90;
/// Progress when the final artifact has been composed.
pub const PROGRESS_COMPLETE: u8 = 100;

/// Interval between status polls against an asynchronous provider, in seconds.
pub const PROVIDER_POLL_INTERVAL_SECS: u64 = 5;

/// Maximum number of status polls before a provider generation is abandoned.
pub const PROVIDER_POLL_MAX_ATTEMPTS: u32 = 60;

/// Fade-out applied to the end of reconciled music: 10% of the clip or
/// this cap, whichever is shorter, in milliseconds.
pub const MUSIC_FADE_MAX_MS: u64 = 3_000;
