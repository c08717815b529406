//! Duration reconciliation.
//!
//! Forces a secondary artifact's duration to match a reference duration:
//! longer clips are truncated, shorter clips are looped from the start with
//! whole copies and then truncated. The voiceover duration is the reference
//! for everything else in the pipeline — speech cannot be stretched without
//! audible distortion, while music and video can be trimmed or repeated.

use crate::defaults::DURATION_EPSILON_SECS;
use crate::error::{Result, ShortsmithError};
use crate::media::clip::AudioClip;

/// How to bring a secondary duration onto the reference timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilePlan {
    /// Within epsilon of the reference: leave untouched.
    Keep,
    /// Longer than the reference: truncate to `[0, reference]`.
    Trim,
    /// Shorter than the reference: concatenate `copies` whole repeats,
    /// then truncate to exactly the reference.
    Loop { copies: u32 },
}

/// Decide the reconciliation plan for a secondary duration.
///
/// Both durations must be positive; a zero-length secondary has no defined
/// loop ratio.
pub fn plan(reference_secs: f64, secondary_secs: f64) -> Result<ReconcilePlan> {
    if !reference_secs.is_finite() || reference_secs <= 0.0 {
        return Err(ShortsmithError::Reconciliation {
            message: format!("reference duration must be positive, got {}", reference_secs),
        });
    }
    if !secondary_secs.is_finite() || secondary_secs <= 0.0 {
        return Err(ShortsmithError::Reconciliation {
            message: format!(
                "secondary duration must be positive, got {}",
                secondary_secs
            ),
        });
    }

    if (secondary_secs - reference_secs).abs() <= DURATION_EPSILON_SECS {
        Ok(ReconcilePlan::Keep)
    } else if secondary_secs > reference_secs {
        Ok(ReconcilePlan::Trim)
    } else {
        let copies = (reference_secs / secondary_secs).ceil() as u32;
        Ok(ReconcilePlan::Loop { copies })
    }
}

/// Reconcile an audio clip against a reference duration.
///
/// The output duration equals the reference within
/// [`DURATION_EPSILON_SECS`], for any positive reference and clip length.
pub fn reconcile_clip(clip: &AudioClip, reference_secs: f64) -> Result<AudioClip> {
    match plan(reference_secs, clip.duration_secs())? {
        ReconcilePlan::Keep => Ok(clip.clone()),
        ReconcilePlan::Trim => Ok(clip.trimmed_to(reference_secs)),
        ReconcilePlan::Loop { copies } => Ok(clip.repeated(copies).trimmed_to(reference_secs)),
    }
}
