//! In-memory audio clip backed by WAV files.
//!
//! Clips are mono 16-bit PCM. Stereo sources are downmixed on load and
//! arbitrary sample rates are supported; [`AudioClip::matched_to`] brings a
//! secondary clip onto a primary clip's rate before mixing.

use crate::error::{Result, ShortsmithError};
use std::io::Read;
use std::path::Path;

/// Mono PCM audio buffer with its sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    samples: Vec<i16>,
    sample_rate: u32,
}

impl AudioClip {
    /// Wrap raw mono samples.
    pub fn from_samples(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Decode a WAV file, downmixing stereo to mono.
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| ShortsmithError::MediaRead {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_reader(Box::new(file)).map_err(|e| match e {
            ShortsmithError::MediaRead { message, .. } => ShortsmithError::MediaRead {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    /// Decode WAV data from any reader.
    pub fn from_reader(reader: Box<dyn Read + Send>) -> Result<Self> {
        let mut wav_reader =
            hound::WavReader::new(reader).map_err(|e| ShortsmithError::MediaRead {
                path: String::new(),
                message: format!("Failed to parse WAV data: {}", e),
            })?;

        let spec = wav_reader.spec();
        let source_rate = spec.sample_rate;
        let source_channels = spec.channels;

        if source_channels == 0 || source_channels > 2 {
            return Err(ShortsmithError::MediaRead {
                path: String::new(),
                message: format!("Unsupported channel count: {}", source_channels),
            });
        }

        let raw_samples: Vec<i16> = wav_reader
            .samples::<i16>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| ShortsmithError::MediaRead {
                path: String::new(),
                message: format!("Failed to read WAV samples: {}", e),
            })?;

        // Downmix stereo to mono by averaging channel pairs
        let samples = if source_channels == 2 {
            raw_samples
                .chunks_exact(2)
                .map(|chunk| {
                    let left = chunk[0] as i32;
                    let right = chunk[1] as i32;
                    ((left + right) / 2) as i16
                })
                .collect()
        } else {
            raw_samples
        };

        Ok(Self {
            samples,
            sample_rate: source_rate,
        })
    }

    /// Encode as 16-bit mono WAV.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer =
            hound::WavWriter::create(path, spec).map_err(|e| ShortsmithError::MediaWrite {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        for &sample in &self.samples {
            writer
                .write_sample(sample)
                .map_err(|e| ShortsmithError::MediaWrite {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
        }
        writer.finalize().map_err(|e| ShortsmithError::MediaWrite {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Clip length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Resample onto another clip's rate so the two can be summed.
    pub fn matched_to(&self, other: &AudioClip) -> AudioClip {
        self.resampled(other.sample_rate)
    }

    /// Resample to a target rate via linear interpolation.
    pub fn resampled(&self, target_rate: u32) -> AudioClip {
        AudioClip {
            samples: resample(&self.samples, self.sample_rate, target_rate),
            sample_rate: target_rate,
        }
    }

    /// First `secs` seconds of the clip; a no-op if already shorter.
    pub fn trimmed_to(&self, secs: f64) -> AudioClip {
        let max_len = (secs * self.sample_rate as f64).round() as usize;
        let len = max_len.min(self.samples.len());
        AudioClip {
            samples: self.samples[..len].to_vec(),
            sample_rate: self.sample_rate,
        }
    }

    /// Whole copies of the clip concatenated until at least `copies` repeats.
    pub fn repeated(&self, copies: u32) -> AudioClip {
        let mut samples = Vec::with_capacity(self.samples.len() * copies as usize);
        for _ in 0..copies {
            samples.extend_from_slice(&self.samples);
        }
        AudioClip {
            samples,
            sample_rate: self.sample_rate,
        }
    }

    /// Scale amplitude by a decibel offset. Negative values attenuate.
    pub fn with_gain_db(&self, gain_db: f64) -> AudioClip {
        let factor = 10f64.powf(gain_db / 20.0);
        let samples = self
            .samples
            .iter()
            .map(|&s| {
                let scaled = (s as f64 * factor).round();
                scaled.clamp(i16::MIN as f64, i16::MAX as f64) as i16
            })
            .collect();
        AudioClip {
            samples,
            sample_rate: self.sample_rate,
        }
    }

    /// Linear fade-out over the final `fade_ms` milliseconds.
    pub fn with_fade_out(&self, fade_ms: u64) -> AudioClip {
        let fade_len = ((fade_ms as f64 / 1000.0) * self.sample_rate as f64) as usize;
        let fade_len = fade_len.min(self.samples.len());
        if fade_len == 0 {
            return self.clone();
        }

        let mut samples = self.samples.clone();
        let start = samples.len() - fade_len;
        for (i, sample) in samples[start..].iter_mut().enumerate() {
            let remaining = (fade_len - i) as f64 / fade_len as f64;
            *sample = (*sample as f64 * remaining) as i16;
        }
        AudioClip {
            samples,
            sample_rate: self.sample_rate,
        }
    }

    /// Sample-wise sum with another clip at the same rate.
    ///
    /// The result spans the longer of the two clips; the shorter one
    /// contributes silence past its end. Saturating addition prevents
    /// wrap-around clipping artifacts.
    pub fn mixed_with(&self, other: &AudioClip) -> Result<AudioClip> {
        if self.sample_rate != other.sample_rate {
            return Err(ShortsmithError::Composition {
                message: format!(
                    "cannot mix clips at different rates ({} Hz vs {} Hz)",
                    self.sample_rate, other.sample_rate
                ),
            });
        }

        let len = self.samples.len().max(other.samples.len());
        let mut samples = Vec::with_capacity(len);
        for i in 0..len {
            let a = self.samples.get(i).copied().unwrap_or(0);
            let b = other.samples.get(i).copied().unwrap_or(0);
            samples.push(a.saturating_add(b));
        }
        Ok(AudioClip {
            samples,
            sample_rate: self.sample_rate,
        })
    }
}

/// Simple linear interpolation resampling.
fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = source_pos.floor() as usize;
            let fraction = source_pos - source_idx as f64;

            if source_idx + 1 >= samples.len() {
                samples.get(source_idx).copied().unwrap_or(0)
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as i16
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn make_wav_data(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        cursor.into_inner()
    }

    #[test]
    fn from_reader_mono_matches_exactly() {
        let input = vec![100i16, 200, 300, 400, 500];
        let wav = make_wav_data(16000, 1, &input);
        let clip = AudioClip::from_reader(Box::new(Cursor::new(wav))).unwrap();
        assert_eq!(clip.samples(), &input[..]);
        assert_eq!(clip.sample_rate(), 16000);
    }

    #[test]
    fn from_reader_stereo_downmixes_to_mono() {
        // Stereo pairs: (100, 200), (300, 400), (500, 600)
        let stereo = vec![100i16, 200, 300, 400, 500, 600];
        let wav = make_wav_data(16000, 2, &stereo);
        let clip = AudioClip::from_reader(Box::new(Cursor::new(wav))).unwrap();
        assert_eq!(clip.samples(), &[150i16, 350, 550]);
    }

    #[test]
    fn invalid_wav_data_returns_error() {
        let garbage = vec![0u8, 1, 2, 3, 4, 5];
        let result = AudioClip::from_reader(Box::new(Cursor::new(garbage)));
        assert!(matches!(result, Err(ShortsmithError::MediaRead { .. })));
    }

    #[test]
    fn duration_from_sample_count() {
        let clip = AudioClip::from_samples(vec![0i16; 16000 * 3], 16000);
        assert!((clip.duration_secs() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn trim_keeps_prefix_unchanged() {
        let clip = AudioClip::from_samples((0..1000).map(|i| i as i16).collect(), 100);
        let trimmed = clip.trimmed_to(3.0);
        assert_eq!(trimmed.samples().len(), 300);
        assert_eq!(trimmed.samples()[0], 0);
        assert_eq!(trimmed.samples()[299], 299);
    }

    #[test]
    fn trim_beyond_length_is_noop() {
        let clip = AudioClip::from_samples(vec![7i16; 100], 100);
        let trimmed = clip.trimmed_to(10.0);
        assert_eq!(trimmed.samples().len(), 100);
    }

    #[test]
    fn repeated_concatenates_whole_copies() {
        let clip = AudioClip::from_samples(vec![1i16, 2, 3], 10);
        let looped = clip.repeated(3);
        assert_eq!(looped.samples(), &[1, 2, 3, 1, 2, 3, 1, 2, 3]);
    }

    #[test]
    fn gain_minus_six_db_roughly_halves_amplitude() {
        let clip = AudioClip::from_samples(vec![10000i16; 10], 16000);
        let quieter = clip.with_gain_db(-6.0);
        // −6 dB ≈ ×0.501
        assert!(quieter.samples().iter().all(|&s| (4950..=5100).contains(&s)));
    }

    #[test]
    fn gain_clamps_instead_of_wrapping() {
        let clip = AudioClip::from_samples(vec![i16::MAX, i16::MIN], 16000);
        let louder = clip.with_gain_db(6.0);
        assert_eq!(louder.samples()[0], i16::MAX);
        assert_eq!(louder.samples()[1], i16::MIN);
    }

    #[test]
    fn mix_is_samplewise_sum() {
        let a = AudioClip::from_samples(vec![100i16, 200, 300], 16000);
        let b = AudioClip::from_samples(vec![10i16, 20, 30], 16000);
        let mixed = a.mixed_with(&b).unwrap();
        assert_eq!(mixed.samples(), &[110, 220, 330]);
    }

    #[test]
    fn mix_pads_shorter_clip_with_silence() {
        let a = AudioClip::from_samples(vec![100i16, 200, 300, 400], 16000);
        let b = AudioClip::from_samples(vec![10i16], 16000);
        let mixed = a.mixed_with(&b).unwrap();
        assert_eq!(mixed.samples(), &[110, 200, 300, 400]);
    }

    #[test]
    fn mix_saturates_at_extremes() {
        let a = AudioClip::from_samples(vec![i16::MAX], 16000);
        let b = AudioClip::from_samples(vec![1000i16], 16000);
        let mixed = a.mixed_with(&b).unwrap();
        assert_eq!(mixed.samples()[0], i16::MAX);
    }

    #[test]
    fn mix_rejects_mismatched_rates() {
        let a = AudioClip::from_samples(vec![1i16], 16000);
        let b = AudioClip::from_samples(vec![1i16], 44100);
        assert!(matches!(
            a.mixed_with(&b),
            Err(ShortsmithError::Composition { .. })
        ));
    }

    #[test]
    fn resample_halves_sample_count() {
        let clip = AudioClip::from_samples(vec![0i16; 3200], 16000);
        let down = clip.resampled(8000);
        assert_eq!(down.samples().len(), 1600);
        assert_eq!(down.sample_rate(), 8000);
    }

    #[test]
    fn resample_preserves_duration_and_amplitude() {
        let clip = AudioClip::from_samples(vec![1000i16; 44100], 44100);
        let matched = clip.resampled(16000);
        assert!((matched.duration_secs() - 1.0).abs() < 0.01);
        assert!(matched.samples().iter().all(|&s| (999..=1001).contains(&s)));
    }

    #[test]
    fn matched_to_adopts_other_rate() {
        let a = AudioClip::from_samples(vec![500i16; 44100], 44100);
        let b = AudioClip::from_samples(vec![0i16; 16000], 16000);
        let matched = a.matched_to(&b);
        assert_eq!(matched.sample_rate(), 16000);
        assert!(matched.mixed_with(&b).is_ok());
    }

    #[test]
    fn fade_out_reaches_near_silence() {
        let clip = AudioClip::from_samples(vec![10000i16; 1000], 1000);
        let faded = clip.with_fade_out(500);
        // Untouched before the fade window
        assert_eq!(faded.samples()[0], 10000);
        assert_eq!(faded.samples()[499], 10000);
        // Decaying inside it
        assert!(faded.samples()[750] < 6000);
        assert!(faded.samples()[999] < 100);
    }

    #[test]
    fn fade_out_longer_than_clip_is_capped() {
        let clip = AudioClip::from_samples(vec![10000i16; 10], 1000);
        let faded = clip.with_fade_out(60_000);
        assert_eq!(faded.samples().len(), 10);
        assert!(faded.samples()[9] < clip.samples()[9]);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        let clip = AudioClip::from_samples(vec![1i16, -1, 32000, -32000], 16000);

        clip.save(&path).unwrap();
        let loaded = AudioClip::load(&path).unwrap();
        assert_eq!(loaded, clip);
    }

    #[test]
    fn load_missing_file_reports_path() {
        let err = AudioClip::load(Path::new("/nonexistent/clip.wav")).unwrap_err();
        match err {
            ShortsmithError::MediaRead { path, .. } => {
                assert!(path.contains("nonexistent"));
            }
            other => panic!("Expected MediaRead error, got {:?}", other),
        }
    }
}
