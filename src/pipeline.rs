//! Pipeline orchestration: topic in, finished short-form video out.
//!
//! Stages run strictly in order script → voice → music → video → compose,
//! because each depends on the previous one's output: the voiceover needs
//! the script text, music and video are reconciled against the measured
//! voice duration, and composition needs all three media streams. The two
//! provider calls that only need the captured reference duration (music,
//! video) are issued concurrently.
//!
//! Each job runs on its own task; status reads never wait on a running job.

use crate::defaults::{
    MUSIC_FADE_MAX_MS, PROGRESS_MUSIC, PROGRESS_SCRIPT, PROGRESS_VIDEO, PROGRESS_VOICE,
};
use crate::error::{Result, ShortsmithError};
use crate::job::{Artifact, ArtifactKind, CreateRequest, Job, JobDriver, JobStore, Stage};
use crate::media::ffmpeg::CommandRunner;
use crate::media::{AudioClip, ComposeInputs, MediaComposer, reconcile_clip, video};
use crate::providers::{GenerationRequest, Generator, runway, rytr, suno};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Deterministic artifact paths under one output root, one subdirectory
/// per stage.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Create every stage directory up front.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in ["text", "audio", "music", "video", "final"] {
            std::fs::create_dir_all(self.root.join(dir))?;
        }
        Ok(())
    }

    pub fn script_path(&self, id: Uuid) -> PathBuf {
        self.root.join("text").join(format!("{id}_script.txt"))
    }

    pub fn voice_path(&self, id: Uuid) -> PathBuf {
        self.root.join("audio").join(format!("{id}_voiceover.wav"))
    }

    pub fn mixed_audio_path(&self, id: Uuid) -> PathBuf {
        self.root.join("audio").join(format!("{id}_mixed.wav"))
    }

    pub fn music_path(&self, id: Uuid) -> PathBuf {
        self.root.join("music").join(format!("{id}_music.wav"))
    }

    pub fn music_fitted_path(&self, id: Uuid) -> PathBuf {
        self.root.join("music").join(format!("{id}_music_fitted.wav"))
    }

    pub fn video_path(&self, id: Uuid) -> PathBuf {
        self.root.join("video").join(format!("{id}_video.mp4"))
    }

    pub fn video_fitted_path(&self, id: Uuid) -> PathBuf {
        self.root.join("video").join(format!("{id}_video_fitted.mp4"))
    }

    pub fn with_audio_path(&self, id: Uuid) -> PathBuf {
        self.root.join("video").join(format!("{id}_with_audio.mp4"))
    }

    pub fn final_path(&self, id: Uuid) -> PathBuf {
        self.root.join("final").join(format!("{id}.mp4"))
    }

    pub fn metadata_path(&self, id: Uuid) -> PathBuf {
        self.root.join("final").join(format!("{id}_metadata.json"))
    }
}

/// The four generation providers, one per stage.
pub struct ProviderSet {
    pub script: Arc<dyn Generator>,
    pub voice: Arc<dyn Generator>,
    pub music: Arc<dyn Generator>,
    pub video: Arc<dyn Generator>,
}

/// Metadata file written next to the final video.
#[derive(Debug, Serialize)]
struct JobMetadata {
    topic: String,
    created_at: DateTime<Utc>,
    duration_secs: f64,
    files: BTreeMap<String, String>,
}

/// Top-level pipeline driver.
///
/// Owns the job registry and runs each accepted job on its own tokio
/// task. Cloning yields a cheap handle onto the same registry and
/// providers, which is what each job task holds.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<OrchestratorInner>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator").finish_non_exhaustive()
    }
}

struct OrchestratorInner {
    store: JobStore,
    providers: ProviderSet,
    composer: MediaComposer,
    runner: Arc<dyn CommandRunner>,
    layout: OutputLayout,
    cancel_flags: Mutex<HashMap<Uuid, Arc<AtomicBool>>>,
}

impl Orchestrator {
    pub fn new(
        providers: ProviderSet,
        composer: MediaComposer,
        runner: Arc<dyn CommandRunner>,
        layout: OutputLayout,
    ) -> Self {
        Self {
            inner: Arc::new(OrchestratorInner {
                store: JobStore::new(),
                providers,
                composer,
                runner,
                layout,
                cancel_flags: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn store(&self) -> &JobStore {
        &self.inner.store
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.inner.layout
    }

    /// Accept a creation request: validate, register a `Queued` job and
    /// spawn its task. Returns immediately; never blocks on generation.
    pub fn submit(&self, request: CreateRequest) -> Result<Uuid> {
        validate(&request)?;
        self.inner.layout.ensure_dirs()?;

        let job = Job::new(request);
        let id = job.id;
        self.inner.store.insert(job);

        let driver = JobDriver::new(self.inner.store.clone(), id);
        self.inner
            .cancel_flags
            .lock()
            .expect("cancel registry lock poisoned")
            .insert(id, driver.cancel_flag());

        tracing::info!(job_id = %id, "job submitted");
        let this = self.clone();
        tokio::spawn(async move { this.run_job(driver).await });
        Ok(id)
    }

    /// Snapshot of one job. Fails with `NotFound` for unknown ids.
    pub fn status(&self, id: Uuid) -> Result<Job> {
        self.inner.store.get(id)
    }

    /// Snapshots of all jobs, newest first.
    pub fn list(&self) -> Vec<Job> {
        self.inner.store.list()
    }

    /// Location of the final artifact. Fails with `NotReady` unless the
    /// job completed.
    pub fn fetch_final(&self, id: Uuid) -> Result<PathBuf> {
        let job = self.inner.store.get(id)?;
        match job.final_artifact() {
            Some(artifact) if job.status == crate::job::JobStatus::Completed => {
                Ok(artifact.path.clone())
            }
            _ => Err(ShortsmithError::NotReady {
                id: id.to_string(),
                status: job.status.to_string(),
            }),
        }
    }

    /// Request cancellation; honored between stages. Idempotent, and a
    /// no-op for jobs that already reached a terminal state.
    pub fn cancel(&self, id: Uuid) -> Result<()> {
        // NotFound still applies to unknown ids
        let _ = self.inner.store.get(id)?;
        if let Some(flag) = self
            .inner
            .cancel_flags
            .lock()
            .expect("cancel registry lock poisoned")
            .get(&id)
        {
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
            tracing::info!(job_id = %id, "cancellation requested");
        }
        Ok(())
    }

    async fn run_job(self, driver: JobDriver) {
        driver.begin();
        match self.execute(&driver).await {
            Ok(final_artifact) => driver.complete(final_artifact),
            Err((stage, err)) => driver.fail(stage, &err),
        }
        self.inner
            .cancel_flags
            .lock()
            .expect("cancel registry lock poisoned")
            .remove(&driver.id());
    }

    /// Run the stage sequence for one job.
    ///
    /// Any error is returned with the stage it belongs to; the caller
    /// records it and the job never leaves a partially composed final
    /// artifact behind (the final path is only written on full success).
    async fn execute(
        &self,
        driver: &JobDriver,
    ) -> std::result::Result<Artifact, (Stage, ShortsmithError)> {
        let job = self.inner.store.get(driver.id()).map_err(|e| (Stage::Script, e))?;
        let id = job.id;
        let request = job.request;

        // Stage 1: script
        driver.ensure_active(Stage::Script)?;
        let script_artifact = self
            .inner
            .providers
            .script
            .generate(&GenerationRequest {
                job_id: id,
                topic: request.topic.clone(),
                prompt: rytr::script_prompt(&request.topic, request.target_duration_secs),
                target_duration_secs: request.target_duration_secs as f64,
                voice: None,
                output_path: self.inner.layout.script_path(id),
            })
            .await
            .map_err(|e| (Stage::Script, e))?;
        let script_text = std::fs::read_to_string(&script_artifact.path)
            .map_err(|e| (Stage::Script, ShortsmithError::from(e)))?;
        driver.record_stage(Stage::Script, script_artifact.clone(), PROGRESS_SCRIPT);

        // Stage 2: voice — its measured duration becomes the reference
        // timeline everything else is forced onto
        driver.ensure_active(Stage::Voice)?;
        let voice_artifact = self
            .inner
            .providers
            .voice
            .generate(&GenerationRequest {
                job_id: id,
                topic: request.topic.clone(),
                prompt: script_text.clone(),
                target_duration_secs: request.target_duration_secs as f64,
                voice: request.voice.clone(),
                output_path: self.inner.layout.voice_path(id),
            })
            .await
            .map_err(|e| (Stage::Voice, e))?;
        let reference_secs = voice_artifact.duration_secs.filter(|d| *d > 0.0).ok_or((
            Stage::Voice,
            ShortsmithError::Provider {
                stage: Stage::Voice,
                message: "voice artifact has no usable duration".to_string(),
            },
        ))?;
        driver.record_stage(Stage::Voice, voice_artifact.clone(), PROGRESS_VOICE);
        tracing::debug!(job_id = %id, reference_secs, "reference duration captured");

        // Stages 3+4: music and video only need the reference duration, so
        // their provider calls run concurrently; both are reconciled
        // against the same reference before composition.
        driver.ensure_active(Stage::Music)?;
        let music_request = GenerationRequest {
            job_id: id,
            topic: request.topic.clone(),
            prompt: suno::music_prompt(&request.topic),
            target_duration_secs: reference_secs,
            voice: None,
            output_path: self.inner.layout.music_path(id),
        };
        let video_request = GenerationRequest {
            job_id: id,
            topic: request.topic.clone(),
            prompt: runway::video_prompt(&request.topic),
            target_duration_secs: reference_secs,
            voice: None,
            output_path: self.inner.layout.video_path(id),
        };
        let (music_result, video_result) = tokio::join!(
            self.inner.providers.music.generate(&music_request),
            self.inner.providers.video.generate(&video_request)
        );
        let music_artifact = music_result.map_err(|e| (Stage::Music, e))?;
        driver.record_stage(Stage::Music, music_artifact.clone(), PROGRESS_MUSIC);
        let video_artifact = video_result.map_err(|e| (Stage::Video, e))?;
        driver.record_stage(Stage::Video, video_artifact.clone(), PROGRESS_VIDEO);

        // Stage 5: reconcile both secondaries onto the reference, then
        // mix, mux and caption
        driver.ensure_active(Stage::Compose)?;
        let music_clip =
            AudioClip::load(&music_artifact.path).map_err(|e| (Stage::Compose, e))?;
        let fitted_music =
            reconcile_clip(&music_clip, reference_secs).map_err(|e| (Stage::Compose, e))?;
        let fade_ms = MUSIC_FADE_MAX_MS.min((reference_secs * 100.0) as u64);
        let music_fitted_path = self.inner.layout.music_fitted_path(id);
        fitted_music
            .with_fade_out(fade_ms)
            .save(&music_fitted_path)
            .map_err(|e| (Stage::Compose, e))?;

        let video_to_use = video::reconcile_video(
            self.inner.runner.as_ref(),
            &video_artifact.path,
            &self.inner.layout.video_fitted_path(id),
            reference_secs,
        )
        .await
        .map_err(|e| (Stage::Compose, e))?;

        let final_path = self.inner.layout.final_path(id);
        self.inner
            .composer
            .compose(ComposeInputs {
                voice: &voice_artifact.path,
                music: &music_fitted_path,
                video: &video_to_use,
                script: &script_text,
                captions: request.captions,
                mixed_audio: &self.inner.layout.mixed_audio_path(id),
                with_audio: &self.inner.layout.with_audio_path(id),
                output: &final_path,
            })
            .await
            .map_err(|e| (Stage::Compose, e))?;

        self.write_metadata(id, &request, reference_secs, &final_path)
            .map_err(|e| (Stage::Compose, e))?;

        Ok(Artifact {
            kind: ArtifactKind::Video,
            path: final_path,
            duration_secs: Some(reference_secs),
            provider: "compose".to_string(),
            prompt: request.topic,
        })
    }

    fn write_metadata(
        &self,
        id: Uuid,
        request: &CreateRequest,
        duration_secs: f64,
        final_path: &std::path::Path,
    ) -> Result<()> {
        let mut files = BTreeMap::new();
        files.insert(
            "script".to_string(),
            self.inner.layout.script_path(id).display().to_string(),
        );
        files.insert(
            "voiceover".to_string(),
            self.inner.layout.voice_path(id).display().to_string(),
        );
        files.insert(
            "music".to_string(),
            self.inner.layout.music_path(id).display().to_string(),
        );
        files.insert(
            "video".to_string(),
            self.inner.layout.video_path(id).display().to_string(),
        );
        files.insert("final".to_string(), final_path.display().to_string());

        let metadata = JobMetadata {
            topic: request.topic.clone(),
            created_at: Utc::now(),
            duration_secs,
            files,
        };
        let json = serde_json::to_string_pretty(&metadata)
            .map_err(|e| ShortsmithError::Other(format!("failed to encode metadata: {e}")))?;
        std::fs::write(self.inner.layout.metadata_path(id), json)?;
        Ok(())
    }
}

fn validate(request: &CreateRequest) -> Result<()> {
    if request.topic.trim().is_empty() {
        return Err(ShortsmithError::Validation {
            field: "topic".to_string(),
            message: "must not be empty".to_string(),
        });
    }
    if request.target_duration_secs == 0 {
        return Err(ShortsmithError::Validation {
            field: "target_duration_secs".to_string(),
            message: "must be positive".to_string(),
        });
    }
    Ok(())
}
