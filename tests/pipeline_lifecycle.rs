//! End-to-end pipeline tests against mock providers.
//!
//! Drives the full orchestrator — submit, poll, fetch — with deterministic
//! generators and a mock media-tool runner, covering the happy path, stage
//! failure, duration reconciliation and cancellation.

use shortsmith::job::{CreateRequest, Job, JobStatus, Stage};
use shortsmith::media::{AudioClip, MediaComposer, MockCommandRunner};
use shortsmith::pipeline::{Orchestrator, OutputLayout, ProviderSet};
use shortsmith::providers::MockGenerator;
use shortsmith::ShortsmithError;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

struct Fixture {
    orchestrator: Orchestrator,
    runner: Arc<MockCommandRunner>,
    _dir: tempfile::TempDir,
}

/// Build an orchestrator on mocks.
///
/// `voice_secs` sets the reference duration; `music_secs` the raw music
/// length; `video_secs` the duration ffprobe reports for the generated
/// video.
fn fixture(providers: ProviderSet, video_secs: f64) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let runner = Arc::new(MockCommandRunner::new().with_probe_duration(video_secs));
    let orchestrator = Orchestrator::new(
        providers,
        MediaComposer::new(runner.clone()),
        runner.clone(),
        OutputLayout::new(dir.path()),
    );
    Fixture {
        orchestrator,
        runner,
        _dir: dir,
    }
}

fn default_providers(voice_secs: f64, music_secs: f64, video_secs: f64) -> ProviderSet {
    ProviderSet {
        script: Arc::new(
            MockGenerator::new(Stage::Script).with_script("Ten space facts. Subscribe!"),
        ),
        voice: Arc::new(MockGenerator::new(Stage::Voice).with_duration_secs(voice_secs)),
        music: Arc::new(MockGenerator::new(Stage::Music).with_duration_secs(music_secs)),
        video: Arc::new(MockGenerator::new(Stage::Video).with_duration_secs(video_secs)),
    }
}

async fn wait_terminal(orchestrator: &Orchestrator, id: Uuid) -> Job {
    for _ in 0..400 {
        let job = orchestrator.status(id).unwrap();
        if job.status.is_terminal() {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {id} never reached a terminal state");
}

#[tokio::test]
async fn full_pipeline_completes_with_all_artifacts() {
    let fx = fixture(default_providers(4.0, 2.0, 4.0), 4.0);

    let id = fx
        .orchestrator
        .submit(CreateRequest::new("space facts"))
        .unwrap();
    let job = wait_terminal(&fx.orchestrator, id).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress, 100);
    assert!(job.error.is_none());
    assert!(job.completed_at.is_some());

    // All four generation stages plus the final artifact are recorded
    for key in ["script", "voice", "music", "video", "final"] {
        assert!(job.artifacts.contains_key(key), "missing artifact {key}");
    }

    // The final artifact's duration matches the measured voice duration
    let final_artifact = job.final_artifact().unwrap();
    let voice_secs = job.artifacts["voice"].duration_secs.unwrap();
    assert!((final_artifact.duration_secs.unwrap() - voice_secs).abs() <= 0.05);

    // fetch_final serves the recorded path, and the file exists
    let path = fx.orchestrator.fetch_final(id).unwrap();
    assert_eq!(path, final_artifact.path);
    assert!(path.exists());

    // Metadata was written next to the final video
    let metadata_path = fx.orchestrator.layout().metadata_path(id);
    let metadata: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(metadata_path).unwrap()).unwrap();
    assert_eq!(metadata["topic"], "space facts");
    assert!(metadata["files"]["final"].is_string());
}

#[tokio::test]
async fn voice_failure_is_terminal_and_keeps_script_artifact() {
    let providers = ProviderSet {
        script: Arc::new(MockGenerator::new(Stage::Script)),
        voice: Arc::new(MockGenerator::new(Stage::Voice).with_failure()),
        music: Arc::new(MockGenerator::new(Stage::Music).with_duration_secs(2.0)),
        video: Arc::new(MockGenerator::new(Stage::Video).with_duration_secs(4.0)),
    };
    let fx = fixture(providers, 4.0);

    let id = fx
        .orchestrator
        .submit(CreateRequest::new("doomed topic"))
        .unwrap();
    let job = wait_terminal(&fx.orchestrator, id).await;

    assert_eq!(job.status, JobStatus::Failed);
    let error = job.error.clone().unwrap();
    assert_eq!(error.stage, Stage::Voice);
    assert!(error.message.contains("voice"));

    // Earlier artifacts stay recorded for diagnostics; nothing later exists
    assert!(job.artifacts.contains_key("script"));
    assert!(!job.artifacts.contains_key("voice"));
    assert!(!job.artifacts.contains_key("music"));
    assert!(!job.artifacts.contains_key("video"));
    assert!(!job.artifacts.contains_key("final"));

    // No final artifact is served for a failed job
    assert!(matches!(
        fx.orchestrator.fetch_final(id),
        Err(ShortsmithError::NotReady { .. })
    ));
}

#[tokio::test]
async fn short_music_is_looped_onto_the_voice_timeline() {
    // 5s of music against a 40s voiceover: 8 whole copies, cut to 40s
    let fx = fixture(default_providers(40.0, 5.0, 40.0), 40.0);

    let id = fx
        .orchestrator
        .submit(CreateRequest::new("long form topic"))
        .unwrap();
    let job = wait_terminal(&fx.orchestrator, id).await;
    assert_eq!(job.status, JobStatus::Completed);

    let fitted = AudioClip::load(&fx.orchestrator.layout().music_fitted_path(id)).unwrap();
    assert!((fitted.duration_secs() - 40.0).abs() <= 0.05);

    // Loop boundaries: each 5s period restarts the original clip
    let raw = AudioClip::load(&fx.orchestrator.layout().music_path(id)).unwrap();
    let period = raw.samples().len();
    for copy in 1..8 {
        let offset = copy * period;
        assert_eq!(
            &fitted.samples()[offset..offset + 64],
            &raw.samples()[..64],
            "copy {copy} does not restart at the clip beginning"
        );
    }
}

#[tokio::test]
async fn long_video_is_trimmed_to_the_voice_duration() {
    // Provider delivers 45s of video for a 30s voiceover
    let fx = fixture(default_providers(30.0, 30.0, 45.0), 45.0);

    let id = fx
        .orchestrator
        .submit(CreateRequest::new("trim me"))
        .unwrap();
    let job = wait_terminal(&fx.orchestrator, id).await;
    assert_eq!(job.status, JobStatus::Completed);

    // Find the reconcile invocation among the runner's calls
    let trims: Vec<_> = fx
        .runner
        .invocations()
        .into_iter()
        .filter(|(program, args)| program == "ffmpeg" && args.join(" ").contains("-t 30.000"))
        .collect();
    assert!(!trims.is_empty(), "no ffmpeg trim invocation recorded");
}

#[tokio::test]
async fn progress_is_monotonic_under_polling() {
    let providers = ProviderSet {
        script: Arc::new(
            MockGenerator::new(Stage::Script).with_delay(Duration::from_millis(30)),
        ),
        voice: Arc::new(
            MockGenerator::new(Stage::Voice)
                .with_duration_secs(2.0)
                .with_delay(Duration::from_millis(30)),
        ),
        music: Arc::new(
            MockGenerator::new(Stage::Music)
                .with_duration_secs(1.0)
                .with_delay(Duration::from_millis(30)),
        ),
        video: Arc::new(
            MockGenerator::new(Stage::Video)
                .with_duration_secs(2.0)
                .with_delay(Duration::from_millis(30)),
        ),
    };
    let fx = fixture(providers, 2.0);

    let id = fx
        .orchestrator
        .submit(CreateRequest::new("watched topic"))
        .unwrap();

    let mut observed = Vec::new();
    loop {
        let job = fx.orchestrator.status(id).unwrap();
        observed.push(job.progress);
        if job.status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert!(
        observed.windows(2).all(|w| w[0] <= w[1]),
        "progress went backwards: {observed:?}"
    );
    assert_eq!(*observed.last().unwrap(), 100);
}

#[tokio::test]
async fn repeated_status_reads_are_identical_without_updates() {
    let fx = fixture(default_providers(2.0, 1.0, 2.0), 2.0);

    let id = fx
        .orchestrator
        .submit(CreateRequest::new("stable topic"))
        .unwrap();
    let job = wait_terminal(&fx.orchestrator, id).await;

    // Terminal job: no further writes can happen between these reads
    let first = fx.orchestrator.status(id).unwrap();
    let second = fx.orchestrator.status(id).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, job);
}

#[tokio::test]
async fn cancellation_between_stages_fails_the_job() {
    let providers = ProviderSet {
        script: Arc::new(
            MockGenerator::new(Stage::Script).with_delay(Duration::from_millis(200)),
        ),
        voice: Arc::new(MockGenerator::new(Stage::Voice).with_duration_secs(2.0)),
        music: Arc::new(MockGenerator::new(Stage::Music).with_duration_secs(1.0)),
        video: Arc::new(MockGenerator::new(Stage::Video).with_duration_secs(2.0)),
    };
    let fx = fixture(providers, 2.0);

    let id = fx
        .orchestrator
        .submit(CreateRequest::new("cancelled topic"))
        .unwrap();
    fx.orchestrator.cancel(id).unwrap();

    let job = wait_terminal(&fx.orchestrator, id).await;
    assert_eq!(job.status, JobStatus::Failed);
    let error = job.error.unwrap();
    assert!(
        error.message.contains("cancelled"),
        "unexpected error message: {}",
        error.message
    );
    assert!(!job.artifacts.contains_key("final"));

    // Cancelling again is harmless
    fx.orchestrator.cancel(id).unwrap();
}

#[tokio::test]
async fn concurrent_jobs_complete_independently() {
    let fx = fixture(default_providers(2.0, 1.0, 2.0), 2.0);

    let ids: Vec<Uuid> = (0..4)
        .map(|i| {
            fx.orchestrator
                .submit(CreateRequest::new(format!("topic {i}")))
                .unwrap()
        })
        .collect();

    for id in &ids {
        let job = wait_terminal(&fx.orchestrator, *id).await;
        assert_eq!(job.status, JobStatus::Completed, "job {id} failed");
        assert!(fx.orchestrator.fetch_final(*id).unwrap().exists());
    }

    // All jobs are listed, newest first
    let listed = fx.orchestrator.list();
    assert_eq!(listed.len(), 4);
    assert!(
        listed
            .windows(2)
            .all(|w| w[0].created_at >= w[1].created_at)
    );
}
