//! Command handler implementation for the daemon.

use crate::daemon::DaemonState;
use crate::ipc::protocol::{Command, Response};
use crate::ipc::server::CommandHandler;
use crate::job::CreateRequest;
use std::sync::Arc;

/// Command handler for daemon IPC commands.
pub struct DaemonCommandHandler {
    state: Arc<DaemonState>,
}

impl DaemonCommandHandler {
    /// Creates a new command handler.
    pub fn new(state: Arc<DaemonState>) -> Self {
        Self { state }
    }

    fn submit(
        &self,
        topic: String,
        duration_secs: u64,
        captions: bool,
        voice: Option<String>,
    ) -> Response {
        let request = CreateRequest {
            topic,
            target_duration_secs: duration_secs,
            captions,
            voice,
        };
        match self.state.orchestrator.submit(request) {
            Ok(id) => Response::Submitted { id },
            Err(e) => Response::Error {
                message: e.to_string(),
            },
        }
    }

    fn status(&self, id: uuid::Uuid) -> Response {
        match self.state.orchestrator.status(id) {
            Ok(job) => Response::Job {
                job: job.snapshot(),
            },
            Err(e) => Response::Error {
                message: e.to_string(),
            },
        }
    }

    fn list(&self) -> Response {
        let jobs = self
            .state
            .orchestrator
            .list()
            .iter()
            .map(|job| job.snapshot())
            .collect();
        Response::Jobs { jobs }
    }

    fn fetch(&self, id: uuid::Uuid) -> Response {
        match self.state.orchestrator.fetch_final(id) {
            Ok(path) => Response::Artifact {
                path: path.display().to_string(),
            },
            Err(e) => Response::Error {
                message: e.to_string(),
            },
        }
    }

    fn cancel(&self, id: uuid::Uuid) -> Response {
        match self.state.orchestrator.cancel(id) {
            Ok(()) => Response::Ok {
                message: format!("cancellation requested for {id}"),
            },
            Err(e) => Response::Error {
                message: e.to_string(),
            },
        }
    }
}

#[async_trait::async_trait]
impl CommandHandler for DaemonCommandHandler {
    async fn handle(&self, command: Command) -> Response {
        match command {
            Command::Submit {
                topic,
                duration_secs,
                captions,
                voice,
            } => self.submit(topic, duration_secs, captions, voice),
            Command::Status { id } => self.status(id),
            Command::List => self.list(),
            Command::Fetch { id } => self.fetch(id),
            Command::Cancel { id } => self.cancel(id),
            Command::Shutdown => {
                self.state.shutdown.notify_one();
                Response::Ok {
                    message: "shutting down".to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{JobStatus, Stage};
    use crate::media::{MediaComposer, MockCommandRunner};
    use crate::pipeline::{Orchestrator, OutputLayout, ProviderSet};
    use crate::providers::MockGenerator;
    use uuid::Uuid;

    fn create_test_handler(dir: &std::path::Path) -> DaemonCommandHandler {
        let runner = Arc::new(MockCommandRunner::new());
        let providers = ProviderSet {
            script: Arc::new(MockGenerator::new(Stage::Script)),
            voice: Arc::new(MockGenerator::new(Stage::Voice).with_duration_secs(3.0)),
            music: Arc::new(MockGenerator::new(Stage::Music).with_duration_secs(1.0)),
            video: Arc::new(MockGenerator::new(Stage::Video).with_duration_secs(3.0)),
        };
        let orchestrator = Orchestrator::new(
            providers,
            MediaComposer::new(runner.clone()),
            runner,
            OutputLayout::new(dir),
        );
        DaemonCommandHandler::new(Arc::new(DaemonState::new(orchestrator)))
    }

    fn submit_command(topic: &str) -> Command {
        Command::Submit {
            topic: topic.to_string(),
            duration_secs: 30,
            captions: true,
            voice: None,
        }
    }

    #[tokio::test]
    async fn test_handler_submit_returns_id() {
        let dir = tempfile::tempdir().unwrap();
        let handler = create_test_handler(dir.path());

        let response = handler.handle(submit_command("space facts")).await;
        assert!(matches!(response, Response::Submitted { .. }));
    }

    #[tokio::test]
    async fn test_handler_submit_empty_topic_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let handler = create_test_handler(dir.path());

        let response = handler.handle(submit_command("")).await;
        match response {
            Response::Error { message } => assert!(message.contains("topic")),
            other => panic!("Expected Error response, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_handler_status_unknown_job() {
        let dir = tempfile::tempdir().unwrap();
        let handler = create_test_handler(dir.path());

        let response = handler.handle(Command::Status { id: Uuid::new_v4() }).await;
        match response {
            Response::Error { message } => assert!(message.contains("No job with id")),
            other => panic!("Expected Error response, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_handler_status_after_submit() {
        let dir = tempfile::tempdir().unwrap();
        let handler = create_test_handler(dir.path());

        let id = match handler.handle(submit_command("volcano facts")).await {
            Response::Submitted { id } => id,
            other => panic!("Expected Submitted, got {:?}", other),
        };

        let response = handler.handle(Command::Status { id }).await;
        match response {
            Response::Job { job } => {
                assert_eq!(job.id, id);
                assert_eq!(job.topic, "volcano facts");
            }
            other => panic!("Expected Job response, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_handler_list_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let handler = create_test_handler(dir.path());

        let first = match handler.handle(submit_command("first")).await {
            Response::Submitted { id } => id,
            other => panic!("Expected Submitted, got {:?}", other),
        };
        tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
        let second = match handler.handle(submit_command("second")).await {
            Response::Submitted { id } => id,
            other => panic!("Expected Submitted, got {:?}", other),
        };

        let response = handler.handle(Command::List).await;
        match response {
            Response::Jobs { jobs } => {
                assert_eq!(jobs.len(), 2);
                assert_eq!(jobs[0].id, second);
                assert_eq!(jobs[1].id, first);
            }
            other => panic!("Expected Jobs response, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_handler_fetch_completed_job() {
        let dir = tempfile::tempdir().unwrap();
        let handler = create_test_handler(dir.path());

        let id = match handler.handle(submit_command("deep sea")).await {
            Response::Submitted { id } => id,
            other => panic!("Expected Submitted, got {:?}", other),
        };

        // Poll until the mock pipeline reaches a terminal state
        for _ in 0..100 {
            if let Response::Job { job } = handler.handle(Command::Status { id }).await
                && job.status.is_terminal()
            {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
        }

        match handler.handle(Command::Status { id }).await {
            Response::Job { job } => assert_eq!(job.status, JobStatus::Completed),
            other => panic!("Expected Job response, got {:?}", other),
        }

        let response = handler.handle(Command::Fetch { id }).await;
        match response {
            Response::Artifact { path } => {
                assert!(path.ends_with(&format!("{id}.mp4")));
            }
            other => panic!("Expected Artifact response, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_handler_cancel_unknown_job() {
        let dir = tempfile::tempdir().unwrap();
        let handler = create_test_handler(dir.path());

        let response = handler.handle(Command::Cancel { id: Uuid::new_v4() }).await;
        assert!(matches!(response, Response::Error { .. }));
    }

    #[tokio::test]
    async fn test_handler_shutdown_notifies_daemon() {
        let dir = tempfile::tempdir().unwrap();
        let handler = create_test_handler(dir.path());
        let state = Arc::clone(&handler.state);

        let notified = tokio::spawn(async move { state.shutdown.notified().await });
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;

        let response = handler.handle(Command::Shutdown).await;
        assert!(matches!(response, Response::Ok { .. }));
        notified.await.unwrap();
    }
}
