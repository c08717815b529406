use anyhow::Result;
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use shortsmith::cli::{Cli, Commands};
use shortsmith::config::Config;
use shortsmith::daemon::{build_orchestrator, run_daemon};
use shortsmith::ipc::client::send_command;
use shortsmith::ipc::protocol::{Command, Response};
use shortsmith::ipc::server::IpcServer;
use shortsmith::job::{CreateRequest, JobSnapshot, JobStatus};
use shortsmith::media::{SystemCommandRunner, video};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Create {
            topic,
            duration,
            no_captions,
            voice,
            output_dir,
        } => {
            init_tracing(cli.verbose);
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(dir) = output_dir {
                config.output.dir = dir;
            }
            run_create(config, topic, duration, !no_captions, voice, cli.quiet).await?;
        }
        Commands::Daemon { socket } => {
            init_tracing(cli.verbose.max(1));
            let config = load_config(cli.config.as_deref())?;
            run_daemon(config, socket, cli.quiet).await?;
        }
        Commands::Submit {
            topic,
            duration,
            no_captions,
            voice,
            socket,
        } => {
            handle_ipc_command(
                socket,
                Command::Submit {
                    topic,
                    duration_secs: duration,
                    captions: !no_captions,
                    voice,
                },
                cli.verbose,
            )
            .await?;
        }
        Commands::Status { id, socket } => {
            handle_ipc_command(socket, Command::Status { id }, cli.verbose).await?;
        }
        Commands::List { socket } => {
            handle_ipc_command(socket, Command::List, cli.verbose).await?;
        }
        Commands::Fetch { id, socket } => {
            handle_ipc_command(socket, Command::Fetch { id }, cli.verbose).await?;
        }
        Commands::Cancel { id, socket } => {
            handle_ipc_command(socket, Command::Cancel { id }, cli.verbose).await?;
        }
        Commands::Check => {
            let config = load_config(cli.config.as_deref())?;
            check_dependencies(&config).await;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "shortsmith",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/shortsmith/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&std::path::Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        // Load from custom path
        Config::load(path)?
    } else {
        // Try default path, fall back to defaults
        let default_path = Config::default_path();
        Config::load_or_default(&default_path)
    };

    // Apply environment variable overrides
    Ok(config.with_env_overrides())
}

fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "shortsmith=warn",
        1 => "shortsmith=info",
        _ => "shortsmith=debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run the whole pipeline locally and wait for the result.
async fn run_create(
    config: Config,
    topic: String,
    duration: u64,
    captions: bool,
    voice: Option<String>,
    quiet: bool,
) -> Result<()> {
    let orchestrator = build_orchestrator(&config)?;

    let request = CreateRequest {
        topic,
        target_duration_secs: duration,
        captions,
        voice,
    };
    let id = orchestrator.submit(request)?;

    if !quiet {
        eprintln!("Job {} submitted.", id);
    }

    // Poll until the job reaches a terminal state
    let mut last_progress = 0;
    let job = loop {
        let job = orchestrator.status(id)?;
        if !quiet && job.progress > last_progress {
            last_progress = job.progress;
            eprintln!("  {}%  ({})", job.progress, job.status);
        }
        if job.status.is_terminal() {
            break job;
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;
    };

    match job.status {
        JobStatus::Completed => {
            let path = orchestrator.fetch_final(id)?;
            if quiet {
                println!("{}", path.display());
            } else {
                println!("{} {}", "Done:".green(), path.display());
            }
            Ok(())
        }
        _ => {
            let error = job
                .error
                .map(|e| format!("{} stage: {}", e.stage, e.message))
                .unwrap_or_else(|| "unknown failure".to_string());
            eprintln!("{}", format!("Job failed: {}", error).red());
            std::process::exit(1);
        }
    }
}

/// Send IPC command to daemon and render the response.
async fn handle_ipc_command(
    socket: Option<std::path::PathBuf>,
    command: Command,
    verbose: u8,
) -> Result<()> {
    let socket_path = socket.unwrap_or_else(IpcServer::default_socket_path);

    match send_command(&socket_path, command).await {
        Ok(response) => match response {
            Response::Ok { message } => {
                println!("{}", message.green());
            }
            Response::Submitted { id } => {
                println!("{} {}", "Submitted:".green(), id);
            }
            Response::Job { job } => {
                render_job(&job, verbose);
            }
            Response::Jobs { jobs } => {
                if jobs.is_empty() {
                    println!("No jobs.");
                }
                for job in jobs {
                    println!(
                        "{}  {:10}  {:3}%  {}",
                        job.id,
                        colored_status(job.status),
                        job.progress,
                        job.topic
                    );
                }
            }
            Response::Artifact { path } => {
                println!("{}", path);
            }
            Response::Error { message } => {
                eprintln!("{}", format!("Error: {}", message).red());
                std::process::exit(1);
            }
        },
        Err(e) => {
            eprintln!(
                "{}",
                format!("Failed to communicate with daemon: {}", e).red()
            );
            eprintln!("Is the daemon running? Start it with: shortsmith daemon");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn colored_status(status: JobStatus) -> String {
    match status {
        JobStatus::Queued => status.to_string().dimmed().to_string(),
        JobStatus::Processing => status.to_string().yellow().to_string(),
        JobStatus::Completed => status.to_string().green().to_string(),
        JobStatus::Failed => status.to_string().red().to_string(),
    }
}

/// Render one job snapshot.
fn render_job(job: &JobSnapshot, verbose: u8) {
    println!("Job {}:", job.id);
    println!("  {}     {}", "Topic:".dimmed(), job.topic);
    println!("  {}    {}", "Status:".dimmed(), colored_status(job.status));
    println!("  {}  {}%", "Progress:".dimmed(), job.progress);
    println!(
        "  {}   {}",
        "Created:".dimmed(),
        job.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if let Some(completed_at) = job.completed_at {
        println!(
            "  {}  {}",
            "Finished:".dimmed(),
            completed_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    if let Some(error) = &job.error {
        println!(
            "  {}     {}",
            "Error:".dimmed(),
            format!("{} stage: {}", error.stage, error.message).red()
        );
    }
    if verbose >= 1 && !job.artifacts.is_empty() {
        println!("  {}", "Artifacts:".dimmed());
        for (stage, path) in &job.artifacts {
            println!("    {:7} {}", stage, path);
        }
    }
}

/// Check external tools and provider credentials.
async fn check_dependencies(config: &Config) {
    let runner = SystemCommandRunner::new();
    let mut all_ok = true;

    match video::check_prerequisites(&runner).await {
        Ok(()) => println!("  {} ffmpeg/ffprobe", "ok".green()),
        Err(e) => {
            all_ok = false;
            println!("  {} ffmpeg/ffprobe: {}", "MISSING".red(), e);
            println!("    Install: sudo apt install ffmpeg");
        }
    }

    for (name, key) in [
        ("RYTR_API_KEY", &config.providers.script.api_key),
        ("ELEVENLABS_API_KEY", &config.providers.voice.api_key),
        ("SUNO_API_KEY", &config.providers.music.api_key),
        ("RUNWAY_API_KEY", &config.providers.video.api_key),
    ] {
        if key.is_empty() {
            all_ok = false;
            println!("  {} {}", "MISSING".red(), name);
        } else {
            println!("  {} {}", "ok".green(), name);
        }
    }

    if !all_ok {
        std::process::exit(1);
    }
}
