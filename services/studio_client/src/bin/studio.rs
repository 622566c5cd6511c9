//! services/studio_client/src/bin/studio.rs

use avatar_studio_core::domain::JobView;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use studio_client_lib::{
    config::Config,
    error::ClientError,
    remote::{
        AuthGateway, ClientState, JobBoard, JobSyncService, MediaFile, SubmissionReceipt,
        Submissions,
    },
};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "studio", version, about = "Avatar studio client: accounts, job submission and job tracking")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and sign in
    Register {
        username: String,
        email: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign in with an existing account
    Login {
        username: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign out and forget the stored token
    Logout,
    /// Check whether the stored token is still valid
    Verify,
    /// Show the signed-in user
    Whoami,
    /// List jobs once
    Jobs,
    /// Keep the job list refreshed until interrupted
    Watch {
        /// Poll period in seconds (defaults to POLL_INTERVAL_SECS)
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Download the output video of a completed job
    Download {
        job_id: String,
        /// Target directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Submit a new generation job
    #[command(subcommand)]
    Submit(SubmitCommand),
}

#[derive(Subcommand)]
enum SubmitCommand {
    /// Lip-sync a video or image to an audio track
    AvatarSync {
        #[arg(long)]
        audio: PathBuf,
        #[arg(long)]
        video: PathBuf,
    },
    /// Speak a text through an avatar
    TextToAvatar {
        #[arg(long)]
        text: String,
        #[arg(long, default_value = "female")]
        gender: String,
        #[arg(long)]
        video: PathBuf,
    },
    /// One personalised video per recipient; `{name}` in the script is substituted
    Wishes {
        #[arg(long)]
        script: String,
        /// Recipient name (repeatable)
        #[arg(long = "name", required = true)]
        names: Vec<String>,
        #[arg(long, default_value = "neutral")]
        gender: String,
        #[arg(long)]
        video: PathBuf,
    },
    /// Turn a slide deck into a narrated lecture
    Lecture {
        #[arg(long)]
        slides: PathBuf,
        #[arg(long)]
        avatar: Option<PathBuf>,
        #[arg(long, default_value = "english")]
        language: String,
        #[arg(long, default_value = "female")]
        gender: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!("Using backend {}", config.api_url);

    // --- 2. Build the Shared State ---
    let state = Arc::new(ClientState::with_default_storage(config.clone())?);
    let auth = AuthGateway::new(state.clone());
    let jobs = JobSyncService::new(state.clone());

    // --- 3. Dispatch ---
    match cli.command {
        Commands::Register {
            username,
            email,
            password,
        } => {
            let password = password_or_prompt(password)?;
            let session = auth.register(&username, &email, &password).await?;
            println!("Registered and signed in as {}", session.user.username);
        }
        Commands::Login { username, password } => {
            let password = password_or_prompt(password)?;
            let session = auth.login(&username, &password).await?;
            println!(
                "Signed in as {} <{}>",
                session.user.username, session.user.email
            );
        }
        Commands::Logout => {
            auth.logout().await;
            println!("Signed out");
        }
        Commands::Verify => {
            let verification = auth.verify().await;
            match verification.user {
                Some(user) if verification.valid => println!("Token valid for {}", user.username),
                _ => {
                    return Err(ClientError::Auth(
                        "token is missing or no longer valid".to_string(),
                    ))
                }
            }
        }
        Commands::Whoami => match auth.get_current_user().await {
            Some(user) => println!("{} <{}> (id {})", user.username, user.email, user.user_id),
            None => return Err(ClientError::Auth("not signed in".to_string())),
        },
        Commands::Jobs => {
            let views = jobs.list_jobs().await?;
            print_jobs(&views);
        }
        Commands::Watch { interval } => {
            let period = interval
                .filter(|s| *s > 0)
                .map(Duration::from_secs)
                .unwrap_or(config.poll_interval);
            let board = JobBoard::new(jobs);
            let cancel = CancellationToken::new();
            let stopper = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    stopper.cancel();
                }
            });
            board.watch(period, cancel, print_jobs).await;
        }
        Commands::Download { job_id, out } => {
            let path = jobs.download(&job_id, &out).await?;
            println!("Saved {}", path.display());
        }
        Commands::Submit(command) => {
            let submissions = Submissions::new(state.clone());
            let receipt = submit(&submissions, command).await?;
            print_receipt(&receipt);
        }
    }

    Ok(())
}

async fn submit(
    submissions: &Submissions,
    command: SubmitCommand,
) -> Result<SubmissionReceipt, ClientError> {
    match command {
        SubmitCommand::AvatarSync { audio, video } => {
            let audio = MediaFile::open(audio).await?;
            let video = MediaFile::open(video).await?;
            submissions.avatar_sync(audio, video).await
        }
        SubmitCommand::TextToAvatar {
            text,
            gender,
            video,
        } => {
            let video = MediaFile::open(video).await?;
            submissions.text_to_avatar(&text, &gender, video).await
        }
        SubmitCommand::Wishes {
            script,
            names,
            gender,
            video,
        } => {
            let video = MediaFile::open(video).await?;
            submissions
                .personalized_wishes(&script, &names, &gender, video)
                .await
        }
        SubmitCommand::Lecture {
            slides,
            avatar,
            language,
            gender,
        } => {
            let slides = MediaFile::open(slides).await?;
            let avatar = match avatar {
                Some(path) => Some(MediaFile::open(path).await?),
                None => None,
            };
            submissions.lecture(slides, avatar, &language, &gender).await
        }
    }
}

fn password_or_prompt(password: Option<String>) -> Result<String, ClientError> {
    match password {
        Some(password) => Ok(password),
        None => Ok(rpassword::prompt_password("Password: ")?),
    }
}

fn print_receipt(receipt: &SubmissionReceipt) {
    match (&receipt.job_id, receipt.job_count()) {
        (Some(job_id), _) => println!("Job submitted: {}", job_id),
        (None, 0) => println!("Job submitted"),
        (None, n) => println!("{} jobs queued", n),
    }
}

fn print_jobs(views: &[JobView]) {
    if views.is_empty() {
        println!("No jobs yet.");
        return;
    }
    println!(
        "{:<38} {:<22} {:<11} {:<20} {:<20} {:<20} {:>10} {:>10}",
        "JOB", "FEATURE", "STATUS", "SUBMITTED", "STARTED", "ENDED", "DURATION", "E2E"
    );
    for job in views {
        println!(
            "{:<38} {:<22} {:<11} {:<20} {:<20} {:<20} {:>10} {:>10}",
            job.id,
            job.feature,
            job.badge,
            job.submitted,
            job.started,
            job.ended,
            job.duration_label(),
            job.end_to_end_label()
        );
    }
}
