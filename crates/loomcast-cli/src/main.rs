//! Loomcast CLI: uploads a video with its thumbnail and catalogues it.
//!
//! Set LOOMCAST_API_KEY and LOOMCAST_API_URL (or API_URL). Uses X-API-Key auth.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use loomcast_api_client::{
    ApiClient, HttpCredentialBroker, HttpMetadataFinalizer, HttpTransferExecutor,
};
use loomcast_cli::{init_tracing, print_json, read_media, write_recording_checkpoint};
use loomcast_core::models::{FormFields, Visibility};
use loomcast_core::{CheckpointBackend, ErrorMetadata, UploadConfig};
use loomcast_processing::{
    DurationProbe, FfprobeDurationProbe, MediaSelector, OrchestratorConfig, SessionRecoveryAgent,
    UploadForm, UploadOrchestrator,
};
use loomcast_storage::{blob_dir, create_session_storage};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "loomcast", about = "Loomcast upload CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a video and its thumbnail, then save the video details
    Upload {
        /// Video file. Optional when a recorded video is waiting in the session
        #[arg(long)]
        video: Option<PathBuf>,
        /// Thumbnail image file
        #[arg(long)]
        thumbnail: PathBuf,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// public or private
        #[arg(long, default_value = "public")]
        visibility: String,
    },
    /// Leave a recorded video in the session for the next upload to pick up
    Checkpoint {
        /// Recorded video file
        file: PathBuf,
        /// Duration in seconds, if known
        #[arg(long)]
        duration: Option<f64>,
    },
    /// Print the duration ffprobe reports for a video file
    Probe {
        /// Video file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = UploadConfig::from_env().context("Failed to load configuration")?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Upload {
            video,
            thumbnail,
            title,
            description,
            visibility,
        } => {
            let visibility: Visibility = visibility.parse()?;
            upload(&config, video, thumbnail, title, description, visibility).await?;
        }
        Commands::Checkpoint { file, duration } => {
            if config.checkpoint_backend == CheckpointBackend::Memory {
                bail!("CHECKPOINT_BACKEND=memory does not outlive this process; use local");
            }
            let storage = create_session_storage(&config).await?;
            let checkpoint = write_recording_checkpoint(
                storage.checkpoints.as_ref(),
                &blob_dir(&config.session_dir),
                &file,
                duration,
            )
            .await?;
            print_json(&checkpoint)?;
        }
        Commands::Probe { file } => {
            let probe = FfprobeDurationProbe::new(config.ffprobe_path.clone())?;
            let duration = probe.probe(&file).await?;
            print_json(&serde_json::json!({
                "file": file.display().to_string(),
                "duration": duration,
            }))?;
        }
    }

    Ok(())
}

async fn upload(
    config: &UploadConfig,
    video: Option<PathBuf>,
    thumbnail: PathBuf,
    title: String,
    description: String,
    visibility: Visibility,
) -> anyhow::Result<()> {
    let api = ApiClient::from_config(config).context(
        "Failed to create API client. Set LOOMCAST_API_KEY and LOOMCAST_API_URL (or API_URL)",
    )?;
    let storage = create_session_storage(config).await?;
    let probe: Arc<dyn DurationProbe> =
        Arc::new(FfprobeDurationProbe::new(config.ffprobe_path.clone())?);

    let mut form = UploadForm::new(config.size_policy)
        .with_probe(probe.clone())
        .with_fields(FormFields::new(title, description).with_visibility(visibility));

    let recovered = SessionRecoveryAgent::from_storage(&storage)
        .spawn(MediaSelector::new(config.size_policy).with_probe(probe));
    let adopted = form.adopt_recovered(recovered).await;

    match video {
        Some(path) => {
            if adopted {
                tracing::info!("Replacing recovered recording with {}", path.display());
            }
            form.select_video(read_media(&path).await?)?;
        }
        None if adopted => {}
        None => bail!("No --video given and no recorded video to recover"),
    }
    form.select_thumbnail(read_media(&thumbnail).await?)?;

    let orchestrator = UploadOrchestrator::new(
        Arc::new(HttpCredentialBroker::new(api.clone())),
        Arc::new(HttpTransferExecutor::new(config.transfer_timeout())?),
        Arc::new(HttpMetadataFinalizer::new(api)),
        OrchestratorConfig::from_config(config),
    );

    match orchestrator.submit(&mut form).await {
        Ok(record) => print_json(&record),
        Err(failure) => {
            print_json(&serde_json::json!({
                "error": failure.error.client_message(),
                "code": failure.error.error_code(),
                "stage": failure.stage,
                "orphanedVideoId": failure.orphaned_video_id,
            }))?;
            Err(failure.into())
        }
    }
}
