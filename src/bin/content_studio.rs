// content_studio - media analysis and social post studio
// JSON-lines sidecar over stdio, or a one-shot pipeline over files

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use content_studio::config::{DEFAULT_API_BASE, DEFAULT_API_KEY_ENV, DEFAULT_MODEL, MAX_FILE_SIZE_MB};
use content_studio::organ::{Organ, Response, Stimulus, StudioOrgan};
use content_studio::{Audience, Studio, StudioConfig};

#[derive(Parser)]
#[command(name = "content_studio", version, about = "Content Studio - Media Analysis and Social Post Generation")]
struct Args {
    /// Model provider REST base URL
    #[arg(long, env = "CONTENT_STUDIO_API_BASE", default_value = DEFAULT_API_BASE, global = true)]
    api_base: String,

    /// Model used for analysis and generation
    #[arg(long, env = "CONTENT_STUDIO_MODEL", default_value = DEFAULT_MODEL, global = true)]
    model: String,

    /// Environment variable holding the API key
    #[arg(long, default_value = DEFAULT_API_KEY_ENV, global = true)]
    api_key_env: String,

    /// Maximum upload size in megabytes
    #[arg(long, env = "CONTENT_STUDIO_MAX_UPLOAD_MB", default_value_t = MAX_FILE_SIZE_MB, global = true)]
    max_upload_mb: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read one Stimulus per line on stdin, write one Response per line on stdout
    Serve,

    /// Upload, analyze and generate for the given files, then print the result
    Run {
        /// Video or image files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Audience to generate for
        #[arg(long, value_enum, default_value_t = AudienceArg::Both)]
        audience: AudienceArg,

        /// Instruction passed to the generator
        #[arg(long)]
        feedback: Option<String>,

        /// Print the developer report instead of JSON
        #[arg(long)]
        dev: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum AudienceArg {
    Kids,
    Mg,
    Both,
}

impl AudienceArg {
    fn audiences(self) -> Vec<Audience> {
        match self {
            AudienceArg::Kids => vec![Audience::Kids],
            AudienceArg::Mg => vec![Audience::Mg],
            AudienceArg::Both => Audience::ALL.to_vec(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries responses
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = StudioConfig {
        api_base: args.api_base,
        model: args.model,
        api_key_env: args.api_key_env,
        max_file_size_bytes: args.max_upload_mb * 1024 * 1024,
    };

    info!("🎬 Starting Content Studio");
    info!("   Model: {} ({})", config.model, config.api_base);
    info!("   Max upload: {} MB", config.max_file_size_mb());
    if config.resolve_api_key().is_err() {
        warn!("   {} is not set; model calls will fail", config.api_key_env);
    }

    let studio = Arc::new(Studio::with_gemini(config).context("Failed to create model client")?);

    match args.command {
        Command::Serve => serve(studio).await,
        Command::Run { files, audience, feedback, dev } => {
            run(studio, files, audience.audiences(), feedback, dev).await
        }
    }
}

/// Serve stimuli from stdin until EOF
async fn serve(studio: Arc<Studio>) -> Result<()> {
    let organ = Arc::new(StudioOrgan::new(studio));
    let card = organ.describe();
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("🎬 {} v{}", card.name, card.version);
    info!("   Division: {} | Subsystem: {}", card.division, card.subsystem);
    info!("   {}", card.description);
    for func in card.functions.iter() {
        info!("      • {} - {}", func.name, func.description);
    }
    info!("   ✅ {} functions available on stdio", card.functions.len());
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let (tx, mut rx) = mpsc::unbounded_channel::<Response>();

    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(response) = rx.recv().await {
            let mut line = serde_json::to_vec(&response).context("Failed to serialize response")?;
            line.push(b'\n');
            stdout.write_all(&line).await?;
            stdout.flush().await?;
            debug!("Sent: ok={}, latency={}ms", response.ok, response.latency_ms);
        }
        Ok::<_, anyhow::Error>(())
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tasks = JoinSet::new();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        reap_finished(&mut tasks);
        if line.trim().is_empty() {
            continue;
        }

        let stimulus: Stimulus = match serde_json::from_str(&line) {
            Ok(stimulus) => stimulus,
            Err(e) => {
                warn!("Malformed stimulus: {}", e);
                let _ = tx.send(Response {
                    ok: false,
                    output: serde_json::json!({ "error": "MalformedStimulus", "message": e.to_string() }),
                    latency_ms: 0,
                    cost: None,
                    request_id: None,
                });
                continue;
            }
        };

        debug!("Received: op={}", stimulus.op);
        let organ = Arc::clone(&organ);
        let tx = tx.clone();
        tasks.spawn(async move {
            let request_id = stimulus.context.get("request_id").cloned();
            let response = match organ.stimulate(stimulus).await {
                Ok(resp) => resp,
                Err(e) => {
                    error!("Stimulate error: {:?}", e);
                    Response {
                        ok: false,
                        output: serde_json::json!({ "error": e.to_string() }),
                        latency_ms: 0,
                        cost: None,
                        request_id,
                    }
                }
            };
            let _ = tx.send(response);
        });
    }

    // Let in-flight work finish before closing stdout
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            error!("Stimulus task failed: {}", e);
        }
    }
    drop(tx);
    writer.await.context("Writer task panicked")??;

    info!("stdin closed, shutting down");
    Ok(())
}

/// Drop finished stimulus tasks so a long session holds only in-flight ones
fn reap_finished(tasks: &mut JoinSet<()>) -> usize {
    let mut reaped = 0;
    while let Some(joined) = tasks.try_join_next() {
        if let Err(e) = joined {
            error!("Stimulus task failed: {}", e);
        }
        reaped += 1;
    }
    reaped
}

/// One-shot pipeline: submit, analyze, generate, print
async fn run(
    studio: Arc<Studio>,
    files: Vec<PathBuf>,
    audiences: Vec<Audience>,
    feedback: Option<String>,
    dev: bool,
) -> Result<()> {
    let report = studio.submit_paths(&files).await;
    for rejection in &report.rejected {
        warn!("❌ {}", rejection.message);
    }
    if report.accepted.is_empty() {
        anyhow::bail!("No valid files to analyze");
    }

    info!("🔍 Analyzing {} file(s)", studio.pending_count().await);
    let analyzed = studio.analyze_pending().await;

    let mut jobs = Vec::new();
    for (id, _) in &analyzed {
        for &audience in &audiences {
            let studio = Arc::clone(&studio);
            let id = id.clone();
            let feedback = feedback.clone();
            jobs.push(tokio::spawn(async move {
                let status = studio.generate(&id, audience, feedback.as_deref()).await;
                debug!(item = %id, audience = %audience, ?status, "Generation finished");
            }));
        }
    }
    for job in futures::future::join_all(jobs).await {
        job.context("Generation task panicked")?;
    }

    if dev {
        print!("{}", studio.report().await);
    } else {
        let snapshot = studio.snapshot().await;
        let json = serde_json::to_string_pretty(&snapshot).context("Failed to serialize snapshot")?;
        println!("{}", json);
    }

    info!("✅ Done");
    Ok(())
}
