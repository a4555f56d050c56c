use crate::Result;
use crate::analysis::Analyzer;
use crate::credential;
use crate::errors::AnalysisError;
use crate::logging::*;
use crate::openai::{AnalysisConfig, Client, VisionModel};
use crate::storage::{self, FileStore, SavedPlan};
use crate::types::{AnalysisMode, AnalysisRequest, AnalysisResult, DataUri, Gender};
use anyhow::{Context, bail};
use async_trait::async_trait;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Parser)]
#[clap(name = "physique")]
#[clap(about = "Rate muscle development from physique photos")]
#[clap(version)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze front/back (and optionally side) photos
    Analyze(AnalyzeArgs),
    /// Show the improvement plan saved in a session
    Plan(SessionArgs),
    /// Remove every wizard key from a session
    Clear(SessionArgs),
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Front photo
    #[arg(long)]
    pub front: PathBuf,

    /// Back photo
    #[arg(long)]
    pub back: PathBuf,

    /// Side photo
    #[arg(long)]
    pub side: Option<PathBuf>,

    #[arg(long)]
    pub gender: Gender,

    #[arg(long, default_value_t = AnalysisMode::FullBody)]
    pub mode: AnalysisMode,

    /// Session file to store the inputs and the resulting plan in
    #[arg(long)]
    pub session: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SessionArgs {
    #[arg(long)]
    pub session: PathBuf,
}

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Analyze(args) => {
            let result = analyze(args).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Plan(args) => {
            let plan = plan(&args)?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Commands::Clear(args) => {
            let mut store = FileStore::open(&args.session)?;
            storage::clear_session(&mut store)?;
        }
    }
    Ok(())
}

/// The completion client, or the reason it could not be built. An
/// unconfigured backend fails every call so the analyzer falls back.
enum Backend {
    Remote(Client),
    Unconfigured(String),
}

#[async_trait]
impl VisionModel for Backend {
    async fn complete(&self, prompt: &str, images: &[&DataUri]) -> Result<String, AnalysisError> {
        match self {
            Backend::Remote(client) => client.complete(prompt, images).await,
            Backend::Unconfigured(reason) => Err(AnalysisError::Transport(reason.clone())),
        }
    }
}

async fn backend() -> Backend {
    let log = DEFAULT.new(o!("function" => "backend"));

    let config = match AnalysisConfig::from_config() {
        Ok(config) => config,
        Err(err) => {
            warn!(log, "invalid analysis settings, results will be synthesized"; "error" => %err);
            return Backend::Unconfigured(format!("invalid analysis settings: {err}"));
        }
    };
    let http = match reqwest::Client::builder().timeout(config.timeout).build() {
        Ok(http) => http,
        Err(err) => return Backend::Unconfigured(err.to_string()),
    };
    let api_key = match credential::resolve(&http).await {
        Ok(key) => key,
        Err(err) => {
            warn!(log, "credential unavailable, results will be synthesized"; "error" => %err);
            return Backend::Unconfigured(format!("credential unavailable: {err}"));
        }
    };
    match Client::new(config, api_key) {
        Ok(client) => Backend::Remote(client),
        Err(err) => Backend::Unconfigured(err.to_string()),
    }
}

pub fn media_type_for(path: &Path) -> Result<&'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let media_type = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        _ => bail!("unsupported image type: {}", path.display()),
    };
    Ok(media_type)
}

pub async fn load_image(path: &Path) -> Result<DataUri> {
    let media_type = media_type_for(path)?;
    let bytes = fs::read(path)
        .await
        .with_context(|| format!("Failed to read image: {}", path.display()))?;
    Ok(DataUri::from_bytes(media_type, &bytes))
}

pub async fn analyze(args: AnalyzeArgs) -> Result<AnalysisResult> {
    let log = DEFAULT.new(o!(
        "function" => "cli::analyze",
        "mode" => args.mode.to_string(),
    ));

    let mut request = AnalysisRequest::new(
        load_image(&args.front).await?,
        load_image(&args.back).await?,
        args.gender,
        args.mode,
    );
    if let Some(side) = &args.side {
        request = request.with_side(load_image(side).await?);
    }

    let mut session = match &args.session {
        Some(path) => {
            let mut store = FileStore::open(path)?;
            storage::save_request(&mut store, &request)?;
            Some(store)
        }
        None => None,
    };

    let analyzer = Analyzer::new(backend().await);
    let result = analyzer.analyze(&request).await?;
    info!(log, "analysis finished";
        "overall_score" => result.overall_score,
        "fallback" => result.is_fallback,
    );

    if let Some(store) = session.as_mut() {
        storage::save_result(store, &result)?;
    }
    Ok(result)
}

pub fn plan(args: &SessionArgs) -> Result<SavedPlan> {
    let store = FileStore::open(&args.session)?;
    Ok(storage::load_plan(&store))
}
