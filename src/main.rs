use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use emotune_lib::catalog::{CredentialManager, SpotifyCatalogClient};
use emotune_lib::classifier::OnnxEmotionClassifier;
use emotune_lib::config::{self, AppConfig, CliConfig, FileConfig, DEFAULT_PORT};
use emotune_lib::emotion::EmotionLabel;
use emotune_lib::engine::RecommendationEngine;
use emotune_lib::presenter::ConsolePresenter;
use emotune_lib::server;

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    if path_buf.is_absolute() {
        return Ok(path_buf);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(path_buf))
}

fn parse_dir(s: &str) -> Result<PathBuf, String> {
    let path = parse_path(s)?;
    if !path.exists() {
        return Err(format!("Directory does not exist: {}", s));
    }
    if !path.is_dir() {
        return Err(format!("Path is not a directory: {}", s));
    }
    Ok(path)
}

#[derive(Parser, Debug)]
#[clap(version, about = "Tell it how you feel, get a playlist")]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, global = true, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory with model.onnx, tokenizer.json and (optionally) config.json.
    #[clap(long, global = true, value_parser = parse_dir)]
    pub model_dir: Option<PathBuf>,

    /// Maximum number of tokens fed to the model.
    #[clap(long, global = true, default_value_t = 128)]
    pub max_length: usize,

    /// Number of playlists to request from Spotify.
    #[clap(long, global = true, default_value_t = 5)]
    pub limit: u32,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect the emotion in TEXT and recommend playlists.
    /// Without TEXT, reads one entry per line from stdin.
    Recommend { text: Option<String> },

    /// Recommend playlists for an emotion label, skipping the model.
    Label { emotion: String },

    /// Recommend playlists for every emotion label.
    Sweep,

    /// Serve the recommendation API to LAN clients.
    Serve {
        /// The port to listen on.
        #[clap(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },

    /// Manage the Spotify client secret in the OS keychain.
    Credentials {
        #[clap(subcommand)]
        action: CredentialsAction,
    },
}

#[derive(Subcommand, Debug)]
enum CredentialsAction {
    /// Store the client secret (read from stdin when omitted).
    Set { secret: Option<String> },
    /// Remove the stored client secret.
    Delete,
    /// Report whether a client secret is stored.
    Status,
}

/// Convert CLI args to CliConfig for config resolution
impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        let port = match args.command {
            Command::Serve { port } => port,
            _ => DEFAULT_PORT,
        };
        CliConfig {
            model_dir: args.model_dir.clone(),
            max_length: args.max_length,
            search_limit: args.limit,
            port,
        }
    }
}

fn build_catalog(app_config: &AppConfig) -> Result<Arc<SpotifyCatalogClient>> {
    let catalog = SpotifyCatalogClient::new(
        app_config.catalog.auth.clone(),
        app_config.catalog.endpoints.clone(),
        app_config.catalog.timeout,
    )
    .context("Failed to create Spotify client")?;
    if !catalog.is_initialized() {
        info!("No Spotify credentials configured, playlist searches will come back empty");
    }
    Ok(Arc::new(catalog))
}

fn build_engine(app_config: &AppConfig) -> Result<RecommendationEngine> {
    let model_dir = app_config
        .model_dir
        .as_ref()
        .context("model_dir must be specified via --model-dir or in config file")?;
    let classifier = OnnxEmotionClassifier::load(model_dir, &app_config.classifier)?;
    let catalog = build_catalog(app_config)?;
    Ok(RecommendationEngine::new(Arc::new(classifier), catalog).with_search_limit(app_config.search_limit))
}

fn build_label_engine(app_config: &AppConfig) -> Result<RecommendationEngine> {
    let catalog = build_catalog(app_config)?;
    Ok(RecommendationEngine::without_classifier(catalog).with_search_limit(app_config.search_limit))
}

async fn run_recommend(engine: &RecommendationEngine, text: Option<String>) -> Result<()> {
    let mut presenter = ConsolePresenter::stdout();

    if let Some(text) = text {
        let outcome = engine.recommend(&text).await;
        presenter.render(outcome.as_ref())?;
        return Ok(());
    }

    let stdin = io::stdin();
    loop {
        print!("How are you feeling today? ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let outcome = engine.recommend(&line).await;
        presenter.render(outcome.as_ref())?;
        println!();
    }
    Ok(())
}

async fn run_serve(engine: RecommendationEngine, app_config: &AppConfig) -> Result<()> {
    let token = app_config
        .server_token
        .clone()
        .unwrap_or_else(server::generate_token);
    let running = server::start_server(app_config.port, token, Arc::new(engine)).await?;

    println!("Serving on http://{}:{}", server::lan_ip(), running.addr.port());
    println!("Token: {}", running.token);

    tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl-C")?;
    running.shutdown().await;
    Ok(())
}

fn run_credentials(action: CredentialsAction) -> Result<()> {
    match action {
        CredentialsAction::Set { secret } => {
            let secret = match secret {
                Some(secret) => secret,
                None => {
                    print!("Spotify client secret: ");
                    io::stdout().flush()?;
                    let mut line = String::new();
                    io::stdin().lock().read_line(&mut line)?;
                    line
                }
            };
            CredentialManager::store_client_secret(&secret)?;
            println!("Client secret stored");
        }
        CredentialsAction::Delete => {
            CredentialManager::delete_client_secret()?;
            println!("Client secret removed");
        }
        CredentialsAction::Status => {
            if CredentialManager::has_client_secret()? {
                println!("Client secret is configured");
            } else {
                println!("No client secret configured");
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    // Load TOML config if provided
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = AppConfig::resolve(&cli_config, file_config)?;

    match cli_args.command {
        Command::Recommend { text } => {
            let engine = build_engine(&app_config)?;
            run_recommend(&engine, text).await
        }
        Command::Label { emotion } => {
            let engine = build_label_engine(&app_config)?;
            let result = engine.recommend_for_label(&emotion).await;
            ConsolePresenter::stdout().render(Ok(&result))?;
            Ok(())
        }
        Command::Sweep => {
            let engine = build_label_engine(&app_config)?;
            let mut presenter = ConsolePresenter::stdout();
            for label in EmotionLabel::ALL {
                println!("=== Recommendation for {} ===", label);
                let result = engine.recommend_for_label(label.as_str()).await;
                presenter.render(Ok(&result))?;
                println!();
            }
            Ok(())
        }
        Command::Serve { .. } => {
            let engine = build_engine(&app_config)?;
            run_serve(engine, &app_config).await
        }
        Command::Credentials { action } => run_credentials(action),
    }
}
