use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use niasafe::pipeline::CommentPipeline;
use niasafe::server::{self, AppState};
use niasafe::store::{CommentStore, DEFAULT_RECENT_LIMIT};
use niasafe::{AppConfig, Category, ModelManager, Scorer, ToxicityModel, ToxicityModelBuilder};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "NIASAFE_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service
    Serve {
        /// Override the configured listen address
        #[arg(short, long)]
        listen: Option<SocketAddr>,
    },
    /// Score a single comment and print the result
    Classify {
        text: String,
    },
    /// Fetch the configured model into the local cache
    Download {
        /// Remove any cached copy first
        #[arg(short, long)]
        fresh: bool,
    },
    /// Print the most recent stored comments
    Recent {
        #[arg(short, long, default_value_t = DEFAULT_RECENT_LIMIT)]
        limit: usize,
    },
    /// Print stored comments whose predicted category matches
    Category {
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    niasafe::init_logger();
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Command::Serve { listen } => serve(config, listen).await,
        Command::Classify { text } => classify(&config, &text).await,
        Command::Download { fresh } => download(&config, fresh).await,
        Command::Recent { limit } => {
            let store = config.store.open()?;
            print_json(&store.recent(limit).await?)
        }
        Command::Category { name } => {
            let category: Category = name.parse()?;
            let store = config.store.open()?;
            print_json(&store.by_category(category).await?)
        }
    }
}

async fn serve(config: AppConfig, listen: Option<SocketAddr>) -> Result<()> {
    let start = Instant::now();
    let model = load_model(&config).await?;
    info!("Model loaded in {:.2?}: {:?}", start.elapsed(), model.info());

    let store = config.store.open().context("Failed to open comment store")?;
    let notifier = config.notifier.build().context("Failed to build notifier")?;
    let pipeline = CommentPipeline::new(
        Arc::new(model),
        store,
        notifier,
        config.alerts.thresholds.clone(),
    );

    let addr = listen.unwrap_or(config.server.listen_addr);
    server::serve(addr, AppState::new(pipeline), config.server.max_body_size).await?;
    Ok(())
}

async fn classify(config: &AppConfig, text: &str) -> Result<()> {
    let model = load_model(config).await?;
    let scores = model.score(text)?;

    println!("Predicted category: {}", scores.predicted_category());
    for (category, score) in scores.iter() {
        println!("  {:<14} {:.4}", category, score);
    }

    let triggered = config.alerts.thresholds.exceeded(&scores);
    if !triggered.is_empty() {
        let names: Vec<_> = triggered.iter().map(Category::as_str).collect();
        println!("Alert thresholds exceeded: {}", names.join(", "));
    }
    Ok(())
}

async fn download(config: &AppConfig, fresh: bool) -> Result<()> {
    let Some(source) = &config.model.source else {
        bail!("No model source configured; set [model.source] in the config file");
    };
    let manager = ModelManager::new_default()?;

    if fresh {
        info!("Fresh download requested - removing any existing model files...");
        manager.remove_download(&source.name)?;
    }
    manager.ensure_model_downloaded(source).await?;
    println!("Model '{}' ready in {}", source.name, manager.get_model_dir(&source.name).display());
    Ok(())
}

async fn load_model(config: &AppConfig) -> Result<ToxicityModel> {
    let builder = ToxicityModelBuilder::new()
        .with_runtime_config(config.runtime)
        .with_max_sequence_length(config.model.max_sequence_length);

    let builder = match &config.model.source {
        Some(source) => {
            let manager = ModelManager::new_default()?;
            manager.ensure_model_downloaded(source).await?;
            builder.with_managed_model(&manager, source)?
        }
        None => builder
            .with_model_dir(&config.model.dir)
            .with_context(|| format!("Failed to load model from {}", config.model.dir.display()))?,
    };

    Ok(builder.build()?)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
