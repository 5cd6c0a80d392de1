//! gat CLI - Command-line interface
//!
//! Usage:
//!   gat init
//!   gat health
//!   gat embed <text>
//!   gat add <id> <path> <description>
//!   gat search <text> [--limit N]
//!   gat config show|path

use anyhow::Context;
use clap::{Parser, Subcommand};
use gat_core::config::{bundled_data_dir, config_file_path, ensure_config_file};
use gat_core::{AppConfig, Item, LoggingConfig, StoreMode};
use gat_vector::{create_embedding_provider, CollectionStatus, SemanticIndex};
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gat")]
#[command(about = "Semantic index for code artifacts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or check the config file and prepare the vector store
    Init,
    /// Check that the vector store is reachable
    Health,
    /// Print the embedding of a text
    Embed {
        /// Text to embed
        text: String,
    },
    /// Index an artifact
    Add {
        /// Unique item id
        id: String,
        /// Path of the artifact
        path: String,
        /// Description that gets embedded
        description: String,
    },
    /// Find artifacts similar to a text
    Search {
        /// Query text
        text: String,
        /// Maximum number of results
        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },
    /// Inspect the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file location
    Path,
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,gat={0},gat_vector={0}", logging.level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(logging.include_location)
        .with_line_number(logging.include_location)
        .with_writer(std::io::stderr);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_welcome() {
    println!("╔═══════════════════╗");
    println!("║      G A T        ║");
    println!("╚═══════════════════╝");
}

/// Load the config file (if any) with environment overrides applied
fn load_config() -> anyhow::Result<AppConfig> {
    let path = config_file_path()?;
    let config = if path.exists() {
        AppConfig::from_file(&path)?
    } else {
        AppConfig::default()
    };
    Ok(config.with_env_override()?)
}

/// Semantic index for commands that need the vector store
fn require_index(config: &AppConfig) -> anyhow::Result<SemanticIndex> {
    SemanticIndex::from_config(config)?
        .context("vector store is disabled (vector_store.mode = \"disabled\")")
}

async fn run_init(config: &AppConfig, path: &Path, created: bool) -> anyhow::Result<()> {
    print_welcome();
    if created {
        println!("Created default config at {}", path.display());
    } else {
        println!("Using config at {}", path.display());
    }
    println!(
        "Embedding provider: {} ({})",
        config.embedding.provider, config.embedding.model
    );

    match config.vector_store.mode {
        StoreMode::Disabled => {
            println!("Running without Qdrant - memory features are OFF");
            return Ok(());
        }
        StoreMode::Bundled => {
            println!(
                "Qdrant (bundled) at {}, data in {}",
                config.vector_store.url(),
                bundled_data_dir().display()
            );
        }
        StoreMode::External => {
            println!("Qdrant (external) at {}", config.vector_store.url());
        }
    }

    let index = require_index(config)?;
    index
        .health()
        .await
        .context("Qdrant is not reachable")?;

    let status = index.ensure_ready().await?;
    let descriptor = index.store().descriptor();
    match status {
        CollectionStatus::Created => println!(
            "Created collection '{}' ({} dims, {})",
            descriptor.name, descriptor.dimension, descriptor.distance
        ),
        CollectionStatus::Existing => println!(
            "Collection '{}' is ready ({} dims)",
            descriptor.name, descriptor.dimension
        ),
    }

    index.close();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // A missing file loads as the defaults init would write
    let config = load_config()?;
    init_tracing(&config.logging);

    match cli.command {
        Commands::Init => {
            let (path, created) = ensure_config_file()?;
            run_init(&config, &path, created).await?;
        }
        Commands::Health => {
            let index = require_index(&config)?;
            index.health().await?;
            println!("Qdrant at {} is healthy", config.vector_store.url());
        }
        Commands::Embed { text } => {
            let provider = create_embedding_provider(&config.embedding)?;
            let vector = provider.embed(&text).await?;
            println!("{}", serde_json::to_string(&vector)?);
            tracing::info!(dimension = vector.len(), model = provider.model(), "embedded text");
        }
        Commands::Add {
            id,
            path,
            description,
        } => {
            let index = require_index(&config)?;
            let item = Item::new(id, path, description);
            index.index_item(&item).await?;
            println!("Indexed '{}' ({})", item.id, item.path);
        }
        Commands::Search { text, limit } => {
            let index = require_index(&config)?;
            let hits = index.query(&text, limit).await?;
            if hits.is_empty() {
                println!("No matches");
            }
            for hit in hits {
                println!("{:.4}  {}  {}", hit.score, hit.item.path, hit.item.description);
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let mut shown = config.clone();
                if !shown.embedding.api_key.is_empty() {
                    shown.embedding.api_key = "<redacted>".to_string();
                }
                if !shown.chat_provider.api_key.is_empty() {
                    shown.chat_provider.api_key = "<redacted>".to_string();
                }
                if shown.vector_store.api_key.is_some() {
                    shown.vector_store.api_key = Some("<redacted>".to_string());
                }
                print!("{}", toml::to_string_pretty(&shown)?);
            }
            ConfigAction::Path => {
                println!("{}", config_file_path()?.display());
            }
        },
    }

    Ok(())
}
