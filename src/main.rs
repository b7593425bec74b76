use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use s3relay::cli::commands;
use s3relay::config;
use s3relay::StorageClient;

#[derive(Parser)]
#[command(name = "s3relay")]
#[command(version, about = "Presigned-URL S3 storage toolkit", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path (defaults to S3_* environment variables)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Disable SSL certificate verification
    #[arg(long, global = true)]
    insecure: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a presigned URL
    Presign {
        /// HTTP method (PUT, GET, or DELETE)
        method: String,

        /// Object key
        key: String,
    },

    /// Upload a local file
    Put {
        /// Local file to upload
        file: PathBuf,

        /// Destination object key
        key: String,

        /// MIME type to declare on the upload
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Fetch an object
    Get {
        /// Object key
        key: String,

        /// Write the body to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Remove objects (best-effort, never fails on individual keys)
    Rm {
        /// Object keys to delete
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Resolve a stored reference to its bare object key
    Resolve {
        /// Stored value: bare key, bucket URL, or provider storage URL
        stored: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Set insecure TLS if flag is set (before the client is built)
    if cli.insecure {
        std::env::set_var("S3RELAY_INSECURE_TLS", "true");
    }

    // One-shot commands: current_thread is sufficient for sequential I/O
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    // Load configuration once for this invocation
    let config = config::load_config(cli.config.as_deref())?;
    let client = StorageClient::with_config(config.clone());

    match cli.command {
        Commands::Presign { method, key } => {
            commands::cmd_presign(&config, &method, &key)?;
        }
        Commands::Put {
            file,
            key,
            content_type,
        } => {
            commands::cmd_put(&client, &file, &key, content_type.as_deref()).await?;
        }
        Commands::Get { key, output } => {
            commands::cmd_get(&client, &key, output.as_deref()).await?;
        }
        Commands::Rm { keys } => {
            commands::cmd_rm(&client, &keys).await?;
        }
        Commands::Resolve { stored } => {
            commands::cmd_resolve(&config, &stored)?;
        }
    }

    Ok(())
}
