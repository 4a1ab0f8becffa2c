// src/main.rs — devicefix entry point

use std::sync::{Arc, Mutex};

use clap::{Parser, Subcommand};

use devicefix::api::{self, ApiState};
use devicefix::infra::config::Config;
use devicefix::infra::{logger, paths};
use devicefix::pipeline::types::{DeviceCategory, DiagnosisContext, ImageRef};
use devicefix::pipeline::FallbackPipeline;
use devicefix::storage::StorageManager;

#[derive(Parser)]
#[command(name = "devicefix", version, about = "Device repair assistant backend")]
struct Cli {
    /// Path to a config.toml (defaults to ~/.devicefix/config.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run one diagnosis from the command line and print the result
    Diagnose {
        /// Problem description
        #[arg(long)]
        description: String,
        /// Device category tag (device, pcb, appliance)
        #[arg(long, default_value = "device")]
        category: String,
        /// Image URL(s) to attach
        #[arg(long)]
        image: Vec<String>,
    },
    /// Grant or revoke premium for a user
    Premium {
        user_id: String,
        #[arg(long)]
        revoke: bool,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = if let Some(ref path) = cli.config {
        Config::load_from(std::path::Path::new(path))?
    } else {
        Config::load()?
    };
    config.providers = config.providers.clone().with_env_fallback();

    logger::init_logging(&config.logging);

    let store = Arc::new(Mutex::new(
        StorageManager::open(&paths::db_path())?.store,
    ));

    match cli.command {
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.server.port);
            let state = ApiState::new(&config, store);
            api::start_server(port, state).await
        }
        Commands::Diagnose {
            description,
            category,
            image,
        } => {
            let pipeline = FallbackPipeline::from_config(&config, store);
            let ctx = DiagnosisContext::new(description, DeviceCategory::from_tag(&category))
                .with_images(image.into_iter().map(ImageRef::Url).collect());

            let outcome = pipeline.run(&ctx).await;
            println!("source: {}", outcome.source);
            println!("{}", serde_json::to_string_pretty(&outcome.result)?);
            Ok(())
        }
        Commands::Premium { user_id, revoke } => {
            let store = store
                .lock()
                .map_err(|_| anyhow::anyhow!("store lock poisoned"))?;
            store.set_premium(&user_id, !revoke)?;
            println!(
                "{} premium for {user_id}",
                if revoke { "revoked" } else { "granted" }
            );
            Ok(())
        }
    }
}
