//! `site-backend` CLI entry-point.
//!
//! Available sub-commands:
//! - `serve`:      start the API server.
//! - `subscribed`: check whether an email is on the newsletter list.

use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use db::{MemoryStore, RestStore, Store};

#[derive(Parser)]
#[command(
    name = "site-backend",
    about = "Form-submission backend for the course site",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the REST API server.
    Serve {
        #[arg(long, default_value = "0.0.0.0:5000")]
        bind: String,
        /// Keep everything in process memory instead of the hosted store.
        #[arg(long)]
        memory: bool,
        #[command(flatten)]
        store: ServerStoreArgs,
    },
    /// Check a newsletter subscription using the anonymous key.
    Subscribed {
        email: String,
        #[command(flatten)]
        store: ClientStoreArgs,
    },
}

#[derive(Args)]
struct ServerStoreArgs {
    #[arg(long, env = "SUPABASE_URL")]
    store_url: Option<String>,
    /// Privileged key; bypasses row-level security.
    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true)]
    service_role_key: Option<String>,
}

#[derive(Args)]
struct ClientStoreArgs {
    #[arg(long, env = "SUPABASE_URL")]
    store_url: String,
    #[arg(long, env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    anon_key: String,
}

impl ServerStoreArgs {
    fn into_store(self, memory: bool) -> anyhow::Result<Arc<dyn Store>> {
        if memory {
            warn!("Using the in-memory store; submissions are lost on exit");
            return Ok(Arc::new(MemoryStore::new()));
        }
        let url = self
            .store_url
            .context("missing store URL (set SUPABASE_URL or pass --store-url)")?;
        let key = self
            .service_role_key
            .context("missing service role key (set SUPABASE_SERVICE_ROLE_KEY)")?;
        Ok(Arc::new(RestStore::new(url, key)))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { bind, memory, store } => {
            let store = store.into_store(memory)?;
            info!("Starting API server on {bind}");
            api::serve(&bind, store)
                .await
                .with_context(|| format!("API server on {bind} failed"))?;
        }
        Command::Subscribed { email, store } => {
            let site = client::SiteClient::new(&store.store_url, &store.anon_key);
            if site.check_newsletter_subscription(&email).await? {
                println!("subscribed");
            } else {
                println!("not subscribed");
            }
        }
    }

    Ok(())
}
