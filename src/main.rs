use std::sync::Arc;

/// Reset SIGPIPE to default behavior so piping (e.g. `oxide-provider schema | jq`)
/// exits cleanly instead of panicking on broken pipe.
#[cfg(unix)]
fn reset_sigpipe() {
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use oxide_provider::provider::registry::Registry;
use oxide_provider::provider::{Provider, ProviderConfig};

/// oxide-provider - infrastructure-as-code provider for the Oxide cloud
#[derive(Parser)]
#[command(name = "oxide-provider", version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// URL of the Oxide API root (falls back to OXIDE_HOST / OXIDE_TEST_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Bearer token (falls back to OXIDE_TOKEN / OXIDE_TEST_TOKEN)
    #[arg(long)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump the declared resource and data-source schemas as JSON
    Schema,

    /// List the declared resource and data-source types
    Resources,

    /// Validate the provider configuration and API reachability settings
    Check,
}

fn main() -> Result<()> {
    #[cfg(unix)]
    reset_sigpipe();

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    let config = ProviderConfig {
        host: cli.host.clone(),
        token: cli.token.clone(),
    };

    match cli.command {
        Commands::Schema => {
            let registry = schema_only_registry()?;
            println!("{}", serde_json::to_string_pretty(&registry.schemas_json())?);
        }
        Commands::Resources => {
            let registry = schema_only_registry()?;
            println!("{}", "Resources:".bold());
            for name in registry.resource_types() {
                println!("  {}", name.green());
            }
            println!("{}", "Data sources:".bold());
            for name in registry.data_source_types() {
                println!("  {}", name.cyan());
            }
        }
        Commands::Check => {
            let resolved = config.resolve()?;
            println!(
                "{} host {}, token resolved",
                "OK:".green().bold(),
                resolved.host
            );
        }
    }
    Ok(())
}

/// Schema export needs no live credentials; wire the registry to a client
/// pointed at a placeholder host.
fn schema_only_registry() -> Result<Registry> {
    let provider = Provider::new();
    let config = ProviderConfig {
        host: Some("http://localhost".to_string()),
        token: Some("unused".to_string()),
    };
    let client = provider
        .client(&config)
        .context("Failed to build placeholder API client")?;
    Ok(Registry::new(Arc::clone(&client)))
}
