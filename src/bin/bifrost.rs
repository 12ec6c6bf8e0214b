//! bifrost: operator CLI
//!
//! Builds a gateway from a config file (or the environment) and sends a
//! single prompt through it.

use std::path::PathBuf;
use std::process::ExitCode;

use bifrost::{BifrostBuilder, BifrostError, GatewayConfig, LlmGateway};
use clap::{Parser, Subcommand};

/// Bifrost LLM gateway CLI
#[derive(Parser)]
#[command(name = "bifrost")]
#[command(version)]
#[command(about = "Resilient LLM gateway")]
struct Args {
    /// Config file (default: ~/.bifrost/config.toml, /etc/bifrost/config.toml,
    /// then provider API keys from the environment)
    #[arg(short, long, env = "BIFROST_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate text from a prompt pair
    Ask {
        /// System prompt
        #[arg(short, long)]
        system: String,
        /// User prompt
        #[arg(short, long)]
        user: String,
        /// Sampling temperature (0.0 to 2.0)
        #[arg(short, long, default_value_t = 0.0)]
        temperature: f32,
        /// Model override for every provider
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List configured providers in attempt order
    Providers,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so answers on stdout stay pipeable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("bifrost=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let gateway = match build_gateway(args.config.as_deref()) {
        Ok(gateway) => gateway,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match args.command {
        Command::Ask {
            system,
            user,
            temperature,
            model,
        } => match gateway
            .generate(&system, &user, temperature, model.as_deref())
            .await
        {
            Ok(text) => {
                println!("{text}");
                ExitCode::SUCCESS
            }
            Err(BifrostError::AllProvidersFailed(failed)) => {
                eprintln!("error: all providers failed");
                for failure in &failed.failures {
                    let kind = if failure.is_configuration() {
                        "configuration"
                    } else {
                        "transient"
                    };
                    eprintln!("  {:<16} {kind:<13} {}", failure.provider, failure.failure);
                }
                for name in &failed.skipped {
                    eprintln!("  {name:<16} skipped       circuit open");
                }
                if failed.failures.is_empty() && failed.skipped.is_empty() {
                    eprintln!("  no providers configured");
                }
                ExitCode::FAILURE
            }
            Err(e) => {
                eprintln!("error: {e}");
                ExitCode::FAILURE
            }
        },

        Command::Providers => {
            let status = gateway.provider_status();
            if status.is_empty() {
                println!("no providers configured");
            }
            for provider in status {
                let config = gateway
                    .registry()
                    .get(&provider.name)
                    .map(|entry| entry.config());
                let (kind, model) = config
                    .map(|c| (c.kind.as_str(), c.model.as_str()))
                    .unwrap_or(("?", "?"));
                println!(
                    "{:>4}  {:<16} {:<13} {:<32} {}",
                    provider.priority, provider.name, kind, model, provider.breaker.state
                );
            }
            ExitCode::SUCCESS
        }
    }
}

fn build_gateway(explicit: Option<&std::path::Path>) -> bifrost::Result<LlmGateway> {
    let config = match explicit {
        Some(path) => GatewayConfig::load(Some(path))?,
        None if GatewayConfig::default_path().is_some() => GatewayConfig::load(None)?,
        None => GatewayConfig::from_env(),
    };
    BifrostBuilder::from_config(&config)?.build()
}
