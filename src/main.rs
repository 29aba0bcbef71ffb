//! # BizDesk: department workspace server
//!
//! Usage:
//!   bizdesk                              # Start the gateway (default port 3000)
//!   bizdesk serve --port 8080            # Custom port
//!   bizdesk --config ./desk.toml serve   # Explicit config file
//!   bizdesk departments                  # Print the department catalog as JSON

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bizdesk_core::BizDeskConfig;

const CRATES: [&str; 6] = [
    "bizdesk",
    "bizdesk_core",
    "bizdesk_scheduler",
    "bizdesk_memory",
    "bizdesk_tools",
    "bizdesk_gateway",
];

#[derive(Parser)]
#[command(name = "bizdesk", version, about = "🏢 BizDesk: department chat, tools and tasks")]
struct Cli {
    /// Config file (defaults to $BIZDESK_CONFIG or ~/.bizdesk/config.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP gateway
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Listen port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the seeded department registry as JSON
    Departments,
}

fn log_filter(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    let mut directives: Vec<String> = CRATES.iter().map(|c| format!("{c}={level}")).collect();
    if verbose {
        directives.push("tower_http=debug".into());
    }
    directives.join(",")
}

fn load_config(path: Option<&str>) -> Result<BizDeskConfig> {
    let config = match path {
        Some(p) => {
            let expanded = shellexpand::tilde(p).to_string();
            BizDeskConfig::load_from(std::path::Path::new(&expanded))?
        }
        None => BizDeskConfig::load()?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_filter(cli.verbose))),
        )
        .with_target(false)
        .init();

    let mut config = load_config(cli.config.as_deref())?;

    match cli.command.unwrap_or(Command::Serve { host: None, port: None }) {
        Command::Departments => {
            let registry = bizdesk_gateway::server::build_registry(&config);
            println!("{}", serde_json::to_string_pretty(registry.list())?);
        }
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.gateway.host = host;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }
            tracing::info!("🏢 BizDesk v{} starting", env!("CARGO_PKG_VERSION"));
            bizdesk_gateway::start(config).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_is_serve() {
        let cli = Cli::parse_from(["bizdesk"]);
        assert!(cli.command.is_none());

        let cli = Cli::parse_from(["bizdesk", "serve", "--port", "8080", "-v"]);
        assert!(cli.verbose);
        match cli.command {
            Some(Command::Serve { port, host }) => {
                assert_eq!(port, Some(8080));
                assert!(host.is_none());
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_log_filter() {
        assert!(log_filter(false).contains("bizdesk_scheduler=info"));
        assert!(log_filter(true).contains("tower_http=debug"));
    }

    #[test]
    fn test_missing_config_file_errors() {
        let err = load_config(Some("/nonexistent/bizdesk.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
