//! CLI module for the LLM gateway router
//!
//! - `serve`: run the HTTP gateway
//! - `check-config`: load configuration and validate routing against providers

pub mod serve;

use clap::{Parser, Subcommand};

/// LLM gateway router - routing, fallback and semantic caching in front of LLM providers
#[derive(Parser)]
#[command(name = "llm-gateway-router")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the gateway HTTP server
    Serve(serve::ServeArgs),

    /// Validate configuration and exit
    CheckConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_with_overrides() {
        let cli = Cli::try_parse_from(["llm-gateway-router", "serve", "--port", "9000"]).unwrap();

        match cli.command {
            Command::Serve(args) => {
                assert_eq!(args.port, Some(9000));
                assert!(args.host.is_none());
            }
            Command::CheckConfig => panic!("expected serve"),
        }
    }

    #[test]
    fn test_parse_check_config() {
        let cli = Cli::try_parse_from(["llm-gateway-router", "check-config"]).unwrap();
        assert!(matches!(cli.command, Command::CheckConfig));
    }
}
