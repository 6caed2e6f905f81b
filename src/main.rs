use clap::Parser;
use llm_gateway_router::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => cli::serve::run(args).await,
        Command::CheckConfig => cli::serve::check_config().await,
    }
}
