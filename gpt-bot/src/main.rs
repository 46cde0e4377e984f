//! gpt-bot binary: `gpt-bot run [--token] [--openai-api-key] [--redis-url] [--config]`.

use anyhow::Result;
use clap::Parser;
use gpt_bot::{load_config, run_bot, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            token,
            openai_api_key,
            redis_url,
            config,
        } => {
            let config = load_config(token, openai_api_key, redis_url, config)?;
            run_bot(config).await
        }
    }
}
