use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

mod api;
mod error;
mod feed;
mod output;
mod submit;
mod tasks;
mod telemetry;
mod util;
mod view;

use api::{ApiClient, ApiClientConfig, HttpApiClient};

#[derive(Parser)]
#[command(name = "insight", about = "AI sales-insight client: submit transcripts and LinkedIn profiles, follow the feed")]
struct Cli {
    /// Backend base URL (defaults to INSIGHT_API_URL or http://localhost:8000)
    #[arg(global = true, long)]
    api_url: Option<String>,
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a sales call transcript
    Transcript(submit::TranscriptCmd),
    /// Generate icebreakers from a LinkedIn bio and pitch deck
    Linkedin(submit::LinkedInCmd),
    /// Show the merged insight feed
    Feed(feed::FeedCmd),
    /// Background task status
    Task(tasks::TaskCmd),
    /// Queue and worker statistics
    Queue,
    Health,
    /// Fetch one record
    Get(tasks::GetCmd),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // initialize logging/tracing (stderr). Respect RUST_LOG and INSIGHT_LOG_FORMAT
    telemetry::config::init_tracing();

    let mut cfg = ApiClientConfig::from_env();
    if let Some(url) = cli.api_url { cfg.base_url = url; }
    let client = HttpApiClient::new(cfg)?;
    tracing::debug!(base_url = client.base_url(), "api client ready");
    let api: Arc<dyn ApiClient> = Arc::new(client);

    match cli.command {
        Commands::Transcript(args) => submit::run_transcript(api, args).await?,
        Commands::Linkedin(args) => submit::run_linkedin(api, args).await?,
        Commands::Feed(args) => feed::run(api, args).await?,
        Commands::Task(args) => tasks::run_task(api.as_ref(), args).await?,
        Commands::Queue => tasks::run_queue(api.as_ref()).await?,
        Commands::Health => tasks::run_health(api.as_ref()).await?,
        Commands::Get(args) => tasks::run_get(api.as_ref(), args).await?,
    }

    Ok(())
}
