use clap::{Parser, Subcommand};
use serde_json::Value;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "orchestrator-probe")]
#[command(about = "Query the probe endpoints of a running service", long_about = None)]
struct Cli {
    /// Base URL of a technical HTTP listener
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    /// Request timeout in milliseconds
    #[arg(short, long, default_value_t = 2000)]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check liveness (GET /health/live)
    Live,
    /// Read the readiness snapshot (GET /health/ready)
    Ready,
    /// Show per-dependency health (GET /health)
    Status,
}

impl Commands {
    fn path(&self) -> &'static str {
        match self {
            Commands::Live => "/health/live",
            Commands::Ready => "/health/ready",
            Commands::Status => "/health",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: &Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(cli.timeout_ms))
        .build()?;

    let res = client
        .get(format!("{}{}", cli.url.trim_end_matches('/'), cli.command.path()))
        .send()
        .await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<bool, Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Probe returned status {}", status);
        if !text.is_empty() {
            eprintln!("Response: {}", text);
        }
        return Ok(false);
    }

    if text.is_empty() {
        println!("{}", status);
    } else {
        let json: Value = serde_json::from_str(&text)?;
        println!("{}", serde_json::to_string_pretty(&json)?);
    }
    Ok(true)
}
