use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "monitorctl")]
#[command(about = "Management CLI for the monitoring server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:9090")]
    url: String,

    /// Bearer token for the lifecycle endpoints.
    #[arg(short, long, env = "MONITORD_ADMIN_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reload the configuration file
    Reload,
    /// Ask the server to shut down
    Quit,
    /// Show the outcome of the last reload
    Status,
    /// Print the configuration currently applied
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(token) = &cli.token {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))?,
        );
    }

    let base = cli.url.trim_end_matches('/');
    match cli.command {
        Commands::Reload => {
            let res = client.post(format!("{}/-/reload", base))
                .headers(headers)
                .send()
                .await?;
            print_text(res).await?;
        }
        Commands::Quit => {
            let res = client.post(format!("{}/-/quit", base))
                .headers(headers)
                .send()
                .await?;
            print_text(res).await?;
        }
        Commands::Status => {
            let res = client.get(format!("{}/api/v1/status/reload", base))
                .send()
                .await?;
            print_json(res).await?;
        }
        Commands::Config => {
            let res = client.get(format!("{}/api/v1/status/config", base))
                .send()
                .await?;
            print_json(res).await?;
        }
    }

    Ok(())
}

async fn print_text(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: server returned status {}", status);
        eprint!("{}", text);
        std::process::exit(1);
    }
    if text.is_empty() {
        println!("OK");
    } else {
        print!("{}", text);
    }
    Ok(())
}

async fn print_json(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: server returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
