use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "mlc-serve-cli")]
#[command(about = "Command line client for an mlc-serve instance", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show server lifecycle phase and model
    Health,
    /// List served models
    Models,
    /// Request a text completion
    Complete {
        #[arg(short, long)]
        prompt: String,

        #[arg(long)]
        max_tokens: Option<usize>,

        /// Model id; defaults to the first model the server lists
        #[arg(short, long)]
        model: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{base}/health")).send().await?;
            print_response(res).await?;
        }
        Commands::Models => {
            let res = client.get(format!("{base}/v1/models")).send().await?;
            print_response(res).await?;
        }
        Commands::Complete {
            prompt,
            max_tokens,
            model,
        } => {
            let model = match model {
                Some(m) => m,
                None => first_model(&client, base).await?,
            };
            let mut body = json!({ "model": model, "prompt": prompt });
            if let Some(n) = max_tokens {
                body["max_tokens"] = json!(n);
            }
            let res = client
                .post(format!("{base}/v1/completions"))
                .json(&body)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn first_model(
    client: &reqwest::Client,
    base: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    let models: Value = client
        .get(format!("{base}/v1/models"))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    models["data"][0]["id"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| "server listed no models".into())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: server returned status {}", status);
        eprintln!("Response: {}", text);
        return Ok(());
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
