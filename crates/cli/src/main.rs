mod config;
mod error;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use mcp::{Server, ServerInfo};
use perplexity::{
    AskParams, DEFAULT_MODEL, HttpClient, SonarTools, format_model_list, models, redact,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use error::{Error, Result};

const CONFIG_FILE: &str = "perplexity.toml";
const SERVER_NAME: &str = "perplexity";

#[derive(Parser)]
#[command(name = "perplexity-mcp")]
#[command(about = "Perplexity search tools for AI agents over MCP", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (default: ./perplexity.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "perplexity=trace" (default: $RUST_LOG or "info")
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the tools over MCP on stdin/stdout
    Serve,
    /// Ask a single question and print the answer
    Ask {
        /// Your question
        question: String,
        /// Model to use
        #[arg(short, long, default_value = DEFAULT_MODEL)]
        model: String,
        /// Max tokens in response
        #[arg(long, default_value_t = 1000)]
        max_tokens: u32,
        /// Creativity control 0.0-2.0
        #[arg(long, default_value_t = 0.7)]
        temperature: f64,
        /// Nucleus sampling (0.0, 1.0]
        #[arg(long, default_value_t = 1.0)]
        top_p: f64,
        /// System prompt to guide AI behavior
        #[arg(short, long, default_value = "")]
        system: String,
    },
    /// List available models
    Models,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Log to stderr; stdout belongs to the protocol.
fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    // Already-installed subscriber is fine.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => cmd_serve(cli.config.as_deref()).await,
        Commands::Ask {
            question,
            model,
            max_tokens,
            temperature,
            top_p,
            system,
        } => {
            let params = AskParams {
                question,
                model,
                max_tokens,
                temperature,
                top_p,
                system_message: system,
            };
            cmd_ask(cli.config.as_deref(), params).await
        }
        Commands::Models => {
            println!("{}", format_model_list(models::list_models()));
            Ok(())
        }
    }
}

async fn cmd_serve(config_path: Option<&Path>) -> Result<()> {
    info!("initializing Perplexity MCP server");
    let tools = build_tools(config_path)?;

    info!("starting Perplexity MCP server on stdio");
    let info = ServerInfo::new(SERVER_NAME, env!("CARGO_PKG_VERSION"));
    Server::new(info, tools).serve_stdio().await?;

    info!("Perplexity MCP server stopped");
    Ok(())
}

async fn cmd_ask(config_path: Option<&Path>, params: AskParams) -> Result<()> {
    let tools = build_tools(config_path)?;
    println!("{}", tools.ask(params).await);
    Ok(())
}

/// Resolve configuration and build the tool layer. Fails without an API key.
fn build_tools(config_path: Option<&Path>) -> Result<SonarTools<HttpClient>> {
    config::load_dotenv();
    let config = load_config(config_path)?;
    let client_config = config.client_config(|name| std::env::var(name).ok())?;

    info!(api_key = %redact(&client_config.api_key), "API key loaded");

    let client = HttpClient::new(client_config)?;
    info!(endpoint = %client.endpoint(), "client ready");

    Ok(SonarTools::new(client))
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) if !path.exists() => Err(Error::ConfigNotFound {
            path: path.to_path_buf(),
        }),
        Some(path) => Ok(Config::load(path)?),
        None if Path::new(CONFIG_FILE).exists() => Ok(Config::load(CONFIG_FILE)?),
        None => Ok(Config::default()),
    }
}
