use clap::{Parser, Subcommand};
use serde::Serialize;
use std::process::ExitCode;

use crate::clients::solvedac::SolvedAcClient;
use crate::core::error::SolvedAcError;
use crate::domain::PromptRole;
use crate::infra::config::Config;
use crate::prompts::build_search_workflow;

#[derive(Parser)]
#[command(name = "solvedac-mcp-gateway")]
#[command(about = "solved.ac MCP gateway - server and admin CLI")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the MCP server (MODE=stdio|server)
    Serve,
    /// Look up a solved.ac user
    User {
        handle: String,
    },
    /// Search problems with a solved.ac query
    Search {
        /// Query, e.g. "tier:s5..g5 tag:dp -tag:greedy"
        query: String,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Print the search-workflow prompt messages
    Prompt {
        /// Natural-language request
        request: String,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// List registered capabilities
    Capabilities,
    /// Validate configuration
    Config {
        /// Validate config without starting service
        #[arg(long)]
        validate: bool,
    },
    /// Health check a running server
    Health {
        /// Service URL to check
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    run_commands(cli.command.unwrap_or(Commands::Serve)).await
}

pub async fn run_commands(command: Commands) -> ExitCode {
    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("❌ Configuration error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match command {
        Commands::Serve => match crate::infra::boot::run_server(cfg).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!(error = %e, "server exited with error");
                eprintln!("❌ {e:#}");
                ExitCode::FAILURE
            }
        },
        Commands::User { handle } => {
            let out = with_client(&cfg, |client| async move { client.fetch_user(&handle).await }).await;
            print_outcome(out)
        }
        Commands::Search { query, page } => {
            let out = with_client(&cfg, |client| async move { client.search_problems(&query, page).await }).await;
            print_outcome(out)
        }
        Commands::Prompt { request, page } => {
            for (i, m) in build_search_workflow(&request, page).iter().enumerate() {
                let role = match m.role {
                    PromptRole::Assistant => "assistant",
                    PromptRole::User => "user",
                };
                println!("{}. role={}\n{}\n", i + 1, role, m.text_content());
            }
            ExitCode::SUCCESS
        }
        Commands::Capabilities => {
            let (_handle, registry) = crate::infra::boot::wire(&cfg);
            for meta in registry.list() {
                println!("{:?}\t{}\t{}", meta.class, meta.name, meta.description);
            }
            ExitCode::SUCCESS
        }
        Commands::Config { validate: _ } => match cfg.validate() {
            Ok(()) => {
                println!("✅ Configuration is valid");
                println!("  Mode: {}", cfg.mode);
                println!("  Port: {}", cfg.port);
                println!("  solved.ac: {}", cfg.remote.base_url);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Configuration validation failed: {e}");
                ExitCode::FAILURE
            }
        },
        Commands::Health { url } => match health_check(&url).await {
            Ok(_) => {
                println!("✅ Service is healthy");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Health check failed: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

/// Run `f` with an active client, closing it afterwards.
async fn with_client<T, F, Fut>(cfg: &Config, f: F) -> Result<T, SolvedAcError>
where
    F: FnOnce(SolvedAcClient) -> Fut,
    Fut: std::future::Future<Output = Result<T, SolvedAcError>>,
{
    let (handle, _registry) = crate::infra::boot::wire(cfg);
    let _scope = handle.scope()?;
    f(SolvedAcClient::new(handle.clone())).await
}

fn print_outcome<T: Serialize>(out: Result<T, SolvedAcError>) -> ExitCode {
    match out {
        Ok(v) => match serde_json::to_string_pretty(&v) {
            Ok(s) => {
                println!("{s}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ could not render output: {e}");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("❌ {}: {}", e.kind(), e);
            ExitCode::FAILURE
        }
    }
}

async fn health_check(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/healthz", url))
        .timeout(std::time::Duration::from_millis(500))
        .send()
        .await?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(format!("HTTP {}", response.status()).into())
    }
}
