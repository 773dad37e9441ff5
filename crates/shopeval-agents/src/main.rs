use anyhow::Result;
use clap::{Parser, ValueEnum};
use dotenvy::dotenv;
use shopeval_agents::card::{green_card, white_card};
use shopeval_agents::green::GreenExecutor;
use shopeval_agents::server;
use shopeval_agents::white::{HeuristicPolicy, LlmPolicy, SolverPolicy, WhiteExecutor};
use shopeval_lib::client::A2aClient;
use shopeval_lib::episode::DEFAULT_MAX_STEPS;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Role {
    Green,
    White,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyKind {
    Llm,
    Heuristic,
}

/// Serves one agent of the evaluation pair.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Which agent role to serve.
    #[arg(long, value_enum)]
    role: Role,

    /// Logical agent name advertised on the card.
    #[arg(long)]
    name: Option<String>,

    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long)]
    port: u16,

    /// Step budget per episode (green role).
    #[arg(long, default_value_t = DEFAULT_MAX_STEPS)]
    max_steps: usize,

    /// Reply policy (white role).
    #[arg(long, value_enum, default_value_t = PolicyKind::Heuristic)]
    policy: PolicyKind,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,shopeval_agents=debug,shopeval_lib=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let url = format!("http://{}:{}", cli.host, cli.port);

    match cli.role {
        Role::Green => {
            let name = cli.name.unwrap_or_else(|| "webshop_green_agent".to_string());
            let card = green_card(&name, &url);
            let executor = Arc::new(GreenExecutor::new(A2aClient::new(), cli.max_steps));
            server::serve(&cli.host, cli.port, card, executor).await
        }
        Role::White => {
            let name = cli.name.unwrap_or_else(|| "webshop_white_agent".to_string());
            let card = white_card(&name, &url);
            let policy: Box<dyn SolverPolicy> = match cli.policy {
                PolicyKind::Llm => Box::new(LlmPolicy::from_env()),
                PolicyKind::Heuristic => Box::new(HeuristicPolicy),
            };
            let executor = Arc::new(WhiteExecutor::new(policy));
            server::serve(&cli.host, cli.port, card, executor).await
        }
    }
}
