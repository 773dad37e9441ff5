use anyhow::Result;
use clap::Parser;
use dotenvy::dotenv;
use shopeval_lib::env::EnvConfig;
use shopeval_lib::episode::DEFAULT_MAX_STEPS;
use shopeval_lib::probe::ProbeConfig;
use shopeval_runner::{launch_evaluation, LaunchConfig};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Launches the agent pair and runs one WebShop evaluation.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 9001)]
    green_port: u16,

    #[arg(long, default_value_t = 9002)]
    white_port: u16,

    /// Step budget per episode.
    #[arg(long, default_value_t = DEFAULT_MAX_STEPS)]
    max_steps: usize,

    /// Solver reply policy: "llm" or "heuristic".
    #[arg(long, default_value = "heuristic")]
    solver_policy: String,

    /// Size of the product catalog.
    #[arg(long, default_value_t = 1000)]
    num_products: usize,

    /// Use plain goal templates instead of human-authored ones.
    #[arg(long)]
    plain_goals: bool,

    /// Seed for a reproducible catalog and goal.
    #[arg(long)]
    seed: Option<u64>,

    /// Seconds to wait for each agent to become ready.
    #[arg(long, default_value_t = 60)]
    startup_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,shopeval_runner=debug,shopeval_lib=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    println!("--- WebShop Agentified Evaluation ---");

    let config = LaunchConfig {
        host: cli.host,
        green_port: cli.green_port,
        white_port: cli.white_port,
        max_steps: cli.max_steps,
        solver_policy: cli.solver_policy,
        env_config: EnvConfig {
            num_products: cli.num_products,
            human_goals: !cli.plain_goals,
            seed: cli.seed,
        },
        probe: ProbeConfig {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(cli.startup_timeout),
        },
    };

    match launch_evaluation(config).await {
        Ok(result) => {
            println!("\n--- Assessment Result ---");
            println!("{result}");
            println!("\nDone.");
            Ok(())
        }
        Err(e) => {
            eprintln!("Error during assessment: {e:#}");
            Err(e)
        }
    }
}
