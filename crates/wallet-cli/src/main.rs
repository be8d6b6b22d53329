use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "wallet")]
#[command(about = "Wallet simulation - onboarding and deposit flows", long_about = None)]
struct Cli {
    /// Directory holding the durable store
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Configuration file (TOML). Defaults apply when absent
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted session: register, deposit, verify
    Demo {
        #[arg(long, default_value = "María Pérez")]
        name: String,
        #[arg(long, default_value = "maria@example.com")]
        email: String,
        #[arg(long, default_value = "Secreta#2024")]
        password: String,
        /// Use real timers instead of fast-forwarding a virtual clock
        #[arg(long)]
        realtime: bool,
    },
    /// Print stored state as JSON
    Inspect {
        #[arg(long, default_value = "Secreta#2024")]
        password: String,
    },
    /// Settle a pending bank transfer or withdrawal
    Reconcile {
        transaction_id: String,
        #[arg(long, default_value = "Secreta#2024")]
        password: String,
        /// Reject with this reason instead of approving
        #[arg(long)]
        reject: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let env = commands::Environment::load(cli.data_dir, cli.config)?;

    match cli.command {
        Commands::Demo {
            name,
            email,
            password,
            realtime,
        } => {
            let account = commands::demo::Account {
                name,
                email,
                password,
            };
            if realtime {
                commands::demo::run_realtime(&env, &account).await?
            } else {
                commands::demo::run(&env, &account)?
            }
        }
        Commands::Inspect { password } => commands::inspect::run(&env, &password)?,
        Commands::Reconcile {
            transaction_id,
            password,
            reject,
        } => commands::inspect::reconcile(&env, &password, &transaction_id, reject)?,
    }

    Ok(())
}
