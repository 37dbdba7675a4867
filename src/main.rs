use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use quanterra::config::{Environment, Settings};
use quanterra::deploy::DeploymentManifest;
use quanterra::flows;
use quanterra::lake::LakeClient;
use quanterra::sources::csv_file::TransactionSource;
use quanterra::utils::logger;
use quanterra::utils::Result;

/// Ingestion flow runner. The container image runs `quanterra <flow>`;
/// the deployment manifest picks the subcommand and parameters.
#[derive(Debug, Parser)]
#[command(name = "quanterra", version, about = "Quanterra ingestion flow runner")]
struct Cli {
    /// Deployment environment.
    #[arg(long, global = true, value_enum, default_value_t = Environment::Dev)]
    env: Environment,

    /// Directory holding the per-environment settings files.
    #[arg(long, global = true, default_value = "config")]
    config_dir: PathBuf,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON log lines for orchestrator log capture.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the EODHD market data flow.
    Eodhd {
        #[arg(long)]
        skip_exchanges: bool,
        #[arg(long)]
        skip_exchange_symbols: bool,
        #[arg(long)]
        skip_exchange_bulk: bool,
        #[arg(long)]
        skip_instruments: bool,
        #[arg(long)]
        skip_macro_indicators: bool,
        #[arg(long)]
        skip_economic_events: bool,
    },
    /// Run the OANDA market data flow.
    Oanda,
    /// Run the Yahoo Finance market data flow.
    YahooFinance,
    /// Run the Interactive Investor transactions flow.
    InteractiveInvestor {
        /// Transactions CSV: a local file or an object already in the lake.
        #[arg(long)]
        transactions_path: String,
        #[arg(long, default_value = "unassigned")]
        portfolio_name: String,
    },
    /// Run the Hargreaves Lansdown transactions flow.
    HargreavesLansdown {
        /// Transaction history CSV: a local file or a lake object.
        #[arg(long)]
        transactions_path: Option<String>,
        /// Current positions CSV.
        #[arg(long)]
        positions_path: Option<String>,
        /// Closed positions CSV.
        #[arg(long)]
        closed_positions_path: Option<String>,
        #[arg(long, default_value = "unassigned")]
        portfolio_name: String,
    },
    /// Run every scheduled market data flow in sequence.
    Ingestion,
    /// Inspect the orchestrator deployment manifest.
    Deployments {
        #[arg(long, default_value = "deploy/deployments.toml")]
        manifest: PathBuf,

        #[command(subcommand)]
        command: DeploymentsCommand,
    },
}

#[derive(Debug, Subcommand)]
enum DeploymentsCommand {
    /// List deployments for the selected environment.
    List,
    /// Validate the manifest.
    Validate,
}

fn load_context(config_dir: &Path, environment: Environment) -> Result<(Settings, LakeClient)> {
    let settings = Settings::load(config_dir, environment)?;
    let lake = LakeClient::connect(&settings.lake)?;
    Ok((settings, lake))
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Eodhd {
            skip_exchanges,
            skip_exchange_symbols,
            skip_exchange_bulk,
            skip_instruments,
            skip_macro_indicators,
            skip_economic_events,
        } => {
            let (settings, lake) = load_context(&cli.config_dir, cli.env)?;
            let options = flows::eodhd::RunOptions {
                exchanges: !skip_exchanges,
                exchange_symbols: !skip_exchange_symbols,
                exchange_bulk: !skip_exchange_bulk,
                instruments: !skip_instruments,
                macro_indicators: !skip_macro_indicators,
                economic_events: !skip_economic_events,
            };
            flows::eodhd::run(&settings, &lake, options).await?;
        }
        Command::Oanda => {
            let (settings, lake) = load_context(&cli.config_dir, cli.env)?;
            flows::oanda::run(&settings, &lake).await?;
        }
        Command::YahooFinance => {
            let (settings, lake) = load_context(&cli.config_dir, cli.env)?;
            flows::yahoo_finance::run(&settings, &lake).await?;
        }
        Command::InteractiveInvestor {
            transactions_path,
            portfolio_name,
        } => {
            let (settings, lake) = load_context(&cli.config_dir, cli.env)?;
            let source = TransactionSource::from_arg(&transactions_path);
            flows::interactive_investor::run(&settings, &lake, source, &portfolio_name).await?;
        }
        Command::HargreavesLansdown {
            transactions_path,
            positions_path,
            closed_positions_path,
            portfolio_name,
        } => {
            let (settings, lake) = load_context(&cli.config_dir, cli.env)?;
            let exports = flows::hargreaves_lansdown::Exports {
                transactions: transactions_path.as_deref().map(TransactionSource::from_arg),
                positions: positions_path.as_deref().map(TransactionSource::from_arg),
                closed_positions: closed_positions_path
                    .as_deref()
                    .map(TransactionSource::from_arg),
            };
            flows::hargreaves_lansdown::run(&settings, &lake, exports, &portfolio_name).await?;
        }
        Command::Ingestion => {
            let (settings, lake) = load_context(&cli.config_dir, cli.env)?;
            flows::ingestion::run_all(&settings, &lake).await?;
        }
        Command::Deployments { manifest, command } => {
            run_deployments(&manifest, &command, cli.env)?;
        }
    }

    Ok(())
}

fn run_deployments(
    path: &Path,
    command: &DeploymentsCommand,
    environment: Environment,
) -> Result<()> {
    let manifest = DeploymentManifest::load(path)?;
    match command {
        DeploymentsCommand::Validate => {
            println!(
                "✅ {} deployments valid in {}",
                manifest.deployments.len(),
                path.display()
            );
        }
        DeploymentsCommand::List => {
            for deployment in manifest.for_environment(environment) {
                let schedule = deployment.schedule.as_deref().unwrap_or("on-demand");
                let next = deployment
                    .next_runs(1)?
                    .first()
                    .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<44} {:<22} {:<16} next: {}",
                    deployment.name, deployment.entrypoint, schedule, next
                );
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(
                "❌ Flow run failed: {} (category: {:?}, severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            ExitCode::from(e.severity().exit_code() as u8)
        }
    }
}
