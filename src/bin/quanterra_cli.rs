//! Desktop companion for brokerage ingestion. Stages a locally downloaded
//! broker export into the lake's `temp_uploads/` area, then runs the matching
//! transactions flow against the staged copy.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Utc;
use clap::{Parser, Subcommand};

use quanterra::config::{Environment, Settings};
use quanterra::flows;
use quanterra::lake::LakeClient;
use quanterra::sources::csv_file::TransactionSource;
use quanterra::utils::logger;
use quanterra::utils::{QuanterraError, Result};

#[derive(Debug, Parser)]
#[command(
    name = "quanterra-cli",
    version,
    about = "Upload brokerage transaction exports to the Quanterra data lake"
)]
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

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Upload an Interactive Investor transaction history export.
    InteractiveInvestor {
        /// Name of the portfolio the export belongs to.
        #[arg(long)]
        portfolio_name: String,
        /// Path to the transactions CSV.
        #[arg(long)]
        transactions_path: PathBuf,
    },
    /// Upload the three Hargreaves Lansdown exports for one portfolio.
    HargreavesLansdown {
        /// Name of the portfolio the exports belong to.
        #[arg(long)]
        portfolio_name: String,
        /// Path to the transaction history CSV.
        #[arg(long)]
        transactions_path: PathBuf,
        /// Path to the current positions CSV.
        #[arg(long)]
        positions_path: PathBuf,
        /// Path to the closed positions CSV.
        #[arg(long)]
        closed_positions_path: PathBuf,
    },
}

/// Copies a local export into the staging area and returns the object path
/// the flow should read from. Uploads stay uncompressed so the flow's format
/// checks see the file exactly as the broker produced it.
async fn stage_upload(lake: &LakeClient, source_path: &Path) -> Result<String> {
    let file_name = source_path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| QuanterraError::ValidationError {
            message: format!("Invalid upload path: {}", source_path.display()),
        })?;

    let staged_path = format!("temp_uploads/{}/{}", Utc::now().to_rfc3339(), file_name);
    lake.store_csv_file(source_path, &staged_path, false).await?;
    Ok(staged_path)
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(&cli.config_dir, cli.env)?;
    let lake = LakeClient::connect(&settings.lake)?;

    let context = match cli.command {
        Command::InteractiveInvestor {
            portfolio_name,
            transactions_path,
        } => {
            let staged = stage_upload(&lake, &transactions_path).await?;
            flows::interactive_investor::run(
                &settings,
                &lake,
                TransactionSource::LakeObject(staged),
                &portfolio_name,
            )
            .await?
        }
        Command::HargreavesLansdown {
            portfolio_name,
            transactions_path,
            positions_path,
            closed_positions_path,
        } => {
            let exports = flows::hargreaves_lansdown::Exports {
                transactions: Some(TransactionSource::LakeObject(
                    stage_upload(&lake, &transactions_path).await?,
                )),
                positions: Some(TransactionSource::LakeObject(
                    stage_upload(&lake, &positions_path).await?,
                )),
                closed_positions: Some(TransactionSource::LakeObject(
                    stage_upload(&lake, &closed_positions_path).await?,
                )),
            };
            flows::hargreaves_lansdown::run(&settings, &lake, exports, &portfolio_name).await?
        }
    };

    println!("Flow run created: {}", context.pipeline_id);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init_cli_logger(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("❌ Upload failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            ExitCode::from(e.severity().exit_code() as u8)
        }
    }
}
