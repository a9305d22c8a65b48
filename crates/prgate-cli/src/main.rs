use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::*;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use prgate_core::GateError;
use prgate_runner::{GateConfig, GateRun, ManagedArgs, Runner, SuppliedArgs};

mod report;

#[derive(Parser)]
#[command(name = "prgate", version, about = "Notarize a pull request and verify every required approver has done the same")]
struct Cli {
    /// TOML config file; built-in defaults when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print the run result as JSON instead of the console report
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Mint or rotate approver credentials through the key directory, then notarize and verify
    Managed {
        directory_url: String,
        token: String,
        ledger_host: String,
        ledger_port: String,
        no_tls: String,
        ledger_id: String,
        /// Comma-separated approver usernames
        required_approvers: String,
        approver: String,
    },

    /// Notarize and verify with already-minted API keys (`<signerId>.<secret>`, comma-separated)
    Supplied {
        ledger_host: String,
        ledger_port: String,
        no_tls: String,
        credentials: String,
        approver: String,
    },

    /// Write a config file with the default settings
    InitConfig {
        #[arg(default_value = "prgate.toml")]
        path: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            let prefix = match e.downcast_ref::<GateError>() {
                Some(gate) => format!("ABORTING ({:?} error)", gate.category()),
                None => "ABORTING".to_string(),
            };
            eprintln!("{}", format!("{prefix}: {e:#}").red());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    debug!(config = ?cli.config, "loading config");
    let cfg = GateConfig::load_or_default(cli.config.as_deref())?;

    let result = match cli.cmd {
        Command::InitConfig { path } => {
            cfg.save_to(&path)?;
            println!("Wrote {}", path.display());
            return Ok(ExitCode::SUCCESS);
        }
        Command::Managed {
            directory_url,
            token,
            ledger_host,
            ledger_port,
            no_tls,
            ledger_id,
            required_approvers,
            approver,
        } => {
            let args = ManagedArgs::parse(
                &directory_url,
                &token,
                &ledger_host,
                &ledger_port,
                &no_tls,
                &ledger_id,
                &required_approvers,
                &approver,
            )
            .map_err(GateError::from)?;
            Runner::new(cfg).run_managed(&args)?
        }
        Command::Supplied { ledger_host, ledger_port, no_tls, credentials, approver } => {
            let args = SuppliedArgs::parse(&ledger_host, &ledger_port, &no_tls, &credentials, &approver)
                .map_err(GateError::from)?;
            Runner::new(cfg).run_supplied(&args)?
        }
    };

    print_run(&result, cli.json)?;
    Ok(if result.outcome.success { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn print_run(run: &GateRun, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(run)?);
    } else {
        print!("{}", report::render(run));
    }
    Ok(())
}
