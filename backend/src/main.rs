//! flow-import CLI - Validate spreadsheet imports for the FlowDistributor dashboard
//!
//! # Main Commands
//!
//! ```bash
//! flow-import validate export.json          # Validate, print validated data
//! flow-import report export.json            # Full report with recommendations
//! flow-import serve                         # Start HTTP server (port 3000)
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! flow-import normalize client 470          # -> "Client 470"
//! flow-import normalize sale-status '"Pagado"'
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use flow_import::config::DEFAULT_PORT;
use flow_import::normalize::{normalize_client_status, normalize_sale_status, sanitize_client_name};
use flow_import::{load_payload_file, ImportValidator, ValidationResult, ValidatorConfig};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "flow-import")]
#[command(about = "Validate FlowDistributor spreadsheet imports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an import payload and output the validated data
    Validate {
        /// Input JSON file (spreadsheet export)
        input: PathBuf,

        /// Output file for validated data (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the full report to this file
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Tolerance for money comparisons
        #[arg(long)]
        money_tolerance: Option<f64>,

        /// Tolerance between bank ledger and declared capital
        #[arg(long)]
        bank_tolerance: Option<f64>,

        /// Validate collections on parallel tasks
        #[arg(long)]
        concurrent: bool,
    },

    /// Validate and output the full report
    Report {
        /// Input JSON file (spreadsheet export)
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show what a normalizer does with a value
    Normalize {
        /// Normalizer to apply
        #[arg(value_enum)]
        kind: NormalizerKind,

        /// JSON literal (plain text is read as a string)
        value: String,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum NormalizerKind {
    /// Client name sanitizer
    Client,
    /// Sale payment status
    SaleStatus,
    /// Client account status
    ClientStatus,
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate {
            input,
            output,
            report,
            money_tolerance,
            bank_tolerance,
            concurrent,
        } => {
            cmd_validate(
                &input,
                output.as_deref(),
                report.as_deref(),
                money_tolerance,
                bank_tolerance,
                concurrent,
            )
            .await
        }

        Commands::Report { input, output } => cmd_report(&input, output.as_deref()),

        Commands::Normalize { kind, value } => cmd_normalize(kind, &value),

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(
    money_tolerance: Option<f64>,
    bank_tolerance: Option<f64>,
) -> Result<ValidatorConfig, Box<dyn std::error::Error>> {
    let mut config = ValidatorConfig::from_env()?;
    if let Some(tolerance) = money_tolerance {
        config = config.with_money_tolerance(tolerance)?;
    }
    if let Some(tolerance) = bank_tolerance {
        config = config.with_bank_tolerance(tolerance)?;
    }
    Ok(config)
}

async fn cmd_validate(
    input: &Path,
    output: Option<&Path>,
    report_path: Option<&Path>,
    money_tolerance: Option<f64>,
    bank_tolerance: Option<f64>,
    concurrent: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("✔️  Validating: {}", input.display());

    let payload = load_payload_file(input)?;
    let validator = ImportValidator::new(load_config(money_tolerance, bank_tolerance)?);

    let result = if concurrent {
        validator.validate_all_concurrent(payload).await?
    } else {
        validator.validate_all(&payload)
    };

    print_summary(&result);

    if let Some(path) = report_path {
        let report = validator.generate_report(&result);
        fs::write(path, serde_json::to_string_pretty(&report)?)?;
        eprintln!("💾 Report written to: {}", path.display());
    }

    let json = serde_json::to_string_pretty(&result.data)?;
    write_output(&json, output)?;

    if !result.success {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_report(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📋 Report for: {}", input.display());

    let payload = load_payload_file(input)?;
    let validator = ImportValidator::new(ValidatorConfig::from_env()?);
    let result = validator.validate_all(&payload);
    let report = validator.generate_report(&result);

    for rec in &report.recommendations {
        eprintln!("   [{:?}] {}", rec.priority, rec.message);
    }

    let json = serde_json::to_string_pretty(&report)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_normalize(kind: NormalizerKind, raw: &str) -> Result<(), Box<dyn std::error::Error>> {
    let value: Value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));

    let normalized = match kind {
        NormalizerKind::Client => Value::String(sanitize_client_name(&value)),
        NormalizerKind::SaleStatus => serde_json::to_value(normalize_sale_status(&value))?,
        NormalizerKind::ClientStatus => serde_json::to_value(normalize_client_status(&value))?,
    };

    println!("{} -> {}", value, normalized);
    Ok(())
}

async fn cmd_serve(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let validator = ImportValidator::new(ValidatorConfig::from_env()?);
    flow_import::server::start_server(port, validator).await?;
    Ok(())
}

fn print_summary(result: &ValidationResult) {
    let stats = &result.stats;
    eprintln!("\n📊 Results:");
    eprintln!("   Sales:           {}/{}", stats.sales.validated, stats.sales.processed);
    eprintln!("   Clients:         {}/{}", stats.clients.validated, stats.clients.processed);
    eprintln!(
        "   Purchase orders: {}/{}",
        stats.purchase_orders.validated, stats.purchase_orders.processed
    );
    eprintln!("   Banks:           {}/{}", stats.banks.validated, stats.banks.processed);
    eprintln!(
        "   Warehouse:       {} in, {} out",
        stats.warehouse.incoming, stats.warehouse.outgoing
    );

    for issue in result.errors.iter().take(5) {
        eprintln!("\n❌ {} {}:", issue.kind, issue.id.as_deref().unwrap_or("-"));
        eprintln!("   - {}", issue.message);
    }
    if result.errors.len() > 5 {
        eprintln!("\n   ... and {} more errors", result.errors.len() - 5);
    }

    eprintln!(
        "\n   {} errors, {} warnings",
        result.errors.len(),
        result.warnings.len()
    );
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
