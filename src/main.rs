// Entry point and high-level CLI flow.
//
// Every subcommand reads one billing CSV, runs the full analysis and then
// prints (or exports) the part the user asked for.
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use finops_report::benchmarks::DEFAULT_BASELINES;
use finops_report::output::{self, preview_table_rows};
use finops_report::util::format_int;
use finops_report::{actions, loader, AnalysisConfig, Budgets, ReportBundle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const PREVIEW_ROWS: usize = 10;

/// Billing profitability, license waste and savings reports
#[derive(Parser)]
#[command(name = "finops-report", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, value_enum, default_value = "table", global = true)]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Portfolio totals and per-client insights
    Analyze {
        #[command(flatten)]
        common: CommonArgs,
        /// JSON object of client -> budget
        #[arg(long)]
        budgets: Option<PathBuf>,
        /// Write the full JSON report here
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Rightsizing savings per client
    Savings {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Budget alerts
    Alerts {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long)]
        budgets: PathBuf,
    },
    /// Compare waste against an industry baseline
    Benchmark {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Prioritised cost-saving actions
    Actions {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Write insights.csv, savings.csv, alerts.csv and report.json
    Export {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long)]
        budgets: Option<PathBuf>,
        #[arg(long)]
        out_dir: PathBuf,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Billing CSV file
    #[arg(long)]
    csv: PathBuf,

    #[arg(long, env = "RECOVERABLE_FACTOR", default_value_t = 0.8)]
    recoverable_factor: f64,

    #[arg(long, env = "ALERT_WARN_PCT", default_value_t = 0.9)]
    warn: f64,

    #[arg(long, env = "ALERT_BREACH_PCT", default_value_t = 1.0)]
    breach: f64,

    #[arg(long, env = "INDUSTRY", default_value = "msp")]
    industry: String,
}

impl CommonArgs {
    fn config(&self) -> AnalysisConfig {
        AnalysisConfig {
            recoverable_factor: self.recoverable_factor,
            alert_warn_threshold: self.warn,
            alert_breach_threshold: self.breach,
            industry: self.industry.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn run_analysis(common: &CommonArgs, budgets: Option<&Path>) -> Result<ReportBundle> {
    let (text, encoding) = loader::read_csv_file(&common.csv)
        .with_context(|| format!("failed to read {}", common.csv.display()))?;
    let budgets = budgets
        .map(|p| Budgets::load(p).with_context(|| format!("failed to load budgets from {}", p.display())))
        .transpose()?;

    let bundle = finops_report::analyze(&text, budgets.as_ref(), &common.config(), &DEFAULT_BASELINES)
        .with_context(|| format!("failed to analyse {}", common.csv.display()))?;
    info!(
        path = %common.csv.display(),
        encoding,
        clients = bundle.report.client_insights.len(),
        "analysis complete"
    );
    Ok(bundle)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn handle_analyze(bundle: &ReportBundle, format: OutputFormat, out: Option<&Path>) -> Result<()> {
    if let Some(path) = out {
        output::write_json(path, bundle)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    if format == OutputFormat::Json {
        return print_json(&bundle.report);
    }

    let report = &bundle.report;
    println!(
        "Processing dataset... ({} clients analysed)\n",
        format_int(report.client_insights.len() as u64)
    );
    println!("{}\n", output::totals_line(&report.totals));
    println!("Client Insights (lowest margin first)\n");
    preview_table_rows(&output::insight_rows(&report.client_insights), PREVIEW_ROWS);
    if let Some(alerts) = &report.alerts {
        println!("Budget Alerts\n");
        preview_table_rows(&output::alert_rows(alerts), PREVIEW_ROWS);
    }
    if let Some(path) = out {
        println!("(Full report exported to {})\n", path.display());
    }
    Ok(())
}

fn handle_savings(bundle: &ReportBundle, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(&bundle.savings);
    }
    println!("Rightsizing Simulation\n");
    preview_table_rows(&output::savings_rows(&bundle.savings), PREVIEW_ROWS);
    Ok(())
}

fn handle_alerts(bundle: &ReportBundle, format: OutputFormat) -> Result<()> {
    let alerts = bundle.report.alerts.as_deref().unwrap_or_default();
    if format == OutputFormat::Json {
        return print_json(&alerts);
    }
    if alerts.is_empty() {
        println!("No alerts for current budgets.");
        return Ok(());
    }
    println!("Budget Alerts\n");
    preview_table_rows(&output::alert_rows(alerts), alerts.len());
    Ok(())
}

fn handle_benchmark(bundle: &ReportBundle, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(&bundle.benchmark);
    }
    for line in output::benchmark_lines(&bundle.benchmark) {
        println!("{}", line);
    }
    Ok(())
}

fn handle_actions(bundle: &ReportBundle, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(&bundle.actions);
    }
    println!("{}\n", actions::format_actions_pretty(&bundle.actions));
    preview_table_rows(&output::action_rows(&bundle.actions), bundle.actions.len());
    Ok(())
}

fn handle_export(bundle: &ReportBundle, out_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let insights = out_dir.join("insights.csv");
    output::write_csv(&insights, &bundle.report.client_insights)
        .with_context(|| format!("failed to write {}", insights.display()))?;
    let savings = out_dir.join("savings.csv");
    output::write_csv(&savings, &output::savings_rows(&bundle.savings))
        .with_context(|| format!("failed to write {}", savings.display()))?;
    if let Some(alerts) = &bundle.report.alerts {
        let path = out_dir.join("alerts.csv");
        output::write_csv(&path, alerts)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    let report = out_dir.join("report.json");
    output::write_json(&report, bundle)
        .with_context(|| format!("failed to write {}", report.display()))?;

    println!("Outputs saved to {}", out_dir.display());
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let format = cli.format;
    match cli.command {
        Commands::Analyze { common, budgets, out } => {
            let bundle = run_analysis(&common, budgets.as_deref())?;
            handle_analyze(&bundle, format, out.as_deref())
        }
        Commands::Savings { common } => handle_savings(&run_analysis(&common, None)?, format),
        Commands::Alerts { common, budgets } => {
            handle_alerts(&run_analysis(&common, Some(budgets.as_path()))?, format)
        }
        Commands::Benchmark { common } => handle_benchmark(&run_analysis(&common, None)?, format),
        Commands::Actions { common } => handle_actions(&run_analysis(&common, None)?, format),
        Commands::Export { common, budgets, out_dir } => {
            handle_export(&run_analysis(&common, budgets.as_deref())?, &out_dir)
        }
    }
}

fn main() -> ExitCode {
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("finops_report=info,warn")))
        .try_init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
