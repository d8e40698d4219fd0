use clap::Parser;
use pavement_entry::audit::XlsxAuditLog;
use pavement_entry::browser::ChromeLauncher;
use pavement_entry::cli::{self, Cli};
use pavement_entry::config::Config;
use pavement_entry::error::{EntryError, Result};
use pavement_entry::report::XlsxUnmatchedReport;
use pavement_entry::{spreadsheet, RunController, RunSettings};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.default_log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("\n✘ {}", e);
        std::process::exit(if e.is_fatal() { 2 } else { 1 });
    }
}

async fn run(cli: Cli) -> Result<()> {
    println!("🛣  pavement-entry - section entry\n");

    // 1. Config and rows
    println!("[1/4] Loading config and spreadsheet...");
    let mut config = Config::load(cli.config.as_deref())?;
    if cli.headless {
        config.headless = true;
    }

    let spreadsheet_path = config.spreadsheet();
    let rows = spreadsheet::read_rows(&spreadsheet_path)?;
    println!(
        "✔ {} row(s) from {}\n",
        rows.len(),
        spreadsheet_path.display()
    );
    if rows.is_empty() {
        return Err(EntryError::Spreadsheet(format!(
            "no data rows in {}",
            spreadsheet_path.display()
        )));
    }

    let password = match config.password() {
        Some(password) => password,
        None => cli::prompt_password(&config.username)?,
    };

    let mut audit = XlsxAuditLog::open(&config.audit_log())?;
    let mut unmatched = XlsxUnmatchedReport::new(&config.unmatched_report());

    // 2-4. Browser, login, rows
    let controller = RunController::new(RunSettings::from_config(&config, password)?);
    let launcher = ChromeLauncher::new(config.headless);
    let summary = controller
        .run(&launcher, &rows, &mut audit, &mut unmatched)
        .await?;

    println!(
        "\n✅ Done: {} attempted, {} submitted, {} failed",
        summary.attempted, summary.succeeded, summary.failed
    );
    for outcome in summary.failures() {
        let reason = outcome
            .error
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_default();
        println!("  ✘ {} ({}): {}", outcome.location(), outcome.identity, reason);
    }
    println!("  audit log: {}", audit.path().display());
    println!("  unmatched report: {}", unmatched.path().display());

    Ok(())
}
