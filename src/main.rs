use eyre::{Result, WrapErr};
use std::fs;
use std::path::{Path, PathBuf};

use sentinel::cli::{self, Command};
use sentinel::{
    Config, ReportKind, ScanBackend, ScanClient, ScanReport, ScanRequest, ScanSession, ScanStatus,
    pretty,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::parse();

    // Initialize logging first
    if let Err(e) = sentinel::init_logging(cli.verbose) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    log::info!("================================================================================");
    log::info!("🚀 NEW SENTINEL SESSION STARTING");
    log::info!("================================================================================");

    let config = Config::load(cli.overrides()).wrap_err("Failed to load configuration")?;
    let client = ScanClient::new(config).wrap_err("Failed to create scan client")?;

    match cli.command {
        Command::Scan {
            url,
            deep,
            json,
            save,
            download,
            ..
        } => {
            let request = ScanRequest::new(url, cli::scan_mode(deep))?;
            let report = run_scan(&client, &request, json).await?;

            if let Some(path) = save {
                save_report(&report, &path)?;
                println!("Report saved to {}", path.display());
            }

            if let Some(kind) = download {
                export_report(&client, &report, kind).await?;
            }
        }
        Command::Download { report, kind, .. } => {
            let report = load_report(&report)?;
            export_report(&client, &report, kind).await?;
        }
    }

    Ok(())
}

async fn run_scan(client: &ScanClient, request: &ScanRequest, json: bool) -> Result<ScanReport> {
    let mut session = ScanSession::new();
    pretty::print_status(request.url(), &ScanStatus::Loading);

    let result = session.submit(client, request).await;

    if json {
        if let Ok(report) = &result {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
    } else {
        pretty::print_status(request.url(), session.status());
    }

    result.wrap_err_with(|| format!("{} scan of {} failed", request.mode(), request.url()))
}

async fn export_report(client: &ScanClient, report: &ScanReport, kind: ReportKind) -> Result<PathBuf> {
    println!("📄 Requesting {} report for {}", kind, report.target);

    let document = client
        .request_report_download(report, kind)
        .await
        .wrap_err("Download failed")?;
    let path = document
        .save_to(&client.config().output_dir)
        .wrap_err("Failed to write report document")?;

    println!("Saved {} ({} bytes)", path.display(), document.bytes.len());
    Ok(path)
}

fn save_report(report: &ScanReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json).wrap_err_with(|| format!("Failed to write {}", path.display()))
}

fn load_report(path: &Path) -> Result<ScanReport> {
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .wrap_err_with(|| format!("{} is not a valid scan report", path.display()))
}
