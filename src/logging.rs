use eyre::{Result, WrapErr, eyre};
use log::LevelFilter;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

const APP_NAME: &str = "sentinel";
const LOG_FILE_NAME: &str = "sentinel.log";

/// Initialize logging to a per-user log file.
///
/// `RUST_LOG` picks the level (default info); `verbose` raises it to at least
/// debug. Stdout stays free for report output.
pub fn init_logging(verbose: bool) -> Result<PathBuf> {
    let log_path = get_log_file_path()?;

    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)
            .wrap_err_with(|| format!("Failed to create log directory {}", parent.display()))?;
    }

    let log_level = resolve_level(std::env::var("RUST_LOG").ok().as_deref(), verbose);

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .wrap_err_with(|| format!("Failed to open log file {}", log_path.display()))?;

    env_logger::Builder::new()
        .filter_level(log_level)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {} - {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .wrap_err("Logger already initialized")?;

    log::info!("[logging] initialized: path={} level={}", log_path.display(), log_level);

    Ok(log_path)
}

fn resolve_level(env_value: Option<&str>, verbose: bool) -> LevelFilter {
    let level = env_value
        .and_then(|v| v.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);

    if verbose { level.max(LevelFilter::Debug) } else { level }
}

/// Get the system-specific log file path
pub fn get_log_file_path() -> Result<PathBuf> {
    let log_dir = if cfg!(target_os = "macos") {
        // macOS: ~/Library/Logs/sentinel/
        dirs::home_dir()
            .ok_or_else(|| eyre!("Could not find home directory"))?
            .join("Library")
            .join("Logs")
            .join(APP_NAME)
    } else if cfg!(target_os = "linux") && nix::unistd::getuid().is_root() {
        PathBuf::from("/var/log").join(APP_NAME)
    } else {
        // ~/.local/share/sentinel/logs/ and the fallback for other systems
        dirs::data_local_dir()
            .ok_or_else(|| eyre!("Could not find local data directory"))?
            .join(APP_NAME)
            .join("logs")
    };

    Ok(log_dir.join(LOG_FILE_NAME))
}
