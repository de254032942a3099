use std::path::{Path, PathBuf};

use chrono::Utc;
use env_logger::{Builder, Target};
use log::{debug, error, info};

use crate::error::Result;

/// Initialize logging into a timestamped file under `log_dir`
pub fn init_logging(log_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(log_dir)?;

    let log_file = log_dir.join(format!("symbio_{}.log", Utc::now().format("%Y%m%d_%H%M%S")));

    Builder::from_default_env()
        .target(Target::Pipe(Box::new(std::fs::File::create(&log_file)?)))
        .format(|buf, record| {
            use std::io::Write;
            writeln!(buf,
                "{} [{}] [{}:{}] [{}] {}",
                Utc::now().format("%Y-%m-%d %H:%M:%S%.3f UTC"),
                record.level(),
                record.module_path().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                std::thread::current().name().unwrap_or("worker"),
                record.args()
            )
        })
        .try_init()?;

    info!("Logging system initialized");
    info!("Log file: {log_file:?}");
    debug!("Log directory: {log_dir:?}");

    Ok(log_file)
}

/// Map SYMBIO_LOG_LEVEL onto RUST_LOG for this crate, defaulting to info
pub fn set_log_level() {
    let level = std::env::var("SYMBIO_LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase();

    let env_filter = match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => level.as_str(),
        _ => {
            eprintln!("Invalid log level '{level}', defaulting to 'info'");
            "info"
        }
    };

    std::env::set_var("RUST_LOG", format!("symbio={env_filter}"));
}

pub fn log_system_info() {
    info!("=== Symbio Starting ===");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Build target: {}", std::env::consts::ARCH);
    info!("Operating system: {}", std::env::consts::OS);
    info!("Current working directory: {:?}", std::env::current_dir().unwrap_or_default());
    info!("Available CPU cores: {}", num_cpus::get());

    debug!("Environment variables:");
    for (key, value) in std::env::vars() {
        if key.starts_with("SYMBIO_") || key == "RUST_LOG" {
            debug!("  {key}: {value}");
        }
    }
}

pub fn log_shutdown() {
    info!("=== Symbio Shutting Down ===");
    info!("Terminated at {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));
}

/// Log to the logger and to stderr, in case logging was never set up
pub fn log_critical_error(error: &str, context: Option<&str>) {
    let stamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    match context {
        Some(ctx) => {
            error!("CRITICAL ERROR [{ctx}]: {error}");
            eprintln!("[{stamp}] CRITICAL ERROR [{ctx}]: {error}");
        }
        None => {
            error!("CRITICAL ERROR: {error}");
            eprintln!("[{stamp}] CRITICAL ERROR: {error}");
        }
    }
}
