pub mod backend;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod pretty;
pub mod session;
pub mod types;

// Re-export key types and functions at the crate root
pub use backend::ScanBackend;
pub use client::{ReportDocument, ScanClient};
pub use config::Config;
pub use error::ScanError;
pub use logging::{get_log_file_path, init_logging};
pub use session::{ScanSession, ScanStatus, ScanTicket};
pub use types::{ReportKind, ScanMode, ScanReport, ScanRequest, Severity, Summary, Vulnerability};
