use thiserror::Error;

/// Failures of a single scan or export action.
///
/// None of these are fatal to the process: each is scoped to the user action
/// that triggered it and is surfaced through [`ScanError::user_message`].
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid scan request: {0}")]
    InvalidRequest(String),

    /// Backend unreachable, or it answered a scan with a non-success status.
    #[error("connection to scan backend failed: {reason}")]
    Connection {
        endpoint: String,
        status: Option<u16>,
        reason: String,
    },

    #[error("malformed response from {endpoint}: {reason}")]
    MalformedResponse { endpoint: String, reason: String },

    /// The report export request failed.
    #[error("report download failed: {reason}")]
    Download {
        status: Option<u16>,
        reason: String,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScanError {
    /// Text shown to the user when a scan ends in the error state.
    pub fn user_message(&self) -> String {
        match self {
            ScanError::Connection { status: None, .. } => {
                "Connection Failed. Ensure the Sentinel backend is running.".to_string()
            }
            ScanError::Connection {
                status: Some(code),
                reason,
                ..
            } => format!("Scan rejected by backend (HTTP {}): {}", code, reason),
            other => other.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ScanError::Connection { status, .. } | ScanError::Download { status, .. } => *status,
            _ => None,
        }
    }
}
