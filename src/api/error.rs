// ─── API Error Classification ───────────────────────────────────────────────

/// Failure from the Oxide API surface.
///
/// `Status` carries the HTTP status so "not found" can be recognised from the
/// typed code; `Transport` covers connection-level failures where only the
/// message text is available and classification falls back to a substring
/// match for legacy transports.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ApiError {
    #[error("{status} {message}")]
    Status { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),
}

impl ApiError {
    pub fn not_found() -> Self {
        ApiError::Status {
            status: 404,
            message: "Not Found".to_string(),
        }
    }

    /// True when the failure means the remote resource does not exist.
    /// In Read this clears state; in Delete it is success; elsewhere it is
    /// an error like any other.
    pub fn is_not_found(&self) -> bool {
        match self {
            ApiError::Status { status, .. } => *status == 404,
            ApiError::Transport(message) => message.contains("404 Not Found"),
        }
    }
}
