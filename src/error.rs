//! Error types for catalog loading.
//!
//! Parse and process failures keep the last good catalog on screen; the
//! caller turns them into a status line plus a raw output preview.
//! Cancellation travels through the same enum but is shown as a neutral
//! status, never as an error dialog.

use thiserror::Error;

/// Result alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Maximum number of characters kept from stdout for diagnostics.
pub const PREVIEW_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// No structured document could be recovered from the process output.
    #[error("Unable to parse catalog output")]
    Parse {
        /// Leading slice of stdout, for the console.
        preview: String,
        stderr: String,
    },

    /// The catalog process exited non-zero or could not be launched.
    #[error("Catalog command failed: {message}")]
    ProcessFailure {
        message: String,
        stdout_preview: String,
        stderr: String,
    },

    /// The fetch was cancelled by the user.
    #[error("Catalog load cancelled")]
    Cancelled,

    /// The recovered document is not a usable catalog root.
    #[error("Malformed catalog document: {0}")]
    MalformedDocument(String),

    /// A fetch is already running.
    #[error("A catalog load is already in progress.")]
    FetchInFlight,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CatalogError {
    /// Whether this outcome should be reported as a neutral status.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, CatalogError::Cancelled)
    }

    /// Build a process failure from exit details, following the
    /// "stderr, or exit code" message rule.
    pub fn process_failure(code: Option<i32>, stdout: &str, stderr: &str) -> Self {
        let trimmed = stderr.trim();
        let message = if trimmed.is_empty() {
            match code {
                Some(c) => format!("Catalog exited with {}", c),
                None => "Catalog terminated by signal".to_string(),
            }
        } else {
            trimmed.to_string()
        };
        CatalogError::ProcessFailure {
            message,
            stdout_preview: preview(stdout),
            stderr: stderr.to_string(),
        }
    }
}

/// First [`PREVIEW_CHARS`] characters of `text`, on a char boundary.
pub fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}
