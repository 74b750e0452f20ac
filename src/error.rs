//! Error types for the verification harness

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Timed out waiting for: {0}")]
    Timeout(String),

    #[error("Element resolution failed: {0}")]
    ElementResolution(String),

    #[error("Screenshot artifact check failed: {0}")]
    Artifact(String),

    #[error("Playwright not found. Install with: npm install playwright && npx playwright install chromium")]
    DriverNotFound,

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl VerifyError {
    /// Whether this error is a failure of the verification script itself,
    /// as opposed to a failure of the harness or its toolchain.
    pub fn is_script_failure(&self) -> bool {
        matches!(
            self,
            VerifyError::Navigation(_)
                | VerifyError::Timeout(_)
                | VerifyError::ElementResolution(_)
                | VerifyError::Artifact(_)
        )
    }
}

pub type VerifyResult<T> = Result<T, VerifyError>;
