use thiserror::Error;

/// Machine-readable error kinds surfaced to the CLI.
///
/// Exit codes (see `main.rs`): `InvalidInput | NotFound | AlreadyExists` map
/// to 1; everything else maps to 2.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("git authentication failed: {0}")]
    AuthRequired(String),

    #[error("clone failed: {0}")]
    CloneFailed(String),

    #[error("clone verification failed: {0}")]
    CloneVerificationFailed(String),

    #[error("no ports available in range for service {0:?}")]
    NoPortsAvailable(String),

    #[error("container runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    #[error("image build failed: {0}")]
    BuildFailed(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Process exit code per spec: user errors are 1, infrastructure errors are 2.
    pub fn exit_code(&self) -> i32 {
        match self {
            EngineError::InvalidInput(_) | EngineError::NotFound(_) | EngineError::AlreadyExists(_) => 1,
            _ => 2,
        }
    }
}

/// Walk an [`eyre::Report`]'s error chain looking for a downcast
/// [`EngineError`], used by `main.rs` to pick an exit code.
pub fn exit_code_for(report: &eyre::Report) -> i32 {
    for cause in report.chain() {
        if let Some(e) = cause.downcast_ref::<EngineError>() {
            return e.exit_code();
        }
    }
    1
}
