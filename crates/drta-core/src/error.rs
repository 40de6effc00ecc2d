use thiserror::Error;

/// Errors surfaced by the learning pipeline. Mirrors the error-kind taxonomy the
/// original tooling only distinguished by log message: malformed input aborts the
/// current operation, infeasible learning and resource exhaustion are reported to the
/// driver as benchmark statuses, and invariant violations / recursion guards are caught
/// and logged locally by the component that detects them rather than propagated here
/// (see [`crate::error::LearnerError::InternalInvariantViolation`] for the rare case
/// where local recovery is impossible and the build must abort).
#[derive(Debug, Error)]
pub enum LearnerError {
    #[error("malformed input: {token:?} ({reason})")]
    MalformedInput { token: String, reason: String },

    #[error("no consistent DRTA found for k up to {k_max}")]
    InfeasibleLearning { k_max: usize },

    #[error("internal invariant violated: {0}")]
    InternalInvariantViolation(String),

    #[error("replace-or-register recursion guard triggered: {0}")]
    RecursionGuardTriggered(String),

    #[error("resource exhaustion in SMT backend: {0}")]
    ResourceExhaustion(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Maps a [`LearnerError`] (or pipeline outcome) onto one of the fixed BenchExec-style
/// status strings documented in spec §6, so an external `benchexec` tool-info module can
/// keep scraping stdout the way it does for the original `rta.sh`/`rti.sh` wrappers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenchStatus {
    Ok,
    MemoryOut,
    Error,
    NoSolution,
    Unknown,
}

impl std::fmt::Display for BenchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BenchStatus::Ok => "OK",
            BenchStatus::MemoryOut => "MEMORYOUT",
            BenchStatus::Error => "ERROR",
            BenchStatus::NoSolution => "NOSOLUTION",
            BenchStatus::Unknown => "UNKNOWN",
        };
        write!(f, "{s}")
    }
}

impl From<&LearnerError> for BenchStatus {
    fn from(err: &LearnerError) -> Self {
        match err {
            LearnerError::InfeasibleLearning { .. } => BenchStatus::NoSolution,
            LearnerError::ResourceExhaustion(_) => BenchStatus::MemoryOut,
            _ => BenchStatus::Error,
        }
    }
}
