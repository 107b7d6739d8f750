use thiserror::Error;

/// Failures reported by a lookup or listing collaborator.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source call timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("session invalidated: {0}")]
    SessionInvalidated(String),

    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    #[error("rate limited (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    /// A session could not be created at all.
    #[error("session setup failed: {0}")]
    SessionSetup(String),

    /// The source understood the request and refused it; retrying won't help.
    #[error("request rejected: {0}")]
    Rejected(String),
}

impl SourceError {
    /// Transient failures are retried with back-off; the rest end the unit.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            SourceError::Timeout { .. }
            | SourceError::SessionInvalidated(_)
            | SourceError::ConnectionRefused(_)
            | SourceError::RateLimited { .. } => true,
            SourceError::SessionSetup(_) | SourceError::Rejected(_) => false,
        }
    }

    /// Whether the session that produced this error must be replaced before
    /// the next attempt.
    #[must_use]
    pub fn poisons_session(&self) -> bool {
        matches!(
            self,
            SourceError::Timeout { .. }
                | SourceError::SessionInvalidated(_)
                | SourceError::ConnectionRefused(_)
        )
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize results for {label}: {reason}")]
    Serialize { label: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environmental_failures_are_transient() {
        assert!(SourceError::Timeout { secs: 45 }.is_transient());
        assert!(SourceError::SessionInvalidated("stale".into()).is_transient());
        assert!(SourceError::ConnectionRefused("port 9222".into()).is_transient());
        assert!(SourceError::RateLimited {
            retry_after_secs: 30
        }
        .is_transient());
    }

    #[test]
    fn setup_and_rejection_are_permanent() {
        assert!(!SourceError::SessionSetup("no driver".into()).is_transient());
        assert!(!SourceError::Rejected("bad query".into()).is_transient());
    }

    #[test]
    fn rate_limit_keeps_session() {
        assert!(!SourceError::RateLimited {
            retry_after_secs: 1
        }
        .poisons_session());
        assert!(SourceError::SessionInvalidated("x".into()).poisons_session());
    }
}
