use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Failure classes for one generation run. Anything that reaches the
/// orchestrator as an `Err` aborts the run; the orchestrator never retries
/// across steps (per-step credential rotation happens below this level).
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No credential configured for a provider. Fatal, never retried.
    #[error("no {provider} API key configured")]
    Configuration { provider: &'static str },

    /// External call kept failing after one attempt per configured key.
    #[error("{provider} request failed after {attempts} attempt(s): {message}")]
    Provider {
        provider: &'static str,
        attempts: usize,
        message: String,
    },

    /// The provider answered but the payload is unusable.
    #[error("unusable content: {0}")]
    Content(String),

    /// Media processing failed after every fallback was exhausted.
    #[error("render failed: {0}")]
    Render(String),

    /// Continuation lookup miss.
    #[error("no run found with id {0}")]
    RunNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_human_readable() {
        let err = PipelineError::Provider {
            provider: "cohere",
            attempts: 2,
            message: "HTTP 500".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "cohere request failed after 2 attempt(s): HTTP 500"
        );

        let err = PipelineError::RunNotFound("ab12cd34".to_string());
        assert!(err.to_string().contains("ab12cd34"));
    }
}
