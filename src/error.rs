/// Per-stage outcome of the resolution-and-analysis pipeline.
///
/// `NotFound`, `Empty` and `Insufficient` are expected absences; a leg that
/// ends in one of them is reported as absent, never as a crash. `Transport`
/// covers upstream failures and malformed payloads. None of these escalate
/// past the leg boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("no data: {0}")]
    Empty(String),

    #[error("insufficient data: {have} candles, need at least {need}")]
    Insufficient { have: usize, need: usize },

    #[error("transport failure: {0}")]
    Transport(String),
}

impl PipelineError {
    /// Wrap a gateway error, keeping the whole context chain.
    pub fn transport(err: anyhow::Error) -> Self {
        PipelineError::Transport(format!("{err:#}"))
    }

    /// True for the expected-absence variants (not a transport problem).
    pub fn is_absence(&self) -> bool {
        !matches!(self, PipelineError::Transport(_))
    }

    /// Short tag for structured log fields and report columns.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::NotFound(_) => "not_found",
            PipelineError::Empty(_) => "empty",
            PipelineError::Insufficient { .. } => "insufficient",
            PipelineError::Transport(_) => "transport",
        }
    }
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
