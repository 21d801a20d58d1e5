//! Domain error types.

/// Top-level error type for scalper.
#[derive(Debug, thiserror::Error)]
pub enum ScalperError {
    #[error("data alignment error: {reason}")]
    DataAlignment { reason: String },

    #[error("insufficient data: have {bars} bars, need {minimum}")]
    InsufficientData { bars: usize, minimum: usize },

    #[error("invalid parameter {parameter}: {reason}")]
    Configuration { parameter: String, reason: String },

    #[error("signal generation failed: {reason}")]
    SignalGeneration { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data load error: {reason}")]
    DataLoad { reason: String },

    #[error("invalid bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScalperError {
    pub fn configuration(parameter: &str, reason: impl Into<String>) -> Self {
        ScalperError::Configuration {
            parameter: parameter.to_string(),
            reason: reason.into(),
        }
    }

    pub fn alignment(reason: impl Into<String>) -> Self {
        ScalperError::DataAlignment {
            reason: reason.into(),
        }
    }

    /// Short machine-friendly name, used in comparison tables and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ScalperError::DataAlignment { .. } => "data_alignment",
            ScalperError::InsufficientData { .. } => "insufficient_data",
            ScalperError::Configuration { .. } => "configuration",
            ScalperError::SignalGeneration { .. } => "signal_generation",
            ScalperError::ConfigParse { .. }
            | ScalperError::ConfigMissing { .. }
            | ScalperError::ConfigInvalid { .. } => "config",
            ScalperError::DataLoad { .. } | ScalperError::InvalidBar { .. } => "data",
            ScalperError::Io(_) => "io",
        }
    }
}

impl From<&ScalperError> for std::process::ExitCode {
    fn from(err: &ScalperError) -> Self {
        let code: u8 = match err {
            ScalperError::Io(_) => 1,
            ScalperError::ConfigParse { .. }
            | ScalperError::ConfigMissing { .. }
            | ScalperError::ConfigInvalid { .. } => 2,
            ScalperError::DataLoad { .. } | ScalperError::InvalidBar { .. } => 3,
            ScalperError::SignalGeneration { .. } => 4,
            ScalperError::DataAlignment { .. } | ScalperError::InsufficientData { .. } => 5,
            ScalperError::Configuration { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
