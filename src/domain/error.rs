//! Domain error types.

/// Top-level error type for triplescreen.
#[derive(Debug, thiserror::Error)]
pub enum ScreenError {
    #[error("insufficient data: have {available} bars, need {required}")]
    InsufficientData { required: usize, available: usize },

    #[error("unordered series: bar {index} is not after the bar before it")]
    UnorderedSeries { index: usize },

    #[error("invalid stop {stop} for entry {entry}: stop distance must be positive")]
    InvalidStop { entry: f64, stop: f64 },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

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

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScreenError {
    pub(crate) fn insufficient(required: usize, available: usize) -> Self {
        ScreenError::InsufficientData {
            required,
            available,
        }
    }

    pub(crate) fn invalid_parameter(name: &str, reason: &str) -> Self {
        ScreenError::InvalidParameter {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn config_invalid(section: &str, key: &str, reason: &str) -> Self {
        ScreenError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn config_missing(section: &str, key: &str) -> Self {
        ScreenError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }
}

impl From<&ScreenError> for std::process::ExitCode {
    fn from(err: &ScreenError) -> Self {
        let code: u8 = match err {
            ScreenError::Io(_) => 1,
            ScreenError::ConfigParse { .. }
            | ScreenError::ConfigMissing { .. }
            | ScreenError::ConfigInvalid { .. } => 2,
            ScreenError::DataSource { .. } => 3,
            ScreenError::InvalidStop { .. } | ScreenError::InvalidParameter { .. } => 4,
            ScreenError::InsufficientData { .. }
            | ScreenError::UnorderedSeries { .. }
            | ScreenError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
