use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Protocol mismatch in {operation}: {reason}")]
    ProtocolMismatch {
        operation: String,
        reason: String,
        raw: String,
    },

    #[error("Server returned {status} for {operation}")]
    Server {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Protocol,
    Server,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ProbeError {
    pub fn protocol(operation: &str, reason: impl Into<String>, raw: impl Into<String>) -> Self {
        ProbeError::ProtocolMismatch {
            operation: operation.to_string(),
            reason: reason.into(),
            raw: raw.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ProbeError::Network(_) => ErrorCategory::Network,
            ProbeError::ProtocolMismatch { .. } | ProbeError::SerializationError(_) => {
                ErrorCategory::Protocol
            }
            ProbeError::Server { .. } => ErrorCategory::Server,
            ProbeError::ConfigError { .. } | ProbeError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            ProbeError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 網路錯誤通常可重試
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Protocol | ErrorCategory::Server => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 伺服器回傳的原始內容（若有）
    pub fn raw_payload(&self) -> Option<&str> {
        match self {
            ProbeError::ProtocolMismatch { raw, .. } => Some(raw),
            ProbeError::Server { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ProbeError::Network(e) if e.is_timeout() => {
                "The server did not answer in time; raise --timeout or check server load"
            }
            ProbeError::Network(_) => {
                "Check that the layer server is running and that --base-url points at it"
            }
            ProbeError::ProtocolMismatch { .. } | ProbeError::SerializationError(_) => {
                "The server answered with an unexpected payload; verify the server version"
            }
            ProbeError::Server { status, .. } if *status == 404 => {
                "The layer or feature does not exist on the server"
            }
            ProbeError::Server { .. } => "Inspect the server logs for the failing request",
            ProbeError::ConfigError { .. } | ProbeError::InvalidConfigValueError { .. } => {
                "Fix the configuration file or command line options"
            }
            ProbeError::IoError(_) => "Check file paths and permissions",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ProbeError::Network(_) => format!("Could not reach the layer server: {}", self),
            ProbeError::ProtocolMismatch {
                operation, reason, ..
            } => format!("Unexpected response to {}: {}", operation, reason),
            ProbeError::Server {
                operation, status, ..
            } => format!("{} failed with HTTP {}", operation, status),
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProbeError>;
