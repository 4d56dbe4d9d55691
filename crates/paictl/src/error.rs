//! Error types for paictl
//!
//! Library errors are folded into [`PaictlError`], which knows how to suggest a
//! next step and prints itself as a cargo-style diagnostic.

use colored::Colorize;
use pai_core::{ConfigError, PaiError};
use thiserror::Error;

/// Cargo-style diagnostic formatter for CLI errors.
///
/// Produces output like:
/// ```text
/// error: Profile 'prod' not found
///
///   tip: List available profiles: paictl profile list
/// ```
pub struct CliDiagnostic {
    message: String,
    detail: Option<String>,
    tips: Vec<String>,
}

impl CliDiagnostic {
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            detail: None,
            tips: Vec::new(),
        }
    }

    pub fn detail(mut self, text: &str) -> Self {
        self.detail = Some(text.to_string());
        self
    }

    pub fn tip(mut self, description: &str) -> Self {
        self.tips.push(description.to_string());
        self
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        if let Some(detail) = &self.detail {
            eprintln!("  {}", detail);
        }

        for tip in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", tip);
        }
    }
}

/// Main error type for the paictl application
#[derive(Error, Debug)]
pub enum PaictlError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("No profile configured. Use 'paictl profile set' to configure a profile.")]
    NoProfileConfigured,

    #[error("Missing credentials: {message}")]
    MissingCredentials { message: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("API error: {message}")]
    ApiError {
        message: String,
        request_id: Option<String>,
    },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("File error for '{path}': {message}")]
    FileError { path: String, message: String },

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("Timeout: {message}")]
    Timeout { message: String },

    #[error("{message}")]
    WaitFailed { message: String },

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

/// Result type for paictl operations
pub type Result<T> = std::result::Result<T, PaictlError>;

impl PaictlError {
    /// Get helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            PaictlError::ProfileNotFound { name } => vec![
                "List available profiles: paictl profile list".to_string(),
                format!(
                    "Create profile '{}': paictl profile set {} --access-key-id <id> --access-key-secret <secret>",
                    name, name
                ),
            ],
            PaictlError::NoProfileConfigured => vec![
                "Create a profile: paictl profile set default --access-key-id <id> --access-key-secret <secret>".to_string(),
                "Or export ALIBABA_CLOUD_ACCESS_KEY_ID and ALIBABA_CLOUD_ACCESS_KEY_SECRET".to_string(),
            ],
            PaictlError::MissingCredentials { .. } => vec![
                "Check profile details: paictl profile show <profile>".to_string(),
                "Verify environment variables are set correctly".to_string(),
            ],
            PaictlError::AuthenticationFailed { .. } => vec![
                "Check the AccessKey pair: paictl profile show <profile>".to_string(),
                "Make sure the RAM user has PAI permissions in this region".to_string(),
            ],
            PaictlError::NotFound { .. } => vec![
                "Verify the resource id is correct".to_string(),
                "Check that the profile points at the right region and workspace".to_string(),
            ],
            PaictlError::ApiError {
                request_id: Some(id),
                ..
            } => vec![format!("Quote request id {} when contacting support", id)],
            PaictlError::ConnectionError { .. } => vec![
                "Check network connectivity".to_string(),
                "Verify endpoint overrides: paictl profile show <profile>".to_string(),
            ],
            PaictlError::InvalidInput { .. } => vec![
                "Check the command syntax: paictl <command> --help".to_string(),
            ],
            PaictlError::FileError { path, .. } => vec![
                format!("Check that file exists: {}", path),
                "Verify the file is valid JSON or YAML".to_string(),
            ],
            PaictlError::Timeout { .. } => vec![
                "Raise the limit with --timeout <seconds>".to_string(),
            ],
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr using colored formatting.
    pub fn print_diagnostic(&self) {
        let mut diag = CliDiagnostic::error(&self.to_string());
        if let PaictlError::ApiError {
            request_id: Some(id),
            ..
        } = self
        {
            diag = diag.detail(&format!("request id: {}", id));
        }
        for suggestion in self.suggestions() {
            diag = diag.tip(&suggestion);
        }
        diag.print();
    }
}

impl From<PaiError> for PaictlError {
    fn from(err: PaiError) -> Self {
        match err {
            PaiError::NotFound { message, .. } => PaictlError::NotFound { message },
            PaiError::Unauthorized { message, .. } => {
                PaictlError::AuthenticationFailed { message }
            }
            PaiError::Validation(message) => PaictlError::InvalidInput { message },
            PaiError::Transport(e) if e.is_timeout() => PaictlError::Timeout {
                message: e.to_string(),
            },
            PaiError::Transport(e) => PaictlError::ConnectionError {
                message: e.to_string(),
            },
            PaiError::WaitTimeout { .. } => PaictlError::Timeout {
                message: err.to_string(),
            },
            PaiError::UnexpectedStatus { .. } => PaictlError::WaitFailed {
                message: err.to_string(),
            },
            PaiError::Config(e) => PaictlError::from(e),
            other => PaictlError::ApiError {
                request_id: other.request_id().map(str::to_string),
                message: other.to_string(),
            },
        }
    }
}

impl From<ConfigError> for PaictlError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ProfileNotFound { name } => PaictlError::ProfileNotFound { name },
            ConfigError::NoProfiles { .. } => PaictlError::NoProfileConfigured,
            ConfigError::MissingField { .. } | ConfigError::CredentialError(_) => {
                PaictlError::MissingCredentials {
                    message: err.to_string(),
                }
            }
            other => PaictlError::Configuration(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for PaictlError {
    fn from(err: serde_json::Error) -> Self {
        PaictlError::OutputError {
            message: format!("JSON error: {}", err),
        }
    }
}

impl From<serde_yaml::Error> for PaictlError {
    fn from(err: serde_yaml::Error) -> Self {
        PaictlError::OutputError {
            message: format!("YAML error: {}", err),
        }
    }
}

impl From<std::io::Error> for PaictlError {
    fn from(err: std::io::Error) -> Self {
        PaictlError::OutputError {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<anyhow::Error> for PaictlError {
    fn from(err: anyhow::Error) -> Self {
        PaictlError::Configuration(format!("{:#}", err))
    }
}
