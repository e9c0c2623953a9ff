//! CLI error types with exit code handling
//!
//! Library errors are flattened into a [`CliError`] carrying the message,
//! an optional remediation hint and the process exit code.

use idepack_core::CoreError;
use idepack_repo::RepoError;
use idepack_sync::SyncError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Invalid project config, descriptor or user input
    #[error("Validation failed: {message}")]
    #[diagnostic(code(idepack::cli::validation))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Package could not be resolved, downloaded or installed
    #[error("Pack error: {message}")]
    #[diagnostic(code(idepack::cli::pack))]
    Pack {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Generating IDE configuration failed
    #[error("Sync error: {message}")]
    #[diagnostic(code(idepack::cli::sync))]
    Sync {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Network error: {message}")]
    #[diagnostic(code(idepack::cli::network))]
    Network {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("IO error: {message}")]
    #[diagnostic(code(idepack::cli::io))]
    Io { message: String },

    /// Some packages of a batch failed
    #[error("{failed} package(s) failed ({succeeded} installed, {skipped} skipped)")]
    #[diagnostic(code(idepack::cli::batch))]
    Batch {
        succeeded: usize,
        skipped: usize,
        failed: usize,
    },

    #[error("Internal error: {message}")]
    #[diagnostic(code(idepack::cli::internal))]
    Internal { message: String },
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Pack { .. } => exit_codes::PACK_ERROR,
            CliError::Sync { .. } => exit_codes::SYNC_ERROR,
            CliError::Network { .. } => exit_codes::NETWORK_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Batch { .. } => exit_codes::ERROR,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create an input error (user provided invalid input)
    pub fn input(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            help: None,
        }
    }

    pub fn validation_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::Io { .. } => CliError::Io { message },
            CoreError::InvalidProject { .. } | CoreError::YamlParse(_) => CliError::Validation {
                message,
                help: Some("check .idepack/project.yaml".to_string()),
            },
            CoreError::HomeNotFound => CliError::Validation {
                message,
                help: Some("export IDEPACK_HOME=/path/to/idepack".to_string()),
            },
            _ => CliError::Pack {
                message,
                help: None,
            },
        }
    }
}

impl From<RepoError> for CliError {
    fn from(err: RepoError) -> Self {
        let help = err.hint();
        let message = err.to_string();
        match err {
            RepoError::Core(core) => {
                let mut cli = CliError::from(core);
                if let CliError::Pack { help: slot, .. } = &mut cli {
                    *slot = help;
                }
                cli
            }
            RepoError::NetworkFailure { .. } | RepoError::InvalidUrl { .. } => {
                CliError::Network { message, help }
            }
            RepoError::PartialBatchFailure {
                succeeded,
                skipped,
                failed,
            } => CliError::Batch {
                succeeded,
                skipped,
                failed,
            },
            _ => CliError::Pack { message, help },
        }
    }
}

impl From<SyncError> for CliError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Core(core) => CliError::from(core),
            SyncError::InvalidMcpConfig { .. } => CliError::Sync {
                message: err.to_string(),
                help: Some("fix or remove the file; it is never overwritten while invalid".to_string()),
            },
            SyncError::UnsafeRulePath { .. } => CliError::Sync {
                message: err.to_string(),
                help: None,
            },
            SyncError::DuplicateRuleFile { .. } => CliError::Sync {
                message: err.to_string(),
                help: Some("enable only one of the two packages, or rename a rule file".to_string()),
            },
            SyncError::InvalidIdeName { .. } => CliError::Validation {
                message: err.to_string(),
                help: Some("check the `ides` list in .idepack/project.yaml".to_string()),
            },
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
