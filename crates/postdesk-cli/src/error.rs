//! CLI-level error type and exit-code mapping.

use std::fmt::{self, Display, Formatter};

use anyhow::anyhow;

use crate::client::ApiError;
use crate::controller::ActionError;
use crate::session::SessionError;

/// Distinguishes faults caused by user input from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.display_message())
    }
}

impl std::error::Error for CliError {}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        if err.is_validation() {
            Self::Validation(err.to_string())
        } else if err.is_unauthorized() {
            Self::Failure(anyhow!("{err} (run `postdesk login` first)"))
        } else {
            Self::Failure(err.into())
        }
    }
}

impl From<ActionError> for CliError {
    fn from(err: ActionError) -> Self {
        match err {
            ActionError::Api(api) => api.into(),
            other if other.is_validation() => Self::Validation(other.to_string()),
            other => Self::Failure(other.into()),
        }
    }
}

impl From<SessionError> for CliError {
    fn from(err: SessionError) -> Self {
        Self::Failure(err.into())
    }
}
