use std::{
    error::Error,
    fmt::{Display, Formatter},
};

use teloxide::RequestError;

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { var: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(var: &'static str, reason: impl Display) -> Self {
        ConfigError::Invalid {
            var,
            reason: reason.to_string(),
        }
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use ConfigError::*;
        match self {
            Missing(var) => write!(f, "missing required environment variable {var}"),
            Invalid { var, reason } => write!(f, "invalid environment variable {var}: {reason}"),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug)]
pub enum ListenerError {
    IdParse(String),
    UrlParse(url::ParseError),
    Webhook(RequestError),
}

impl Display for ListenerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use ListenerError::*;
        match self {
            IdParse(token) => {
                write!(f, "failed to parse bot id in token: {token}")
            }
            UrlParse(e) => write!(f, "webhook url error: {e}"),
            Webhook(e) => write!(f, "webhook setup error: {e}"),
        }
    }
}

impl Error for ListenerError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformErrorKind {
    Network,
    Api,
    RateLimited,
    Other,
}

impl PlatformErrorKind {
    /// Failures that usually go away on their own.
    pub fn is_transient(self) -> bool {
        matches!(self, PlatformErrorKind::Network | PlatformErrorKind::RateLimited)
    }
}

/// Failure of a call to the messaging platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformError {
    pub kind: PlatformErrorKind,
    message: String,
}

impl PlatformError {
    pub fn new(kind: PlatformErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<RequestError> for PlatformError {
    fn from(error: RequestError) -> Self {
        let kind = match &error {
            RequestError::Api(_) | RequestError::MigrateToChatId(_) => PlatformErrorKind::Api,
            RequestError::RetryAfter(_) => PlatformErrorKind::RateLimited,
            RequestError::Network(_) | RequestError::Io(_) => PlatformErrorKind::Network,
            _ => PlatformErrorKind::Other,
        };
        PlatformError::new(kind, error.to_string())
    }
}

impl Display for PlatformError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} error: {}", self.kind, self.message)
    }
}

impl Error for PlatformError {}
