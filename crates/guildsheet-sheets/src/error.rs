//! Errors returned by the spreadsheet backend and its credential store.

use std::fmt;
use thiserror::Error;

/// Classification of a backend failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SheetErrorCode {
    /// Credentials were rejected or the refresh token is no longer valid.
    AuthenticationFailed,
    /// No token has been stored yet; the consent flow must run first.
    NotAuthorized,
    /// The account may not access the spreadsheet (403).
    PermissionDenied,
    /// Connection, DNS or timeout failure.
    NetworkError,
    RateLimited,
    /// 5xx from the API.
    ServerError,
    /// A response body could not be decoded.
    InvalidResponse,
    /// Spreadsheet or sheet tab not found (404).
    NotFound,
    /// The API rejected the request (400), e.g. an invalid range.
    BadRequest,
    /// Missing or invalid local configuration.
    ConfigurationError,
    /// Local failure such as token file I/O.
    InternalError,
}

impl SheetErrorCode {
    /// True for failures that need the user to re-run the consent flow.
    pub fn needs_authorization(&self) -> bool {
        matches!(self, Self::AuthenticationFailed | Self::NotAuthorized)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::NotAuthorized => "not_authorized",
            Self::PermissionDenied => "permission_denied",
            Self::NetworkError => "network_error",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::NotFound => "not_found",
            Self::BadRequest => "bad_request",
            Self::ConfigurationError => "configuration_error",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for SheetErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A backend failure with an optional list of API-supplied details.
#[derive(Debug, Error)]
pub struct SheetError {
    code: SheetErrorCode,
    message: String,
    /// Entries from the API error body (`error.errors[].message`).
    details: Vec<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SheetError {
    pub fn new(code: SheetErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: Vec::new(),
            source: None,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(SheetErrorCode::AuthenticationFailed, message)
    }

    pub fn not_authorized(message: impl Into<String>) -> Self {
        Self::new(SheetErrorCode::NotAuthorized, message)
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(SheetErrorCode::PermissionDenied, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(SheetErrorCode::NetworkError, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(SheetErrorCode::RateLimited, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(SheetErrorCode::ServerError, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(SheetErrorCode::InvalidResponse, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(SheetErrorCode::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(SheetErrorCode::BadRequest, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(SheetErrorCode::ConfigurationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(SheetErrorCode::InternalError, message)
    }

    /// Attaches API-supplied error details.
    pub fn with_details<I, S>(mut self, details: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.details.extend(details.into_iter().map(Into::into));
        self
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> SheetErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> &[String] {
        &self.details
    }
}

impl fmt::Display for SheetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if !self.details.is_empty() {
            write!(f, " ({})", self.details.join("; "))?;
        }
        Ok(())
    }
}

pub type SheetResult<T> = Result<T, SheetError>;
