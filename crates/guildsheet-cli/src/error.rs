//! Command line error types.

use std::fmt;

use guildsheet_server::RosterError;
use guildsheet_sheets::SheetError;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub enum CliError {
    Config(String),
    /// Backend failure outside the roster operations (auth, setup).
    Sheets(SheetError),
    Roster(RosterError),
    /// The command needs a token that is not stored yet.
    AuthRequired(String),
    NotFound(String),
    Io(std::io::Error),
}

impl CliError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::AuthRequired(_) => 3,
            Self::NotFound(_) => 4,
            Self::Sheets(_) | Self::Roster(_) | Self::Io(_) => 1,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Sheets(err) => write!(f, "{}", err),
            Self::Roster(err) => {
                write!(f, "{}: {}", err.code(), err)?;
                for detail in err.details() {
                    write!(f, "\n  {}", detail)?;
                }
                Ok(())
            }
            Self::AuthRequired(msg) => write!(f, "authorization required: {}", msg),
            Self::NotFound(msg) => write!(f, "not found: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sheets(err) => Some(err),
            Self::Roster(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<SheetError> for CliError {
    fn from(err: SheetError) -> Self {
        if err.code().needs_authorization() {
            Self::AuthRequired(format!("{}; run `guildsheet auth login`", err.message()))
        } else {
            Self::Sheets(err)
        }
    }
}

impl From<RosterError> for CliError {
    fn from(err: RosterError) -> Self {
        if let Some(sheet_err) = err.sheet_error()
            && sheet_err.code().needs_authorization()
        {
            return Self::AuthRequired(format!(
                "{}: {}; run `guildsheet auth login`",
                err.code(),
                sheet_err.message()
            ));
        }
        match err {
            RosterError::Config { message } => Self::Config(message),
            other => Self::Roster(other),
        }
    }
}
