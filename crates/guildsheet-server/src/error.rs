//! Roster error types.

use std::fmt;

use guildsheet_sheets::SheetError;
use serde::Serialize;
use thiserror::Error;

pub type RosterResult<T> = Result<T, RosterError>;

/// Stable error codes reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RosterErrorCode {
    #[serde(rename = "ERR_ACCESS_TOKEN_FAIL")]
    AccessTokenFail,
    #[serde(rename = "ERR_MEMBER_ALREADY_EXIST")]
    MemberAlreadyExist,
    #[serde(rename = "ERR_APPEND_VALUES")]
    AppendValues,
    #[serde(rename = "ERR_UPDATE_VALUES")]
    UpdateValues,
    #[serde(rename = "ERR_LOAD_MEMBERS_DATA")]
    LoadMembersData,
    #[serde(rename = "ERR_MISSING_SOCIAL_ID")]
    MissingSocialId,
    #[serde(rename = "ERR_CONFIG")]
    Config,
}

impl RosterErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessTokenFail => "ERR_ACCESS_TOKEN_FAIL",
            Self::MemberAlreadyExist => "ERR_MEMBER_ALREADY_EXIST",
            Self::AppendValues => "ERR_APPEND_VALUES",
            Self::UpdateValues => "ERR_UPDATE_VALUES",
            Self::LoadMembersData => "ERR_LOAD_MEMBERS_DATA",
            Self::MissingSocialId => "ERR_MISSING_SOCIAL_ID",
            Self::Config => "ERR_CONFIG",
        }
    }
}

impl fmt::Display for RosterErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum RosterError {
    /// No usable write token.
    #[error("could not obtain an access token: {0}")]
    AccessToken(#[source] SheetError),

    #[error("a member linked to {social_id} already exists")]
    MemberAlreadyExists { social_id: String },

    #[error("failed to append to {sheet}: {source}")]
    AppendFailed {
        sheet: String,
        #[source]
        source: SheetError,
    },

    #[error("failed to update row {row_num}: {source}")]
    UpdateFailed {
        row_num: u32,
        #[source]
        source: SheetError,
    },

    /// Only surfaced by explicit loads; scheduled refreshes swallow it.
    #[error("failed to load members: {0}")]
    LoadMembers(#[source] SheetError),

    #[error("a member needs a non-empty social id")]
    MissingSocialId,

    #[error("invalid roster configuration: {message}")]
    Config { message: String },
}

impl RosterError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn code(&self) -> RosterErrorCode {
        match self {
            Self::AccessToken(_) => RosterErrorCode::AccessTokenFail,
            Self::MemberAlreadyExists { .. } => RosterErrorCode::MemberAlreadyExist,
            Self::AppendFailed { .. } => RosterErrorCode::AppendValues,
            Self::UpdateFailed { .. } => RosterErrorCode::UpdateValues,
            Self::LoadMembers(_) => RosterErrorCode::LoadMembersData,
            Self::MissingSocialId => RosterErrorCode::MissingSocialId,
            Self::Config { .. } => RosterErrorCode::Config,
        }
    }

    /// Backend-supplied messages, e.g. which cell a batch update rejected.
    pub fn details(&self) -> &[String] {
        match self {
            Self::AccessToken(source)
            | Self::AppendFailed { source, .. }
            | Self::UpdateFailed { source, .. }
            | Self::LoadMembers(source) => source.details(),
            Self::MemberAlreadyExists { .. } | Self::MissingSocialId | Self::Config { .. } => &[],
        }
    }

    /// The backend error behind this failure, if any.
    pub fn sheet_error(&self) -> Option<&SheetError> {
        match self {
            Self::AccessToken(source)
            | Self::AppendFailed { source, .. }
            | Self::UpdateFailed { source, .. }
            | Self::LoadMembers(source) => Some(source),
            Self::MemberAlreadyExists { .. } | Self::MissingSocialId | Self::Config { .. } => None,
        }
    }
}
