//! Storage backend for the guild roster.
//!
//! This crate provides the abstraction layer between the roster service and
//! the spreadsheet holding the `members` and `line_profiles` tables:
//!
//! - [`SheetGateway`]: range reads, row appends and batch writes
//! - [`CredentialStore`]: write tokens and the consent flow
//! - [`SheetError`]: coded backend failures with API details
//!
//! The `google` feature (on by default) provides the Google Sheets v4
//! implementation in [`google`].
//!
//! ```text
//! ┌──────────────────┐      ┌──────────────────────┐
//! │  RosterService   │─────▶│  dyn CredentialStore │──▶ oauth2.googleapis.com
//! └────────┬─────────┘      └──────────────────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │ dyn SheetGateway │──▶ sheets.googleapis.com/v4
//! └──────────────────┘
//! ```

pub mod error;
pub mod gateway;
#[cfg(feature = "google")]
pub mod google;

pub use error::{SheetError, SheetErrorCode, SheetResult};
pub use gateway::{AccessToken, BoxFuture, CredentialStore, Rows, SheetGateway};
