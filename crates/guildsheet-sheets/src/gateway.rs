//! Backend traits for the roster tables.
//!
//! The roster service talks to storage only through these two traits:
//!
//! - [`CredentialStore`]: hands out write tokens and runs the consent flow
//! - [`SheetGateway`]: reads ranges, appends rows and applies batch writes
//!
//! Both are object safe so the service can hold `Arc<dyn ...>` and tests can
//! swap in in-memory fakes.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use guildsheet_core::{CellValue, RangeUpdate, SheetRange};

use crate::error::SheetResult;

/// A boxed future for object-safe async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Rows returned by a range read, one `Vec` of cell text per row.
///
/// Trailing empty cells are usually omitted by the backend, so rows may be
/// shorter than the table width.
pub type Rows = Vec<Vec<String>>;

/// A bearer token authorizing writes.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Source of write credentials.
pub trait CredentialStore: Send + Sync {
    /// Returns a currently valid token, refreshing it first if it expired.
    ///
    /// # Errors
    ///
    /// Fails when no token is stored or the refresh is rejected.
    fn access_token(&self) -> BoxFuture<'_, SheetResult<AccessToken>>;

    /// Exchanges a consent-flow authorization code and persists the result.
    fn exchange_code<'a>(&'a self, code: &'a str) -> BoxFuture<'a, SheetResult<()>>;

    /// URL the user must visit to grant access. The consent page echoes
    /// `state` back in its redirect.
    fn authorization_url(&self, state: &str) -> String;

    /// True if a token has been stored.
    fn is_authorized(&self) -> bool;
}

/// Read and write access to the backing spreadsheet.
pub trait SheetGateway: Send + Sync {
    /// Reads every row of `range`. A range with no data yields no rows.
    fn read_range<'a>(&'a self, range: &'a SheetRange) -> BoxFuture<'a, SheetResult<Rows>>;

    /// Inserts `values` as a new row after the last data row of the table
    /// anchored at `range`.
    fn append_row<'a>(
        &'a self,
        token: &'a AccessToken,
        range: &'a SheetRange,
        values: Vec<CellValue>,
    ) -> BoxFuture<'a, SheetResult<()>>;

    /// Applies all updates in a single request.
    fn batch_update<'a>(
        &'a self,
        token: &'a AccessToken,
        updates: Vec<RangeUpdate>,
    ) -> BoxFuture<'a, SheetResult<()>>;
}
