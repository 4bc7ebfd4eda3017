//! In-memory backends for the roster tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

use guildsheet_core::{CellValue, RangeUpdate, SheetRange};
use guildsheet_sheets::{
    AccessToken, BoxFuture, CredentialStore, Rows, SheetError, SheetGateway, SheetResult,
};

/// A 14-column member row with the given name, status label and social id.
pub fn member_row<'a>(char_name: &'a str, status: &'a str, social_id: &'a str) -> Vec<&'a str> {
    vec![
        char_name, "", status, "", social_id, "", "", "", "", "", "", "", "", "",
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Read(String),
    Append { range: String, values: Vec<CellValue> },
    Batch(Vec<RangeUpdate>),
}

/// Stores tables by sheet name and records every call.
///
/// Appends push a row onto the named table; batch updates overwrite the
/// addressed cells, skipping [`CellValue::Empty`].
#[derive(Debug, Default)]
pub struct FakeGateway {
    tables: Mutex<HashMap<String, Rows>>,
    calls: Mutex<Vec<GatewayCall>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, sheet: &str, rows: Rows) -> Self {
        self.set_table(sheet, rows);
        self
    }

    pub fn set_table(&self, sheet: &str, rows: Rows) {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(sheet.to_string(), rows);
    }

    pub fn table(&self, sheet: &str) -> Rows {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(sheet)
            .cloned()
            .unwrap_or_default()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear_calls(&self) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn count(&self, pred: impl Fn(&GatewayCall) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(*c)).count()
    }

    pub fn reads(&self) -> usize {
        self.count(|c| matches!(c, GatewayCall::Read(_)))
    }

    pub fn writes(&self) -> usize {
        self.count(|c| !matches!(c, GatewayCall::Read(_)))
    }

    fn record(&self, call: GatewayCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    fn apply(&self, update: &RangeUpdate) {
        let Some((sheet, row, first_col)) = split_range(update.range.as_str()) else {
            return;
        };
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let rows = tables.entry(sheet).or_default();
        let index = row.saturating_sub(2) as usize;
        if rows.len() <= index {
            rows.resize(index + 1, Vec::new());
        }
        let target = &mut rows[index];
        for (offset, value) in update.values.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let col = first_col + offset;
            if target.len() <= col {
                target.resize(col + 1, String::new());
            }
            target[col] = cell_text(value);
        }
    }
}

fn cell_text(value: &CellValue) -> String {
    match value {
        CellValue::Empty => String::new(),
        CellValue::Text(s) => s.clone(),
        CellValue::Number(n) => n.to_string(),
    }
}

fn sheet_name(range: &str) -> String {
    let sheet = range.split('!').next().unwrap_or(range);
    sheet.trim_matches('\'').replace("''", "'")
}

/// `members!B7:F7` → (`members`, 7, 1). Assumes data starts on row 2.
fn split_range(range: &str) -> Option<(String, u32, usize)> {
    let (_, cells) = range.rsplit_once('!')?;
    let start = cells.split(':').next()?;
    let digits = start.find(|c: char| c.is_ascii_digit())?;
    let (letters, row) = start.split_at(digits);
    let col = letters
        .bytes()
        .fold(0usize, |acc, b| acc * 26 + usize::from(b - b'A' + 1))
        .checked_sub(1)?;
    Some((sheet_name(range), row.parse().ok()?, col))
}

impl SheetGateway for FakeGateway {
    fn read_range<'a>(&'a self, range: &'a SheetRange) -> BoxFuture<'a, SheetResult<Rows>> {
        Box::pin(async move {
            self.record(GatewayCall::Read(range.to_string()));
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(SheetError::network("connection reset"));
            }
            Ok(self.table(&sheet_name(range.as_str())))
        })
    }

    fn append_row<'a>(
        &'a self,
        _token: &'a AccessToken,
        range: &'a SheetRange,
        values: Vec<CellValue>,
    ) -> BoxFuture<'a, SheetResult<()>> {
        Box::pin(async move {
            self.record(GatewayCall::Append {
                range: range.to_string(),
                values: values.clone(),
            });
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(SheetError::server("values.append failed (503)"));
            }
            let row = values.iter().map(cell_text).collect();
            self.tables
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(sheet_name(range.as_str()))
                .or_default()
                .push(row);
            Ok(())
        })
    }

    fn batch_update<'a>(
        &'a self,
        _token: &'a AccessToken,
        updates: Vec<RangeUpdate>,
    ) -> BoxFuture<'a, SheetResult<()>> {
        Box::pin(async move {
            self.record(GatewayCall::Batch(updates.clone()));
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(SheetError::bad_request("values.batchUpdate failed (400)")
                    .with_details(["Invalid data[0]: range is protected"]));
            }
            for update in &updates {
                self.apply(update);
            }
            Ok(())
        })
    }
}

/// Hands out a fixed token, or fails when told to.
#[derive(Debug, Default)]
pub struct FakeCredentials {
    fail: AtomicBool,
    requests: AtomicU32,
}

impl FakeCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let creds = Self::default();
        creds.fail.store(true, Ordering::SeqCst);
        creds
    }

    pub fn requests(&self) -> u32 {
        self.requests.load(Ordering::SeqCst)
    }
}

impl CredentialStore for FakeCredentials {
    fn access_token(&self) -> BoxFuture<'_, SheetResult<AccessToken>> {
        Box::pin(async move {
            self.requests.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(SheetError::authentication("refresh token revoked"));
            }
            Ok(AccessToken::new("test-token"))
        })
    }

    fn exchange_code<'a>(&'a self, _code: &'a str) -> BoxFuture<'a, SheetResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn authorization_url(&self, state: &str) -> String {
        format!("https://accounts.example.test/consent?state={state}")
    }

    fn is_authorized(&self) -> bool {
        !self.fail.load(Ordering::SeqCst)
    }
}

#[test]
fn split_range_parses_a1() {
    assert_eq!(split_range("members!B7:F7"), Some(("members".to_string(), 7, 1)));
    assert_eq!(split_range("members!N7"), Some(("members".to_string(), 7, 13)));
    assert_eq!(
        split_range("'roster 2024'!A3:G3"),
        Some(("roster 2024".to_string(), 3, 0))
    );
}
