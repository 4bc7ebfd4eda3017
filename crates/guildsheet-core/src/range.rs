//! A1-notation ranges and partial row writes.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::cell::CellValue;

/// Zero-based column position within a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Column(pub usize);

impl Column {
    pub const fn index(self) -> usize {
        self.0
    }

    /// The A1 column letter(s) for this position.
    pub fn letter(self) -> String {
        column_letter(self.0)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.letter())
    }
}

/// Converts a zero-based column index to spreadsheet letters:
/// 0 is `A`, 25 is `Z`, 26 is `AA`.
pub fn column_letter(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// A range in A1 notation, including the sheet name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SheetRange(String);

impl SheetRange {
    /// Every data row of a table: `members!A2:N`.
    pub fn table(sheet: &str, first_row: u32, width: usize) -> Self {
        let last = Column(width.saturating_sub(1));
        Self(format!(
            "{}!A{}:{}",
            quote_sheet_name(sheet),
            first_row,
            last.letter()
        ))
    }

    /// Append anchor for a table: `members!A2`.
    pub fn anchor(sheet: &str, first_row: u32) -> Self {
        Self(format!("{}!A{}", quote_sheet_name(sheet), first_row))
    }

    /// A single cell: `members!N7`.
    pub fn cell(sheet: &str, row: u32, column: Column) -> Self {
        Self(format!("{}!{}{}", quote_sheet_name(sheet), column, row))
    }

    /// A horizontal run of cells on one row: `members!B7:F7`.
    ///
    /// Collapses to [`SheetRange::cell`] when `first == last`.
    pub fn span(sheet: &str, row: u32, first: Column, last: Column) -> Self {
        if first == last {
            return Self::cell(sheet, row, first);
        }
        Self(format!(
            "{}!{}{}:{}{}",
            quote_sheet_name(sheet),
            first,
            row,
            last,
            row
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SheetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SheetRange {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Sheet names with anything other than letters, digits or `_` must be quoted.
fn quote_sheet_name(name: &str) -> String {
    if !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

/// A set of cells to overwrite on a single row, keyed by column.
///
/// Columns between the first and last set column are sent as
/// [`CellValue::Empty`] so they stay untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowPatch {
    cells: BTreeMap<Column, CellValue>,
}

impl RowPatch {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn set(mut self, column: Column, value: impl Into<CellValue>) -> Self {
        self.cells.insert(column, value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// First and last column touched by this patch.
    pub fn bounds(&self) -> Option<(Column, Column)> {
        let first = *self.cells.keys().next()?;
        let last = *self.cells.keys().next_back()?;
        Some((first, last))
    }

    /// Turns the patch into a write for `row` of `sheet`.
    ///
    /// Returns `None` if no cell was set.
    pub fn into_update(mut self, sheet: &str, row: u32) -> Option<RangeUpdate> {
        let (first, last) = self.bounds()?;
        let values = (first.index()..=last.index())
            .map(|idx| self.cells.remove(&Column(idx)).unwrap_or_default())
            .collect();
        Some(RangeUpdate {
            range: SheetRange::span(sheet, row, first, last),
            values,
        })
    }
}

/// One range of a batch write. Always a single row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeUpdate {
    pub range: SheetRange,
    pub values: Vec<CellValue>,
}

impl RangeUpdate {
    pub fn new(range: SheetRange, values: Vec<CellValue>) -> Self {
        Self { range, values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(13), "N");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(27), "AB");
        assert_eq!(column_letter(701), "ZZ");
        assert_eq!(column_letter(702), "AAA");
    }

    #[test]
    fn range_builders() {
        assert_eq!(SheetRange::table("members", 2, 14).as_str(), "members!A2:N");
        assert_eq!(SheetRange::anchor("members", 2).as_str(), "members!A2");
        assert_eq!(SheetRange::cell("members", 7, Column(13)).as_str(), "members!N7");
        assert_eq!(
            SheetRange::span("members", 7, Column(1), Column(5)).as_str(),
            "members!B7:F7"
        );
        assert_eq!(
            SheetRange::span("members", 7, Column(11), Column(11)).as_str(),
            "members!L7"
        );
    }

    #[test]
    fn sheet_names_are_quoted_when_needed() {
        assert_eq!(SheetRange::anchor("成員", 2).as_str(), "成員!A2");
        assert_eq!(
            SheetRange::anchor("guild members", 2).as_str(),
            "'guild members'!A2"
        );
        assert_eq!(SheetRange::anchor("Bob's", 1).as_str(), "'Bob''s'!A1");
    }

    #[test]
    fn patch_fills_gaps_with_empty() {
        let update = RowPatch::new()
            .set(Column(5), "pic")
            .set(Column(1), "name")
            .into_update("members", 9)
            .unwrap();
        assert_eq!(update.range.as_str(), "members!B9:F9");
        assert_eq!(
            update.values,
            vec![
                CellValue::from("name"),
                CellValue::Empty,
                CellValue::Empty,
                CellValue::Empty,
                CellValue::from("pic"),
            ]
        );
    }

    #[test]
    fn empty_patch_has_no_update() {
        assert!(RowPatch::new().is_empty());
        assert!(RowPatch::new().into_update("members", 2).is_none());
    }

    #[test]
    fn later_set_overrides_earlier() {
        let update = RowPatch::new()
            .set(Column(0), "a")
            .set(Column(0), "b")
            .into_update("s", 3)
            .unwrap();
        assert_eq!(update.range.as_str(), "s!A3");
        assert_eq!(update.values, vec![CellValue::from("b")]);
    }
}
