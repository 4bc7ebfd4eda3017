//! Roster table locations and refresh timing.

use std::time::Duration;

use guildsheet_core::SheetRange;
use guildsheet_core::schema::{DEFAULT_FIRST_DATA_ROW, line_profiles, members};

use crate::error::{RosterError, RosterResult};

/// Where the two backing tables live inside the spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterSchema {
    pub members_sheet: String,
    pub profiles_sheet: String,
    /// 1-based row of the first record, below the header.
    pub first_data_row: u32,
}

impl Default for RosterSchema {
    fn default() -> Self {
        Self {
            members_sheet: members::DEFAULT_SHEET_NAME.to_string(),
            profiles_sheet: line_profiles::DEFAULT_SHEET_NAME.to_string(),
            first_data_row: DEFAULT_FIRST_DATA_ROW,
        }
    }
}

impl RosterSchema {
    /// All member rows, e.g. `members!A2:N`.
    pub fn members_range(&self) -> SheetRange {
        SheetRange::table(&self.members_sheet, self.first_data_row, members::WIDTH)
    }

    pub fn members_anchor(&self) -> SheetRange {
        SheetRange::anchor(&self.members_sheet, self.first_data_row)
    }

    /// All identity rows, e.g. `line_profiles!A2:G`.
    pub fn profiles_range(&self) -> SheetRange {
        SheetRange::table(&self.profiles_sheet, self.first_data_row, line_profiles::WIDTH)
    }

    pub fn profiles_anchor(&self) -> SheetRange {
        SheetRange::anchor(&self.profiles_sheet, self.first_data_row)
    }

    pub fn validate(&self) -> RosterResult<()> {
        if self.members_sheet.trim().is_empty() {
            return Err(RosterError::config("members sheet name is empty"));
        }
        if self.profiles_sheet.trim().is_empty() {
            return Err(RosterError::config("profiles sheet name is empty"));
        }
        if self.first_data_row == 0 {
            return Err(RosterError::config("first_data_row is 1-based and must be at least 1"));
        }
        Ok(())
    }
}

/// Cache and scheduler settings.
#[derive(Debug, Clone)]
pub struct RosterConfig {
    pub schema: RosterSchema,
    pub refresh_interval: Duration,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            schema: RosterSchema::default(),
            refresh_interval: Duration::from_secs(Self::DEFAULT_REFRESH_INTERVAL_SECS),
        }
    }
}

impl RosterConfig {
    pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 10;

    pub fn with_schema(mut self, schema: RosterSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn validate(&self) -> RosterResult<()> {
        self.schema.validate()?;
        if self.refresh_interval.is_zero() {
            return Err(RosterError::config("refresh interval must be greater than zero"));
        }
        Ok(())
    }
}
