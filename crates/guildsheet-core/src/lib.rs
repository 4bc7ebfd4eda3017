//! Core types for the guild roster: member records, sheet layout, cell
//! values, timestamps and logging setup.

pub mod cell;
pub mod member;
pub mod range;
pub mod schema;
pub mod time;
pub mod tracing;

pub use cell::CellValue;
pub use member::{
    CharacterStats, GroupTag, MemberProfile, MemberStatus, ParseStatusError, SocialIdentity,
};
pub use range::{Column, RangeUpdate, RowPatch, SheetRange, column_letter};
pub use schema::DEFAULT_FIRST_DATA_ROW;
pub use time::{Clock, FixedClock, SharedClock, SystemClock, sheet_timestamp, system_clock};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
