//! Column layout of the two backing tables.
//!
//! Row 1 of each table is a header row; data starts at
//! [`DEFAULT_FIRST_DATA_ROW`]. All reads, appends and partial updates address
//! columns through the constants below.
//!
//! # Usage
//!
//! ```ignore
//! use guildsheet_core::schema::members;
//!
//! let profile = members::parse_row(&row, 7)?;
//! let patch = RowPatch::new().set(members::MOOD_PHRASE, "afk");
//! ```

use crate::member::MemberProfile;

/// First 1-based row holding data, below the header.
pub const DEFAULT_FIRST_DATA_ROW: u32 = 2;

fn cell(row: &[String], column: crate::range::Column) -> &str {
    row.get(column.index()).map(String::as_str).unwrap_or("")
}

/// Column mappings for the `members` table.
///
/// | Col | Field          |
/// |-----|----------------|
/// | A   | char_name      |
/// | B   | display_name   |
/// | C   | status         |
/// | D   | manager        |
/// | E   | social_id      |
/// | F   | picture_url    |
/// | G   | avatar_url     |
/// | H   | job            |
/// | I   | level          |
/// | J   | union_level    |
/// | K   | groups         |
/// | L   | mood_phrase    |
/// | M   | first_created  |
/// | N   | last_updated   |
pub mod members {
    use super::{MemberProfile, cell};
    use crate::cell::CellValue;
    use crate::member::{GroupTag, MemberStatus, ParseStatusError, parse_leading_int};
    use crate::range::Column;

    pub const CHAR_NAME: Column = Column(0);
    pub const DISPLAY_NAME: Column = Column(1);
    pub const STATUS: Column = Column(2);
    pub const MANAGER: Column = Column(3);
    pub const SOCIAL_ID: Column = Column(4);
    pub const PICTURE_URL: Column = Column(5);
    pub const AVATAR_URL: Column = Column(6);
    pub const JOB: Column = Column(7);
    pub const LEVEL: Column = Column(8);
    pub const UNION_LEVEL: Column = Column(9);
    pub const GROUPS: Column = Column(10);
    pub const MOOD_PHRASE: Column = Column(11);
    pub const FIRST_CREATED: Column = Column(12);
    pub const LAST_UPDATED: Column = Column(13);

    pub const WIDTH: usize = 14;
    pub const DEFAULT_SHEET_NAME: &str = "members";

    /// Decodes one data row. Missing trailing cells read as empty.
    ///
    /// # Errors
    ///
    /// Fails when the status cell is not a known status label.
    pub fn parse_row(row: &[String], row_num: u32) -> Result<MemberProfile, ParseStatusError> {
        let status: MemberStatus = cell(row, STATUS).parse()?;
        Ok(MemberProfile {
            char_name: cell(row, CHAR_NAME).to_string(),
            display_name: cell(row, DISPLAY_NAME).to_string(),
            status,
            manager: cell(row, MANAGER).to_string(),
            social_id: cell(row, SOCIAL_ID).to_string(),
            picture_url: cell(row, PICTURE_URL).to_string(),
            avatar_url: cell(row, AVATAR_URL).to_string(),
            job: cell(row, JOB).to_string(),
            level: parse_leading_int(cell(row, LEVEL)),
            union_level: parse_leading_int(cell(row, UNION_LEVEL)),
            groups: GroupTag::parse_list(cell(row, GROUPS)),
            mood_phrase: cell(row, MOOD_PHRASE).to_string(),
            first_created: cell(row, FIRST_CREATED).to_string(),
            last_updated: cell(row, LAST_UPDATED).to_string(),
            row_num,
        })
    }

    /// Encodes a new member for append. Groups and mood phrase are left blank.
    pub fn new_row(profile: &MemberProfile, timestamp: &str) -> Vec<CellValue> {
        vec![
            CellValue::from(&profile.char_name),
            CellValue::from(&profile.display_name),
            CellValue::from(profile.status.as_sheet_str()),
            CellValue::from(&profile.manager),
            CellValue::from(&profile.social_id),
            CellValue::from(&profile.picture_url),
            CellValue::from(&profile.avatar_url),
            CellValue::from(&profile.job),
            CellValue::from(profile.level),
            CellValue::from(profile.union_level),
            CellValue::Empty,
            CellValue::Empty,
            CellValue::from(timestamp),
            CellValue::from(timestamp),
        ]
    }
}

/// Column mappings for the `line_profiles` table.
///
/// | Col | Field          |
/// |-----|----------------|
/// | A   | social_id      |
/// | B   | display_name   |
/// | C   | picture_url    |
/// | D   | encoded_token  |
/// | E   | first_created  |
/// | F   | last_updated   |
/// | G   | fail_count     |
pub mod line_profiles {
    use super::cell;
    use crate::cell::CellValue;
    use crate::member::{SocialIdentity, parse_leading_int};
    use crate::range::Column;

    pub const SOCIAL_ID: Column = Column(0);
    pub const DISPLAY_NAME: Column = Column(1);
    pub const PICTURE_URL: Column = Column(2);
    pub const ENCODED_TOKEN: Column = Column(3);
    pub const FIRST_CREATED: Column = Column(4);
    pub const LAST_UPDATED: Column = Column(5);
    pub const FAIL_COUNT: Column = Column(6);

    pub const WIDTH: usize = 7;
    pub const DEFAULT_SHEET_NAME: &str = "line_profiles";

    /// Decodes one data row. Missing trailing cells read as empty.
    pub fn parse_row(row: &[String]) -> SocialIdentity {
        SocialIdentity {
            social_id: cell(row, SOCIAL_ID).to_string(),
            display_name: cell(row, DISPLAY_NAME).to_string(),
            picture_url: cell(row, PICTURE_URL).to_string(),
            encoded_token: cell(row, ENCODED_TOKEN).to_string(),
            first_created: cell(row, FIRST_CREATED).to_string(),
            last_updated: cell(row, LAST_UPDATED).to_string(),
            fail_count: parse_leading_int(cell(row, FAIL_COUNT)),
        }
    }

    /// Encodes a new identity for append. The failure counter is left blank.
    pub fn new_row(identity: &SocialIdentity, timestamp: &str) -> Vec<CellValue> {
        vec![
            CellValue::from(&identity.social_id),
            CellValue::from(&identity.display_name),
            CellValue::from(&identity.picture_url),
            CellValue::from(&identity.encoded_token),
            CellValue::from(timestamp),
            CellValue::from(timestamp),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellValue;
    use crate::member::{GroupTag, MemberStatus, SocialIdentity};

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn member_row_full() {
        let cells = row(&[
            "Aria",
            "aria_line",
            "副會長",
            "Bea",
            "U123",
            "https://p/1",
            "https://a/1",
            "Bishop",
            "250",
            "8000",
            "boss-chaos,party-A",
            "gg",
            "2024/01/01 00:00:00",
            "2024/02/01 00:00:00",
        ]);
        let profile = members::parse_row(&cells, 5).unwrap();
        assert_eq!(profile.char_name, "Aria");
        assert_eq!(profile.status, MemberStatus::ViceLeader);
        assert_eq!(profile.manager, "Bea");
        assert_eq!(profile.social_id, "U123");
        assert_eq!(profile.level, Some(250));
        assert_eq!(profile.union_level, Some(8000));
        assert_eq!(
            profile.groups,
            vec![GroupTag::new("boss", "chaos"), GroupTag::new("party", "A")]
        );
        assert_eq!(profile.mood_phrase, "gg");
        assert_eq!(profile.last_updated, "2024/02/01 00:00:00");
        assert_eq!(profile.row_num, 5);
    }

    #[test]
    fn member_row_short_is_padded() {
        let profile = members::parse_row(&row(&["Aria", "aria", "會員", "", "U1"]), 2).unwrap();
        assert_eq!(profile.social_id, "U1");
        assert_eq!(profile.picture_url, "");
        assert_eq!(profile.level, None);
        assert!(profile.groups.is_empty());
        assert_eq!(profile.last_updated, "");
    }

    #[test]
    fn member_row_unknown_status() {
        assert!(members::parse_row(&row(&["Aria", "aria", "訪客"]), 2).is_err());
        assert!(members::parse_row(&[], 2).is_err());
    }

    #[test]
    fn member_new_row_layout() {
        let mut profile = MemberProfile::new("Aria", "aria", MemberStatus::Member, "U1")
            .with_manager("Bea")
            .with_picture_url("https://p/1");
        profile.job = "Bishop".to_string();
        profile.level = Some(200);

        let cells = members::new_row(&profile, "2024/03/09 07:05:00");
        assert_eq!(cells.len(), members::WIDTH);
        assert_eq!(cells[members::STATUS.index()], CellValue::from("會員"));
        assert_eq!(cells[members::LEVEL.index()], CellValue::Number(200));
        assert_eq!(cells[members::UNION_LEVEL.index()], CellValue::Empty);
        assert_eq!(cells[members::GROUPS.index()], CellValue::Empty);
        assert_eq!(cells[members::MOOD_PHRASE.index()], CellValue::Empty);
        assert_eq!(
            cells[members::FIRST_CREATED.index()],
            cells[members::LAST_UPDATED.index()]
        );
    }

    #[test]
    fn identity_row_roundtrip_fields() {
        let identity = line_profiles::parse_row(&row(&[
            "U1",
            "aria",
            "https://p/1",
            "tok",
            "2024/01/01 00:00:00",
            "2024/01/02 00:00:00",
            "3",
        ]));
        assert_eq!(identity.social_id, "U1");
        assert_eq!(identity.encoded_token, "tok");
        assert_eq!(identity.fail_count, Some(3));

        let short = line_profiles::parse_row(&row(&["U2"]));
        assert_eq!(short.display_name, "");
        assert_eq!(short.fail_count, None);
    }

    #[test]
    fn identity_new_row_layout() {
        let identity = SocialIdentity::new("U1", "aria", "https://p/1").with_encoded_token("tok");
        let cells = line_profiles::new_row(&identity, "2024/03/09 07:05:00");
        insta::assert_json_snapshot!(cells, @r###"
        [
          "U1",
          "aria",
          "https://p/1",
          "tok",
          "2024/03/09 07:05:00",
          "2024/03/09 07:05:00"
        ]
        "###);
    }
}
