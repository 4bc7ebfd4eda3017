//! Member roster types.
//!
//! This module provides the records stored in the two backing tables:
//! - [`MemberProfile`]: one row of the `members` table
//! - [`SocialIdentity`]: one row of the `line_profiles` table
//! - [`MemberStatus`]: the ordered membership rank
//! - [`GroupTag`]: a `category-name` pair from the groups cell

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Membership rank, ordered from most to least senior.
///
/// The discriminant is the rank used for sorting the roster; the sheet stores
/// the Chinese label returned by [`MemberStatus::as_sheet_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    /// Guild leader (公會長).
    Leader = 1,
    /// Vice leader (副會長).
    ViceLeader = 2,
    /// Regular member (會員).
    Member = 3,
    /// Former member who left the guild (離會會員).
    Departed = 4,
}

impl MemberStatus {
    /// All statuses in rank order.
    pub const ALL: [MemberStatus; 4] = [
        MemberStatus::Leader,
        MemberStatus::ViceLeader,
        MemberStatus::Member,
        MemberStatus::Departed,
    ];

    /// Returns the numeric rank (1 = leader).
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Returns the label stored in the status column.
    pub fn as_sheet_str(self) -> &'static str {
        match self {
            Self::Leader => "公會長",
            Self::ViceLeader => "副會長",
            Self::Member => "會員",
            Self::Departed => "離會會員",
        }
    }

    /// Returns the English name accepted on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Leader => "leader",
            Self::ViceLeader => "vice-leader",
            Self::Member => "member",
            Self::Departed => "departed",
        }
    }

    /// Returns true for statuses at or above member rank.
    pub fn is_active(self) -> bool {
        self <= Self::Member
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_sheet_str())
    }
}

/// Error returned when a status label is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown member status: {0:?}")]
pub struct ParseStatusError(pub String);

impl FromStr for MemberStatus {
    type Err = ParseStatusError;

    /// Parses either the sheet label or the English name (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| {
                status.as_sheet_str() == trimmed || status.as_str().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

/// A group membership tag, stored as `category-name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTag {
    pub category: String,
    pub name: String,
}

impl GroupTag {
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
        }
    }

    /// Parses the comma separated groups cell.
    ///
    /// Empty entries are dropped. Each entry is split on its first `-`; an
    /// entry without a dash becomes a tag with an empty name.
    pub fn parse_list(cell: &str) -> Vec<GroupTag> {
        cell.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| match entry.split_once('-') {
                Some((category, name)) => GroupTag::new(category, name),
                None => GroupTag::new(entry, ""),
            })
            .collect()
    }

    /// Formats tags back into the groups cell representation.
    pub fn format_list(tags: &[GroupTag]) -> String {
        tags.iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for GroupTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.category)
        } else {
            write!(f, "{}-{}", self.category, self.name)
        }
    }
}

/// A member of the guild, as loaded from the `members` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberProfile {
    pub char_name: String,
    pub display_name: String,
    pub status: MemberStatus,
    /// Name of the member responsible for this one.
    pub manager: String,
    /// Linked social-login identity.
    pub social_id: String,
    pub picture_url: String,
    pub avatar_url: String,
    pub job: String,
    pub level: Option<u32>,
    pub union_level: Option<u32>,
    #[serde(default)]
    pub groups: Vec<GroupTag>,
    #[serde(default)]
    pub mood_phrase: String,
    #[serde(default)]
    pub first_created: String,
    #[serde(default)]
    pub last_updated: String,
    /// 1-based sheet row at the time of the last refresh.
    ///
    /// Only meaningful for the snapshot that produced it.
    #[serde(default)]
    pub row_num: u32,
}

impl MemberProfile {
    /// Creates a profile with the identifying fields set and everything else empty.
    pub fn new(
        char_name: impl Into<String>,
        display_name: impl Into<String>,
        status: MemberStatus,
        social_id: impl Into<String>,
    ) -> Self {
        Self {
            char_name: char_name.into(),
            display_name: display_name.into(),
            status,
            manager: String::new(),
            social_id: social_id.into(),
            picture_url: String::new(),
            avatar_url: String::new(),
            job: String::new(),
            level: None,
            union_level: None,
            groups: Vec::new(),
            mood_phrase: String::new(),
            first_created: String::new(),
            last_updated: String::new(),
            row_num: 0,
        }
    }

    /// Builder method to set the manager.
    pub fn with_manager(mut self, manager: impl Into<String>) -> Self {
        self.manager = manager.into();
        self
    }

    /// Builder method to set the picture URL.
    pub fn with_picture_url(mut self, url: impl Into<String>) -> Self {
        self.picture_url = url.into();
        self
    }

    /// Builder method to apply character stats. Unset fields are kept.
    pub fn with_stats(mut self, stats: CharacterStats) -> Self {
        if let Some(avatar_url) = stats.avatar_url {
            self.avatar_url = avatar_url;
        }
        if let Some(job) = stats.job {
            self.job = job;
        }
        if stats.level.is_some() {
            self.level = stats.level;
        }
        if stats.union_level.is_some() {
            self.union_level = stats.union_level;
        }
        self
    }

    /// Returns the character stats portion of the profile.
    pub fn stats(&self) -> CharacterStats {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        CharacterStats {
            avatar_url: non_empty(&self.avatar_url),
            job: non_empty(&self.job),
            level: self.level,
            union_level: self.union_level,
        }
    }
}

/// In-game character data, updated independently of the social profile.
///
/// `None` fields are left untouched when written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterStats {
    pub avatar_url: Option<String>,
    pub job: Option<String>,
    pub level: Option<u32>,
    pub union_level: Option<u32>,
}

impl CharacterStats {
    pub fn is_empty(&self) -> bool {
        self.avatar_url.is_none()
            && self.job.is_none()
            && self.level.is_none()
            && self.union_level.is_none()
    }
}

/// A social-login account, as stored in the `line_profiles` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialIdentity {
    pub social_id: String,
    pub display_name: String,
    pub picture_url: String,
    /// Session token issued by the login provider, stored encoded.
    pub encoded_token: String,
    #[serde(default)]
    pub first_created: String,
    #[serde(default)]
    pub last_updated: String,
    pub fail_count: Option<u32>,
}

impl SocialIdentity {
    pub fn new(
        social_id: impl Into<String>,
        display_name: impl Into<String>,
        picture_url: impl Into<String>,
    ) -> Self {
        Self {
            social_id: social_id.into(),
            display_name: display_name.into(),
            picture_url: picture_url.into(),
            ..Default::default()
        }
    }

    /// Builder method to set the encoded session token.
    pub fn with_encoded_token(mut self, token: impl Into<String>) -> Self {
        self.encoded_token = token.into();
        self
    }

    /// Builder method to set the failure counter.
    pub fn with_fail_count(mut self, count: u32) -> Self {
        self.fail_count = Some(count);
        self
    }
}

/// Parses a leading unsigned integer, ignoring surrounding whitespace and
/// any trailing text (`"235 (reboot)"` parses as 235).
///
/// Returns `None` for empty cells or cells that do not start with a digit.
pub fn parse_leading_int(cell: &str) -> Option<u32> {
    let trimmed = cell.trim_start();
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_ordering_follows_rank() {
        assert!(MemberStatus::Leader < MemberStatus::ViceLeader);
        assert!(MemberStatus::ViceLeader < MemberStatus::Member);
        assert!(MemberStatus::Member < MemberStatus::Departed);
        assert_eq!(MemberStatus::Leader.rank(), 1);
        assert_eq!(MemberStatus::Departed.rank(), 4);
    }

    #[test]
    fn status_active() {
        assert!(MemberStatus::Leader.is_active());
        assert!(MemberStatus::ViceLeader.is_active());
        assert!(MemberStatus::Member.is_active());
        assert!(!MemberStatus::Departed.is_active());
    }

    #[test]
    fn status_parses_sheet_labels() {
        assert_eq!("公會長".parse::<MemberStatus>(), Ok(MemberStatus::Leader));
        assert_eq!("副會長".parse::<MemberStatus>(), Ok(MemberStatus::ViceLeader));
        assert_eq!(" 會員 ".parse::<MemberStatus>(), Ok(MemberStatus::Member));
        assert_eq!("離會會員".parse::<MemberStatus>(), Ok(MemberStatus::Departed));
    }

    #[test]
    fn status_parses_english_names() {
        assert_eq!("Leader".parse::<MemberStatus>(), Ok(MemberStatus::Leader));
        assert_eq!("vice-leader".parse::<MemberStatus>(), Ok(MemberStatus::ViceLeader));
        assert_eq!("DEPARTED".parse::<MemberStatus>(), Ok(MemberStatus::Departed));
    }

    #[test]
    fn status_rejects_unknown() {
        let err = "guest".parse::<MemberStatus>().unwrap_err();
        assert_eq!(err, ParseStatusError("guest".to_string()));
        assert!("".parse::<MemberStatus>().is_err());
    }

    #[test]
    fn status_display_is_sheet_label() {
        assert_eq!(MemberStatus::Member.to_string(), "會員");
    }

    #[test]
    fn group_list_parsing() {
        let tags = GroupTag::parse_list("boss-chaos,,party-A, solo ");
        assert_eq!(
            tags,
            vec![
                GroupTag::new("boss", "chaos"),
                GroupTag::new("party", "A"),
                GroupTag::new("solo", ""),
            ]
        );
        assert!(GroupTag::parse_list("").is_empty());
    }

    #[test]
    fn group_split_on_first_dash() {
        let tags = GroupTag::parse_list("boss-hard-mode");
        assert_eq!(tags, vec![GroupTag::new("boss", "hard-mode")]);
    }

    #[test]
    fn group_list_formatting() {
        let tags = vec![GroupTag::new("boss", "chaos"), GroupTag::new("solo", "")];
        assert_eq!(GroupTag::format_list(&tags), "boss-chaos,solo");
    }

    #[test]
    fn leading_int_parsing() {
        assert_eq!(parse_leading_int("235"), Some(235));
        assert_eq!(parse_leading_int(" 42 "), Some(42));
        assert_eq!(parse_leading_int("235 (reboot)"), Some(235));
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("n/a"), None);
    }

    #[test]
    fn profile_builder() {
        let stats = CharacterStats {
            avatar_url: Some("https://example.com/a.png".to_string()),
            job: Some("Bishop".to_string()),
            level: Some(250),
            union_level: Some(8000),
        };
        let profile = MemberProfile::new("Aria", "aria_line", MemberStatus::Member, "U123")
            .with_manager("Bea")
            .with_picture_url("https://example.com/p.png")
            .with_stats(stats.clone());

        assert_eq!(profile.manager, "Bea");
        assert_eq!(profile.stats(), stats);
        assert_eq!(profile.row_num, 0);
        assert!(profile.groups.is_empty());
    }

    #[test]
    fn partial_stats_keep_existing_fields() {
        let profile = MemberProfile::new("Aria", "aria", MemberStatus::Member, "U1")
            .with_stats(CharacterStats {
                job: Some("Bishop".to_string()),
                level: Some(200),
                ..Default::default()
            })
            .with_stats(CharacterStats {
                level: Some(201),
                ..Default::default()
            });
        assert_eq!(profile.job, "Bishop");
        assert_eq!(profile.level, Some(201));
        assert_eq!(profile.stats().avatar_url, None);
        assert!(CharacterStats::default().is_empty());
    }

    #[test]
    fn profile_serializes_status_in_snake_case() {
        let profile = MemberProfile::new("Aria", "aria", MemberStatus::ViceLeader, "U1");
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["status"], "vice_leader");
    }
}
