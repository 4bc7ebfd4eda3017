//! Roster snapshot cache.
//!
//! The cache holds the most recent reshaped member list behind an `Arc`.
//! A refresh builds a complete new snapshot off-lock and swaps it in, so
//! readers never wait on the backend and never observe a partial roster.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use guildsheet_core::MemberProfile;
use guildsheet_core::schema::members;
use guildsheet_sheets::{Rows, SheetGateway};
use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use crate::config::RosterSchema;
use crate::error::{RosterError, RosterErrorCode, RosterResult};

/// One complete reshaped roster.
#[derive(Debug, Clone)]
pub struct RosterSnapshot {
    /// Active members ordered by status rank. Order within a rank is random.
    pub members: Vec<MemberProfile>,
    pub last_updated: DateTime<Utc>,
}

impl RosterSnapshot {
    pub fn new(members: Vec<MemberProfile>) -> Self {
        Self {
            members,
            last_updated: Utc::now(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Finds the member linked to `social_id`. A blank id never matches,
    /// even rows whose identity cell is empty.
    pub fn find(&self, social_id: &str) -> Option<&MemberProfile> {
        if social_id.trim().is_empty() {
            return None;
        }
        self.members.iter().find(|m| m.social_id == social_id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Why a refresh ran. Only changes the log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    Scheduled,
    WriteThrough,
    Manual,
}

impl fmt::Display for RefreshTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Scheduled => "scheduled",
            Self::WriteThrough => "write-through",
            Self::Manual => "manual",
        })
    }
}

/// Turns raw member rows into the served roster.
///
/// Row numbers follow sheet position, so they are assigned before any row is
/// dropped or reordered.
pub fn build_roster(rows: &Rows, first_data_row: u32) -> Vec<MemberProfile> {
    let mut roster: Vec<MemberProfile> = rows
        .iter()
        .zip(first_data_row..)
        .filter_map(|(row, row_num)| match members::parse_row(row, row_num) {
            Ok(profile) => Some(profile),
            Err(e) => {
                debug!(row_num, error = %e, "skipping member row");
                None
            }
        })
        .collect();

    roster.shuffle(&mut rand::rng());
    // Stable, so the shuffle survives within each rank.
    roster.sort_by_key(|m| m.status);
    roster.retain(|m| m.status.is_active());
    roster
}

pub struct RosterCache {
    gateway: Arc<dyn SheetGateway>,
    schema: RosterSchema,
    snapshot: RwLock<Option<Arc<RosterSnapshot>>>,
}

impl fmt::Debug for RosterCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RosterCache")
            .field("schema", &self.schema)
            .field("loaded", &self.get().is_some())
            .finish_non_exhaustive()
    }
}

impl RosterCache {
    pub fn new(gateway: Arc<dyn SheetGateway>, schema: RosterSchema) -> Self {
        Self {
            gateway,
            schema,
            snapshot: RwLock::new(None),
        }
    }

    pub fn schema(&self) -> &RosterSchema {
        &self.schema
    }

    /// Latest snapshot, or `None` before the first refresh completes.
    pub fn get(&self) -> Option<Arc<RosterSnapshot>> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Looks up a member in the latest snapshot.
    pub fn find_by_identity(&self, social_id: &str) -> Option<MemberProfile> {
        self.get()?.find(social_id).cloned()
    }

    /// Reloads the roster. A failed read installs an empty snapshot and is
    /// only logged.
    pub async fn refresh(&self, trigger: RefreshTrigger) -> Arc<RosterSnapshot> {
        let (snapshot, _) = self.reload(trigger).await;
        snapshot
    }

    /// Like [`refresh`](Self::refresh) but also reports a failed read.
    /// The empty snapshot is installed either way.
    pub async fn try_refresh(&self, trigger: RefreshTrigger) -> RosterResult<Arc<RosterSnapshot>> {
        match self.reload(trigger).await {
            (_, Some(err)) => Err(err),
            (snapshot, None) => Ok(snapshot),
        }
    }

    async fn reload(&self, trigger: RefreshTrigger) -> (Arc<RosterSnapshot>, Option<RosterError>) {
        let range = self.schema.members_range();
        debug!(%range, %trigger, "refreshing roster");

        let (snapshot, failure) = match self.gateway.read_range(&range).await {
            Ok(rows) => {
                let members = build_roster(&rows, self.schema.first_data_row);
                (RosterSnapshot::new(members), None)
            }
            Err(e) => {
                warn!(
                    code = RosterErrorCode::LoadMembersData.as_str(),
                    error = %e,
                    "failed to load members, serving an empty roster"
                );
                (RosterSnapshot::empty(), Some(RosterError::LoadMembers(e)))
            }
        };

        let snapshot = Arc::new(snapshot);
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());

        if failure.is_none() {
            match trigger {
                RefreshTrigger::Scheduled => {
                    info!(count = snapshot.len(), "roster auto refreshed")
                }
                RefreshTrigger::WriteThrough | RefreshTrigger::Manual => {
                    info!(count = snapshot.len(), %trigger, "roster refreshed")
                }
            }
        }

        (snapshot, failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeGateway, GatewayCall, member_row};
    use guildsheet_core::MemberStatus;

    fn rows(rows: &[Vec<&str>]) -> Rows {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn sample_rows() -> Rows {
        rows(&[
            member_row("Ayla", "會員", "U3"),
            member_row("Bren", "離會會員", "U4"),
            member_row("Cato", "公會長", "U1"),
            member_row("Dara", "副會長", "U2"),
            member_row("Eris", "會員", "U5"),
        ])
    }

    #[test]
    fn build_roster_drops_departed_and_sorts() {
        let roster = build_roster(&sample_rows(), 2);
        assert_eq!(roster.len(), 4);
        assert!(roster.iter().all(|m| m.status != MemberStatus::Departed));
        assert!(roster.windows(2).all(|w| w[0].status <= w[1].status));
        assert_eq!(roster[0].char_name, "Cato");
        assert_eq!(roster[1].char_name, "Dara");
    }

    #[test]
    fn build_roster_row_numbers_follow_sheet_position() {
        fn row_of(roster: &[MemberProfile], name: &str) -> Option<u32> {
            roster
                .iter()
                .find(|m| m.char_name == name)
                .map(|m| m.row_num)
        }

        let roster = build_roster(&sample_rows(), 2);
        assert_eq!(row_of(&roster, "Ayla"), Some(2));
        assert_eq!(row_of(&roster, "Cato"), Some(4));
        assert_eq!(row_of(&roster, "Dara"), Some(5));
        assert_eq!(row_of(&roster, "Eris"), Some(6));

        let offset = build_roster(&sample_rows(), 5);
        assert_eq!(row_of(&offset, "Ayla"), Some(5));
        assert_eq!(row_of(&offset, "Cato"), Some(7));
        assert_eq!(row_of(&offset, "Dara"), Some(8));
        assert_eq!(row_of(&offset, "Eris"), Some(9));
        assert_eq!(row_of(&offset, "Bren"), None);
    }

    #[test]
    fn build_roster_unknown_status_consumes_row() {
        let rows = rows(&[
            member_row("Ayla", "guest", "U1"),
            member_row("Bren", "會員", "U2"),
            vec![],
        ]);
        let roster = build_roster(&rows, 2);
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].row_num, 3);
    }

    #[test]
    fn build_roster_empty_sheet() {
        assert!(build_roster(&Rows::new(), 2).is_empty());
    }

    #[tokio::test]
    async fn get_is_none_until_first_refresh() {
        let gateway = Arc::new(FakeGateway::new());
        let cache = RosterCache::new(gateway.clone(), RosterSchema::default());
        assert!(cache.get().is_none());
        assert!(cache.find_by_identity("U1").is_none());
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn refresh_reads_members_table() {
        let gateway = Arc::new(FakeGateway::new().with_table("members", sample_rows()));
        let cache = RosterCache::new(gateway.clone(), RosterSchema::default());

        let snapshot = cache.refresh(RefreshTrigger::Manual).await;
        assert_eq!(snapshot.len(), 4);
        assert_eq!(
            gateway.calls(),
            vec![GatewayCall::Read("members!A2:N".to_string())]
        );

        for id in ["U1", "U2", "U3", "U5"] {
            let found = cache.find_by_identity(id).unwrap();
            assert_eq!(found.social_id, id);
            assert_eq!(snapshot.members.iter().filter(|m| m.social_id == id).count(), 1);
        }
        assert!(cache.find_by_identity("U4").is_none());
        assert!(cache.find_by_identity("nobody").is_none());
    }

    #[tokio::test]
    async fn failed_read_installs_empty_snapshot() {
        let gateway = Arc::new(FakeGateway::new().with_table("members", sample_rows()));
        let cache = RosterCache::new(gateway.clone(), RosterSchema::default());
        let first = cache.refresh(RefreshTrigger::Scheduled).await;
        assert!(!first.is_empty());

        gateway.fail_reads(true);
        let second = cache.refresh(RefreshTrigger::Scheduled).await;
        assert!(second.is_empty());
        assert!(second.last_updated >= first.last_updated);
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(cache.get().unwrap().is_empty());
    }

    #[tokio::test]
    async fn try_refresh_reports_load_failure() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.fail_reads(true);
        let cache = RosterCache::new(gateway, RosterSchema::default());

        let err = cache.try_refresh(RefreshTrigger::Manual).await.unwrap_err();
        assert_eq!(err.code(), RosterErrorCode::LoadMembersData);
        assert!(cache.get().unwrap().is_empty());
    }

    #[tokio::test]
    async fn held_snapshot_survives_replacement() {
        let gateway = Arc::new(FakeGateway::new().with_table("members", sample_rows()));
        let cache = RosterCache::new(gateway.clone(), RosterSchema::default());
        let held = cache.refresh(RefreshTrigger::Manual).await;

        gateway.set_table("members", Rows::new());
        cache.refresh(RefreshTrigger::Manual).await;

        assert_eq!(held.len(), 4);
        assert!(cache.get().unwrap().is_empty());
    }
}
