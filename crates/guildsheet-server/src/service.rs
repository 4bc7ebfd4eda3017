//! Write-through roster mutations.
//!
//! Every successful write is followed by a cache refresh, so the snapshot a
//! caller sees after a mutation returns already reflects it.

use std::sync::Arc;

use guildsheet_core::schema::{line_profiles, members};
use guildsheet_core::{
    CharacterStats, MemberProfile, RangeUpdate, RowPatch, SharedClock, SocialIdentity,
    system_clock,
};
use guildsheet_sheets::{AccessToken, CredentialStore, SheetGateway};
use tracing::{debug, info, warn};

use crate::cache::{RefreshTrigger, RosterCache, RosterSnapshot};
use crate::error::{RosterError, RosterResult};

pub struct RosterService {
    cache: Arc<RosterCache>,
    gateway: Arc<dyn SheetGateway>,
    credentials: Arc<dyn CredentialStore>,
    clock: SharedClock,
}

impl RosterService {
    /// The service writes through `gateway` and reloads `cache`, which should
    /// read from the same spreadsheet.
    pub fn new(
        cache: Arc<RosterCache>,
        gateway: Arc<dyn SheetGateway>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            cache,
            gateway,
            credentials,
            clock: system_clock(),
        }
    }

    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn cache(&self) -> &Arc<RosterCache> {
        &self.cache
    }

    async fn token(&self) -> RosterResult<AccessToken> {
        self.credentials
            .access_token()
            .await
            .map_err(RosterError::AccessToken)
    }

    async fn write_rows(&self, row_num: u32, updates: Vec<RangeUpdate>) -> RosterResult<()> {
        let token = self.token().await?;
        self.gateway
            .batch_update(&token, updates)
            .await
            .map_err(|source| {
                warn!(row_num, error = %source, details = ?source.details(), "row update failed");
                RosterError::UpdateFailed { row_num, source }
            })?;
        self.cache.refresh(RefreshTrigger::WriteThrough).await;
        Ok(())
    }

    /// Appends a new member and its identity.
    ///
    /// # Errors
    ///
    /// Fails with [`RosterError::MemberAlreadyExists`] when the cached roster
    /// already links `profile.social_id`, and with
    /// [`RosterError::MissingSocialId`] when the id is blank. Nothing is
    /// written in either case.
    /// The two appends are not atomic: if the identity append fails the
    /// member row stays behind.
    pub async fn add_member(
        &self,
        profile: &MemberProfile,
        identity: &SocialIdentity,
    ) -> RosterResult<()> {
        if profile.social_id.trim().is_empty() {
            return Err(RosterError::MissingSocialId);
        }
        let token = self.token().await?;

        if self.cache.find_by_identity(&profile.social_id).is_some() {
            return Err(RosterError::MemberAlreadyExists {
                social_id: profile.social_id.clone(),
            });
        }

        let schema = self.cache.schema();
        let now = self.clock.timestamp();
        let appends = [
            (
                &schema.members_sheet,
                schema.members_anchor(),
                members::new_row(profile, &now),
            ),
            (
                &schema.profiles_sheet,
                schema.profiles_anchor(),
                line_profiles::new_row(identity, &now),
            ),
        ];
        for (sheet, anchor, row) in appends {
            self.gateway
                .append_row(&token, &anchor, row)
                .await
                .map_err(|source| RosterError::AppendFailed {
                    sheet: sheet.clone(),
                    source,
                })?;
        }

        info!(social_id = %profile.social_id, char_name = %profile.char_name, "member added");
        self.cache.refresh(RefreshTrigger::WriteThrough).await;
        Ok(())
    }

    /// Copies the social display name and picture onto both tables at
    /// `row_num`, and stores the identity's failure counter.
    ///
    /// Both tables are addressed with the same row number, which assumes
    /// members and identities were appended in lockstep.
    pub async fn update_social_profile(
        &self,
        row_num: u32,
        identity: &SocialIdentity,
    ) -> RosterResult<()> {
        let schema = self.cache.schema();
        let now = self.clock.timestamp();

        let member_fields = RowPatch::new()
            .set(members::DISPLAY_NAME, &identity.display_name)
            .set(members::PICTURE_URL, &identity.picture_url);
        let member_stamp = RowPatch::new().set(members::LAST_UPDATED, now.as_str());
        let profile_fields = RowPatch::new()
            .set(line_profiles::SOCIAL_ID, None::<String>)
            .set(line_profiles::DISPLAY_NAME, &identity.display_name)
            .set(line_profiles::PICTURE_URL, &identity.picture_url)
            .set(line_profiles::LAST_UPDATED, now.as_str())
            .set(line_profiles::FAIL_COUNT, identity.fail_count);

        let updates = [
            member_fields.into_update(&schema.members_sheet, row_num),
            member_stamp.into_update(&schema.members_sheet, row_num),
            profile_fields.into_update(&schema.profiles_sheet, row_num),
        ]
        .into_iter()
        .flatten()
        .collect();

        debug!(row_num, social_id = %identity.social_id, "updating social profile");
        self.write_rows(row_num, updates).await
    }

    /// Overwrites the character stats at `row_num`. `None` fields are left as
    /// they are in the sheet.
    pub async fn update_character_stats(
        &self,
        row_num: u32,
        stats: &CharacterStats,
    ) -> RosterResult<()> {
        let sheet = &self.cache.schema().members_sheet;
        let now = self.clock.timestamp();

        let fields = RowPatch::new()
            .set(members::AVATAR_URL, stats.avatar_url.clone())
            .set(members::JOB, stats.job.clone())
            .set(members::LEVEL, stats.level)
            .set(members::UNION_LEVEL, stats.union_level);
        let stamp = RowPatch::new().set(members::LAST_UPDATED, now.as_str());

        let updates = [fields.into_update(sheet, row_num), stamp.into_update(sheet, row_num)]
            .into_iter()
            .flatten()
            .collect();

        debug!(row_num, "updating character stats");
        self.write_rows(row_num, updates).await
    }

    /// Sets the mood phrase of the member linked to `social_id`.
    ///
    /// Returns the row written. An id that is not in the cached roster,
    /// including a blank one, is a no-op: nothing is requested from the
    /// backend and `Ok(None)` is returned.
    pub async fn update_mood_phrase(
        &self,
        social_id: &str,
        text: &str,
    ) -> RosterResult<Option<u32>> {
        let Some(member) = self.cache.find_by_identity(social_id) else {
            debug!(social_id, "mood update for unknown member ignored");
            return Ok(None);
        };

        let sheet = &self.cache.schema().members_sheet;
        let updates = RowPatch::new()
            .set(members::MOOD_PHRASE, text)
            .into_update(sheet, member.row_num)
            .into_iter()
            .collect();

        debug!(row_num = member.row_num, social_id, "updating mood phrase");
        self.write_rows(member.row_num, updates).await?;
        Ok(Some(member.row_num))
    }

    /// The current snapshot, or `None` before the first refresh.
    pub fn roster(&self) -> Option<Arc<RosterSnapshot>> {
        self.cache.get()
    }

    pub fn find_member(&self, social_id: &str) -> Option<MemberProfile> {
        self.cache.find_by_identity(social_id)
    }

    /// Reads every stored identity. A failed read is logged and yields an
    /// empty list.
    pub async fn list_social_identities(&self) -> Vec<SocialIdentity> {
        let range = self.cache.schema().profiles_range();
        match self.gateway.read_range(&range).await {
            Ok(rows) => rows
                .iter()
                .map(|row| line_profiles::parse_row(row))
                .filter(|identity| !identity.social_id.is_empty())
                .collect(),
            Err(e) => {
                warn!(%range, error = %e, "failed to load social identities");
                Vec::new()
            }
        }
    }
}
