use reactrole::model::id::{GuildId, RoleId, UserId};
use reactrole::store::{Grant, StoreError, TempRoleMap, TemporaryRoleStore};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use std::sync::Arc;

/// A [`TemporaryRoleStore`] that keeps all grants in memory.
///
/// Conflicting writes to the same `(guild, user, role)` triple serialize
/// through the write lock. Removing the last grant of a user or guild
/// prunes the now-empty inner maps, so absent keys read back as missing.
#[derive(Clone, Debug, Default)]
pub struct MemStore {
    inner: Arc<RwLock<TempRoleMap>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TemporaryRoleStore for MemStore {
    async fn add_temporary_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write();

        inner
            .entry(guild_id)
            .or_default()
            .entry(user_id)
            .or_default()
            .insert(role_id, Grant { expires_at });

        Ok(true)
    }

    async fn remove_temporary_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write();

        let guild = match inner.get_mut(&guild_id) {
            Some(guild) => guild,
            None => return Ok(false),
        };

        let user = match guild.get_mut(&user_id) {
            Some(user) => user,
            None => return Ok(false),
        };

        let removed = user.remove(&role_id).is_some();

        if user.is_empty() {
            guild.remove(&user_id);
        }
        if guild.is_empty() {
            inner.remove(&guild_id);
        }

        Ok(removed)
    }

    async fn get_temporary_roles(&self) -> Result<TempRoleMap, StoreError> {
        Ok(self.inner.read().clone())
    }
}
