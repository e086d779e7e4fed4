use reactrole::model::id::{GuildId, RoleId, UserId};
use reactrole::store::{Grant, StoreError, TempRoleMap, TemporaryRoleStore};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use futures::TryStreamExt;
use sqlx::mysql::MySqlPool;
use sqlx::Row;

/// A [`TemporaryRoleStore`] backed by a MySQL database.
///
/// Grants live in a single `temp_roles` table with the key triple as the
/// primary key; the expiry is persisted as epoch milliseconds. The primary
/// key serializes conflicting writes to the same triple.
#[derive(Clone)]
pub struct MysqlStore {
    pool: MySqlPool,
}

impl MysqlStore {
    pub async fn connect(uri: &str) -> Result<Self, StoreError> {
        let pool = MySqlPool::connect(uri).await.map_err(StoreError::new)?;

        Ok(Self { pool })
    }

    /// Creates the `temp_roles` table if it does not exist yet.
    pub async fn create(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS temp_roles (
                guild_id BIGINT UNSIGNED NOT NULL,
                user_id BIGINT UNSIGNED NOT NULL,
                role_id BIGINT UNSIGNED NOT NULL,
                expires_at BIGINT NOT NULL,
                PRIMARY KEY (guild_id, user_id, role_id)
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(StoreError::new)?;

        Ok(())
    }
}

#[async_trait]
impl TemporaryRoleStore for MysqlStore {
    async fn add_temporary_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        sqlx::query(
            "INSERT INTO temp_roles (guild_id, user_id, role_id, expires_at)
             VALUES (?, ?, ?, ?)
             ON DUPLICATE KEY UPDATE expires_at = VALUES(expires_at)",
        )
        .bind(guild_id.0)
        .bind(user_id.0)
        .bind(role_id.0)
        .bind(expires_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(StoreError::new)?;

        Ok(true)
    }

    async fn remove_temporary_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> Result<bool, StoreError> {
        let result =
            sqlx::query("DELETE FROM temp_roles WHERE guild_id = ? AND user_id = ? AND role_id = ?")
                .bind(guild_id.0)
                .bind(user_id.0)
                .bind(role_id.0)
                .execute(&self.pool)
                .await
                .map_err(StoreError::new)?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_temporary_roles(&self) -> Result<TempRoleMap, StoreError> {
        let mut rows = sqlx::query("SELECT guild_id, user_id, role_id, expires_at FROM temp_roles")
            .fetch(&self.pool);

        let mut map = TempRoleMap::new();
        while let Some(row) = rows.try_next().await.map_err(StoreError::new)? {
            let guild_id: u64 = row.try_get("guild_id").map_err(StoreError::new)?;
            let user_id: u64 = row.try_get("user_id").map_err(StoreError::new)?;
            let role_id: u64 = row.try_get("role_id").map_err(StoreError::new)?;
            let expires_at: i64 = row.try_get("expires_at").map_err(StoreError::new)?;

            map.entry(GuildId(guild_id))
                .or_default()
                .entry(UserId(user_id))
                .or_default()
                .insert(
                    RoleId(role_id),
                    Grant {
                        expires_at: Utc.timestamp_millis(expires_at),
                    },
                );
        }

        Ok(map)
    }
}
