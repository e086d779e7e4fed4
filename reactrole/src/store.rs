//! The persistence contract for temporary role grants.
//!
//! A grant records that a user holds a role in a guild until `expires_at`.
//! Grants are keyed by the `(guild, user, role)` triple and stored as a
//! three-level map; a missing key at any level means "no grants", never an
//! error. Concurrent writes to the same triple must serialize inside the
//! store so the final state reflects one complete operation.

use crate::model::id::{GuildId, RoleId, UserId};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::collections::HashMap;

/// The persisted layout: `guild → user → role → grant`.
pub type TempRoleMap = HashMap<GuildId, HashMap<UserId, HashMap<RoleId, Grant>>>;

/// The stored per-grant data.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub expires_at: DateTime<Utc>,
}

/// Error raised by a store backend.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct StoreError(Box<dyn std::error::Error + Send + Sync>);

impl StoreError {
    pub fn new<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self(err.into())
    }
}

/// A backend tracking time-bounded role grants.
#[async_trait]
pub trait TemporaryRoleStore: Send + Sync {
    /// Records a grant. Re-adding an existing `(guild, user, role)` triple
    /// overwrites the stored expiry.
    async fn add_temporary_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Deletes a grant. Returns `false` when no such grant existed.
    async fn remove_temporary_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> Result<bool, StoreError>;

    /// Reads the full grant set.
    async fn get_temporary_roles(&self) -> Result<TempRoleMap, StoreError>;
}
