//! Tracking of time-bounded role grants.
//!
//! [`TempRoles`] wraps a [`TemporaryRoleStore`] and owns the failure
//! containment contract: callers are interaction handlers that must always
//! produce a response, so no method here ever returns an error. A store
//! failure is reported through the [`ErrorSink`] once and converted into
//! the method's empty value (`false`, an empty list, an empty map).

use reactrole::model::id::{GuildId, RoleId, UserId};
use reactrole::store::{Grant, StoreError, TemporaryRoleStore};

use chrono::{DateTime, Utc};

use std::collections::HashMap;
use std::sync::Arc;

/// Receiver for contained store failures.
pub trait ErrorSink: Send + Sync {
    fn error(&self, message: &str, error: &StoreError);
}

/// The default [`ErrorSink`], forwarding to the `log` facade.
pub struct LogSink;

impl ErrorSink for LogSink {
    fn error(&self, message: &str, error: &StoreError) {
        log::error!("[TEMPROLE] {}: {}", message, error);
    }
}

/// A grant flattened into a per-user listing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UserGrant {
    pub role_id: RoleId,
    pub expires_at: DateTime<Utc>,
}

/// The temporary role service.
///
/// Grant lifecycle: a grant becomes active through
/// [`add_temporary_role`](Self::add_temporary_role), counts as expired once
/// `now >= expires_at` (a derived condition evaluated by the sweeper, never
/// stored), and disappears through
/// [`remove_temporary_role`](Self::remove_temporary_role).
pub struct TempRoles {
    store: Arc<dyn TemporaryRoleStore>,
    sink: Arc<dyn ErrorSink>,
}

impl TempRoles {
    pub fn new(store: Arc<dyn TemporaryRoleStore>) -> Self {
        Self::with_sink(store, Arc::new(LogSink))
    }

    pub fn with_sink(store: Arc<dyn TemporaryRoleStore>, sink: Arc<dyn ErrorSink>) -> Self {
        Self { store, sink }
    }

    /// Records a grant of `role_id` to `user_id` until `expires_at`.
    ///
    /// Returns `false` on store failure instead of propagating it.
    pub async fn add_temporary_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
        expires_at: DateTime<Utc>,
    ) -> bool {
        match self
            .store
            .add_temporary_role(guild_id, user_id, role_id, expires_at)
            .await
        {
            Ok(added) => added,
            Err(err) => {
                self.sink.error("Failed to add temporary role", &err);
                false
            }
        }
    }

    /// Removes a grant. Idempotent: removing an absent grant is not
    /// distinguishable from success at this layer.
    pub async fn remove_temporary_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> bool {
        match self
            .store
            .remove_temporary_role(guild_id, user_id, role_id)
            .await
        {
            Ok(removed) => removed,
            Err(err) => {
                self.sink.error("Failed to remove temporary role", &err);
                false
            }
        }
    }

    /// All grants held by one user in one guild, flattened into a list.
    ///
    /// Empty both when the user holds no grants and when the store read
    /// failed; only the latter is reported to the sink.
    pub async fn get_user_temporary_roles(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Vec<UserGrant> {
        match self.store.get_temporary_roles().await {
            Ok(mut map) => map
                .get_mut(&guild_id)
                .and_then(|users| users.remove(&user_id))
                .map(|grants| {
                    grants
                        .into_iter()
                        .map(|(role_id, grant)| UserGrant {
                            role_id,
                            expires_at: grant.expires_at,
                        })
                        .collect()
                })
                .unwrap_or_default(),
            Err(err) => {
                self.sink.error("Failed to get user temporary roles", &err);
                Vec::new()
            }
        }
    }

    /// All grants in one guild, keyed by user and role.
    pub async fn get_temporary_roles(
        &self,
        guild_id: GuildId,
    ) -> HashMap<UserId, HashMap<RoleId, Grant>> {
        match self.store.get_temporary_roles().await {
            Ok(mut map) => map.remove(&guild_id).unwrap_or_default(),
            Err(err) => {
                self.sink
                    .error("Failed to get temporary roles for guild", &err);
                HashMap::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorSink, TempRoles, UserGrant};
    use crate::store::MemStore;

    use reactrole::model::id::{GuildId, RoleId, UserId};
    use reactrole::store::{StoreError, TempRoleMap, TemporaryRoleStore};

    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};
    use parking_lot::Mutex;

    use std::sync::Arc;

    /// A store whose every call fails.
    struct FailStore;

    #[async_trait]
    impl TemporaryRoleStore for FailStore {
        async fn add_temporary_role(
            &self,
            _: GuildId,
            _: UserId,
            _: RoleId,
            _: DateTime<Utc>,
        ) -> Result<bool, StoreError> {
            Err(StoreError::new("write rejected"))
        }

        async fn remove_temporary_role(
            &self,
            _: GuildId,
            _: UserId,
            _: RoleId,
        ) -> Result<bool, StoreError> {
            Err(StoreError::new("write rejected"))
        }

        async fn get_temporary_roles(&self) -> Result<TempRoleMap, StoreError> {
            Err(StoreError::new("read rejected"))
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        messages: Mutex<Vec<String>>,
    }

    impl ErrorSink for RecordingSink {
        fn error(&self, message: &str, _error: &StoreError) {
            self.messages.lock().push(message.to_string());
        }
    }

    fn failing_service() -> (TempRoles, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let service = TempRoles::with_sink(Arc::new(FailStore), sink.clone());
        (service, sink)
    }

    #[tokio::test]
    async fn test_add_contains_store_failure() {
        let (service, sink) = failing_service();
        let expires_at = Utc::now() + Duration::hours(1);

        assert!(
            !service
                .add_temporary_role(GuildId(1), UserId(2), RoleId(3), expires_at)
                .await
        );
        assert_eq!(
            *sink.messages.lock(),
            vec!["Failed to add temporary role"]
        );
    }

    #[tokio::test]
    async fn test_remove_contains_store_failure() {
        let (service, sink) = failing_service();

        assert!(
            !service
                .remove_temporary_role(GuildId(1), UserId(2), RoleId(3))
                .await
        );
        assert_eq!(sink.messages.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_reads_contain_store_failure() {
        let (service, sink) = failing_service();

        assert!(service
            .get_user_temporary_roles(GuildId(1), UserId(2))
            .await
            .is_empty());
        assert!(service.get_temporary_roles(GuildId(1)).await.is_empty());
        assert_eq!(sink.messages.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_user_roles_flattened() {
        let service = TempRoles::new(Arc::new(MemStore::new()));
        let expires_at = Utc::now() + Duration::hours(1);

        service
            .add_temporary_role(GuildId(1), UserId(2), RoleId(3), expires_at)
            .await;
        service
            .add_temporary_role(GuildId(1), UserId(2), RoleId(4), expires_at)
            .await;
        // Another user's grant stays out of the listing.
        service
            .add_temporary_role(GuildId(1), UserId(9), RoleId(5), expires_at)
            .await;

        let mut grants = service.get_user_temporary_roles(GuildId(1), UserId(2)).await;
        grants.sort_by_key(|grant| grant.role_id);

        assert_eq!(
            grants,
            vec![
                UserGrant {
                    role_id: RoleId(3),
                    expires_at
                },
                UserGrant {
                    role_id: RoleId(4),
                    expires_at
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_absent_guild_reads_empty() {
        let service = TempRoles::new(Arc::new(MemStore::new()));

        assert!(service.get_temporary_roles(GuildId(404)).await.is_empty());
        assert!(service
            .get_user_temporary_roles(GuildId(404), UserId(2))
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_guild_roles_nested() {
        let service = TempRoles::new(Arc::new(MemStore::new()));
        let expires_at = Utc::now() + Duration::hours(1);

        service
            .add_temporary_role(GuildId(1), UserId(2), RoleId(3), expires_at)
            .await;

        let grants = service.get_temporary_roles(GuildId(1)).await;
        assert_eq!(grants[&UserId(2)][&RoleId(3)].expires_at, expires_at);
    }
}
