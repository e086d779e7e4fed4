//! The expiry sweeper.
//!
//! Periodically walks all guilds, revokes roles whose grant expired and
//! removes the grant from the store. Grants of members that left the guild
//! are dropped; a grant whose role removal fails stays recorded and is
//! retried on the next sweep.

use reactrole::model::id::GuildId;
use reactrole_core::temprole::TempRoles;

use chrono::Utc;
use serenity::http::{GuildPagination, Http};
use serenity::model::id::GuildId as ApiGuildId;
use serenity::model::id::RoleId as ApiRoleId;

use std::sync::Arc;
use std::time::Duration;

pub async fn run(http: Arc<Http>, temp_roles: Arc<TempRoles>, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;
        sweep(&http, &temp_roles).await;
    }
}

async fn sweep(http: &Http, temp_roles: &TempRoles) {
    let guilds = match http
        .get_guilds(&GuildPagination::After(ApiGuildId(0)), 100)
        .await
    {
        Ok(guilds) => guilds,
        Err(err) => {
            log::error!("[SWEEP] Failed to list guilds: {:?}", err);
            return;
        }
    };

    let now = Utc::now();

    for guild in guilds {
        let grants = temp_roles.get_temporary_roles(GuildId(guild.id.0)).await;

        for (user_id, roles) in grants {
            for (role_id, grant) in roles {
                // Still active.
                if grant.expires_at > now {
                    continue;
                }

                match http.get_member(guild.id.0, user_id.0).await {
                    Ok(member) => {
                        // The role may have been removed manually; the
                        // grant is stale either way.
                        if member.roles.contains(&ApiRoleId(role_id.0)) {
                            if let Err(err) = http
                                .remove_member_role(guild.id.0, user_id.0, role_id.0)
                                .await
                            {
                                log::error!(
                                    "[SWEEP] Failed to remove role {} from user {}: {:?}",
                                    role_id.0,
                                    user_id.0,
                                    err
                                );
                                continue;
                            }

                            log::info!(
                                "[SWEEP] Removed expired role {} from user {}",
                                role_id.0,
                                user_id.0
                            );
                        }
                    }
                    // Member is not in the guild anymore.
                    Err(_) => (),
                }

                temp_roles
                    .remove_temporary_role(GuildId(guild.id.0), user_id, role_id)
                    .await;
            }
        }
    }
}
