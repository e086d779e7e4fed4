//! The `!reactrole` operator command and the reaction listeners.
//!
//! `!reactrole <duration|none> <spec…>` parses the operator's role list,
//! posts a menu message and registers one binding per accepted entry.
//! Reactions on that message grant and revert the bound role; bindings
//! with a duration additionally record a temporary grant for the sweeper.

use crate::Handler;

use reactrole::duration::{format_duration, parse_duration};
use reactrole::model::id::{MessageId, RoleId, UserId};
use reactrole::rolespec::{parse_role_string, RoleReactionSpec};

use chrono::{Duration, Utc};
use parking_lot::RwLock;
use serenity::client::Context;
use serenity::model::channel::{Message, Reaction, ReactionType};
use serenity::model::guild::Role;

use std::collections::{HashMap, HashSet};
use std::convert::TryFrom;
use std::fmt::Write;

/// One registered emoji→role binding on a menu message.
#[derive(Clone, Debug)]
pub struct Binding {
    pub emoji: String,
    pub role_id: RoleId,
    pub limit: Option<u32>,
    pub lifetime: Option<Duration>,
    holders: HashSet<UserId>,
}

impl Binding {
    pub fn new(emoji: String, role_id: RoleId, limit: Option<u32>, lifetime: Option<Duration>) -> Self {
        Self {
            emoji,
            role_id,
            limit,
            lifetime,
            holders: HashSet::new(),
        }
    }
}

/// All bindings, keyed by the menu message they are attached to.
#[derive(Default)]
pub struct Bindings {
    inner: RwLock<HashMap<MessageId, Vec<Binding>>>,
}

impl Bindings {
    pub fn register(&self, message_id: MessageId, bindings: Vec<Binding>) {
        self.inner.write().insert(message_id, bindings);
    }

    /// Claims a holder slot on the binding for `emoji`. Returns the bound
    /// role and lifetime, or `None` when no binding matches or its holder
    /// limit is reached.
    fn claim(
        &self,
        message_id: MessageId,
        emoji: &str,
        user_id: UserId,
    ) -> Option<(RoleId, Option<Duration>)> {
        let mut inner = self.inner.write();
        let binding = inner
            .get_mut(&message_id)?
            .iter_mut()
            .find(|binding| binding.emoji == emoji)?;

        if let Some(limit) = binding.limit {
            if binding.holders.len() >= limit as usize && !binding.holders.contains(&user_id) {
                return None;
            }
        }

        binding.holders.insert(user_id);
        Some((binding.role_id, binding.lifetime))
    }

    /// Releases a holder slot. Returns the bound role only when `user_id`
    /// actually held it.
    fn release(&self, message_id: MessageId, emoji: &str, user_id: UserId) -> Option<RoleId> {
        let mut inner = self.inner.write();
        let binding = inner
            .get_mut(&message_id)?
            .iter_mut()
            .find(|binding| binding.emoji == emoji)?;

        match binding.holders.remove(&user_id) {
            true => Some(binding.role_id),
            false => None,
        }
    }
}

pub async fn handle_message(ctx: &Context, msg: &Message, handler: &Handler) {
    let content = match msg.content.strip_prefix('!') {
        Some(content) => content,
        None => return,
    };

    let rest = match content.strip_prefix("reactrole") {
        Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => rest.trim(),
        _ => return,
    };

    let guild_id = match msg.guild_id {
        Some(guild_id) => guild_id,
        None => {
            let _ = msg
                .channel_id
                .say(&ctx.http, ":x: This command can only be used in guilds.")
                .await;
            return;
        }
    };

    let (duration_arg, spec_text) = match rest.split_once(char::is_whitespace) {
        Some((duration_arg, spec_text)) => (duration_arg, spec_text.trim()),
        None => {
            let _ = msg
                .channel_id
                .say(
                    &ctx.http,
                    "Usage: `!reactrole <duration|none> <emoji role, …>`",
                )
                .await;
            return;
        }
    };

    let lifetime = match duration_arg {
        "none" => None,
        arg => match parse_duration(arg) {
            Some(lifetime) => Some(lifetime),
            None => {
                let _ = msg
                    .channel_id
                    .say(&ctx.http, format!(":x: Invalid duration `{}`.", arg))
                    .await;
                return;
            }
        },
    };

    let mut result = parse_role_string(spec_text);

    let guild_roles = match guild_id.roles(&ctx.http).await {
        Ok(roles) => roles,
        Err(err) => {
            log::error!("[REACTROLE] Failed to fetch roles of guild {}: {:?}", guild_id, err);
            return;
        }
    };

    let mut bound = Vec::new();
    for spec in &result.roles {
        match resolve_role(spec, &guild_roles) {
            Some(role_id) => bound.push((spec.clone(), role_id)),
            None => result.errors.push(format!(
                "Unknown role for {}: \"{}\"",
                spec.emoji,
                spec.role_name.as_deref().unwrap_or_default()
            )),
        }
    }

    if bound.is_empty() && result.errors.is_empty() {
        let _ = msg
            .channel_id
            .say(
                &ctx.http,
                "Usage: `!reactrole <duration|none> <emoji role, …>`",
            )
            .await;
        return;
    }

    let mut description = String::new();
    for (spec, role_id) in &bound {
        let _ = write!(description, "{} <@&{}>", spec.emoji, role_id.0);
        if let Some(limit) = spec.limit {
            let _ = write!(description, " (limit {})", limit);
        }
        description.push('\n');
    }

    if lifetime.is_some() {
        let _ = write!(description, "\nRoles expire after {}.", format_duration(duration_arg));
    }

    for error in &result.errors {
        log::warn!("[REACTROLE] Rejected binding: {}", error);
    }

    if !result.errors.is_empty() {
        let _ = msg
            .channel_id
            .say(&ctx.http, format!(":warning: {}", result.errors.join("\n:warning: ")))
            .await;
    }

    if bound.is_empty() {
        return;
    }

    let menu = match msg
        .channel_id
        .send_message(&ctx.http, |m| {
            m.embed(|e| {
                e.title("React for a role");
                e.description(&description);
                e
            });
            m
        })
        .await
    {
        Ok(menu) => menu,
        Err(err) => {
            log::error!("[REACTROLE] Failed to post role menu: {:?}", err);
            return;
        }
    };

    let mut bindings = Vec::new();
    for (spec, role_id) in bound {
        match ReactionType::try_from(spec.emoji.as_str()) {
            Ok(reaction) => {
                let _ = menu
                    .channel_id
                    .create_reaction(&ctx.http, menu.id, reaction)
                    .await;
            }
            Err(err) => {
                log::warn!("[REACTROLE] Cannot react with {}: {:?}", spec.emoji, err);
            }
        }

        bindings.push(Binding::new(spec.emoji, role_id, spec.limit, lifetime));
    }

    handler.bindings.register(menu.id.into(), bindings);
}

pub async fn reaction_add(ctx: &Context, reaction: &Reaction, handler: &Handler) {
    let guild_id = match reaction.guild_id {
        Some(guild_id) => guild_id,
        None => return,
    };
    let user_id = match reaction.user_id {
        Some(user_id) => user_id,
        None => return,
    };

    // Ignore the menu reactions the bot itself posts.
    if *handler.bot_user.read() == Some(UserId::from(user_id)) {
        return;
    }

    let emoji = reaction.emoji.to_string();
    let (role_id, lifetime) =
        match handler
            .bindings
            .claim(reaction.message_id.into(), &emoji, user_id.into())
        {
            Some(binding) => binding,
            None => return,
        };

    if let Err(err) = ctx.http.add_member_role(guild_id.0, user_id.0, role_id.0).await {
        log::error!(
            "[REACTROLE] Failed to assign role {} to user {}: {:?}",
            role_id.0,
            user_id.0,
            err
        );
        handler
            .bindings
            .release(reaction.message_id.into(), &emoji, user_id.into());
        return;
    }

    if let Some(lifetime) = lifetime {
        let expires_at = Utc::now() + lifetime;

        handler
            .temp_roles
            .add_temporary_role(guild_id.into(), user_id.into(), role_id, expires_at)
            .await;
    }
}

pub async fn reaction_remove(ctx: &Context, reaction: &Reaction, handler: &Handler) {
    let guild_id = match reaction.guild_id {
        Some(guild_id) => guild_id,
        None => return,
    };
    let user_id = match reaction.user_id {
        Some(user_id) => user_id,
        None => return,
    };

    let emoji = reaction.emoji.to_string();
    let role_id = match handler
        .bindings
        .release(reaction.message_id.into(), &emoji, user_id.into())
    {
        Some(role_id) => role_id,
        None => return,
    };

    if let Err(err) = ctx
        .http
        .remove_member_role(guild_id.0, user_id.0, role_id.0)
        .await
    {
        log::error!(
            "[REACTROLE] Failed to revert role {} of user {}: {:?}",
            role_id.0,
            user_id.0,
            err
        );
    }

    handler
        .temp_roles
        .remove_temporary_role(guild_id.into(), user_id.into(), role_id)
        .await;
}

fn resolve_role(
    spec: &RoleReactionSpec,
    roles: &HashMap<serenity::model::id::RoleId, Role>,
) -> Option<RoleId> {
    if let Some(role_id) = spec.role_id {
        return roles
            .contains_key(&serenity::model::id::RoleId(role_id.0))
            .then(|| role_id);
    }

    let name = spec.role_name.as_deref()?;
    roles
        .values()
        .find(|role| role.name == name)
        .map(|role| RoleId(role.id.0))
}
