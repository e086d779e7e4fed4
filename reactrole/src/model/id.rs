use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::num::ParseIntError;
use std::str::FromStr;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid format")]
    InvalidFormat,
    #[error(transparent)]
    ParseIntError(#[from] ParseIntError),
}

#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct GuildId(pub u64);

impl From<u64> for GuildId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct MessageId(pub u64);

impl From<u64> for MessageId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct RoleId(pub u64);

impl FromStr for RoleId {
    type Err = ParseError;

    fn from_str(mut s: &str) -> Result<Self, Self::Err> {
        if !s.starts_with("<@&") || !s.ends_with('>') {
            return Err(ParseError::InvalidFormat);
        }
        s = s.strip_prefix("<@&").unwrap().strip_suffix('>').unwrap();

        let id = s.parse()?;
        Ok(Self(id))
    }
}

impl From<u64> for RoleId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct UserId(pub u64);

impl FromStr for UserId {
    type Err = ParseError;

    fn from_str(mut s: &str) -> Result<Self, Self::Err> {
        if !s.starts_with("<@") || !s.ends_with('>') {
            return Err(ParseError::InvalidFormat);
        }
        s = s.strip_prefix("<@").unwrap().strip_suffix('>').unwrap();
        s = match s.strip_prefix('!') {
            Some(s) => s,
            None => s,
        };

        let id = s.parse()?;
        Ok(Self(id))
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<serenity::model::id::GuildId> for GuildId {
    fn from(src: serenity::model::id::GuildId) -> Self {
        Self(src.0)
    }
}

impl From<serenity::model::id::MessageId> for MessageId {
    fn from(src: serenity::model::id::MessageId) -> Self {
        Self(src.0)
    }
}

impl From<serenity::model::id::RoleId> for RoleId {
    fn from(src: serenity::model::id::RoleId) -> Self {
        Self(src.0)
    }
}

impl From<serenity::model::id::UserId> for UserId {
    fn from(src: serenity::model::id::UserId) -> Self {
        Self(src.0)
    }
}
