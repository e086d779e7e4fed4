pub mod duration;
pub mod model;
pub mod rolespec;
pub mod store;

pub use duration::{format_duration, format_remaining_time, parse_duration};
pub use rolespec::{parse_role_string, ParseResult, RoleReactionSpec};
pub use store::{Grant, StoreError, TempRoleMap, TemporaryRoleStore};
