//! Value records decoded from REST responses

pub mod role_definition;
pub mod user;

pub use role_definition::{BasePermissions, RoleDefinition, FULL_MASK};
pub use user::User;
