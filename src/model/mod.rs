//! Data models for petql.
//!
//! - [`User`]: a person who owns zero or more pets
//! - [`Pet`]: an animal owned by exactly one user, referenced through `user_id`

mod pet;
mod user;

pub use pet::Pet;
pub use user::User;
