//! In-memory entity storage for petql.
//!
//! All state lives for the lifetime of the process. Collections are
//! append-only: there is no update or delete.
//!
//! ## Components
//!
//! - [`EntityStore`]: the user and pet collections plus id allocation
//! - [`Seed`]: the initial data set, either the built-in sample or a file

mod seed;
mod store;

pub use seed::{Seed, SeedSource};
pub use store::EntityStore;
