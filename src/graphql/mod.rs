//! GraphQL engine for petql.
//!
//! Queries and mutates the user/pet graph through a single endpoint.
//!
//! ## Usage
//!
//! ```bash
//! # Start the GraphQL server (GraphiQL on the same path)
//! petql serve --port 3000
//!
//! # Execute a query from CLI
//! petql query '{ users { name pets { name species } } }'
//!
//! # Execute a mutation from CLI
//! petql mutate 'addPet(species: "dog", userId: 1) { id user { name } }'
//! ```
//!
//! ## Schema
//!
//! - **Queries**: `pet`, `pets`, `user`, `users`
//! - **Mutations**: `addPet`, `addUser`
//!
//! ## Components
//!
//! - [`types`]: the type registry (field descriptors and type modifiers)
//! - [`resolvers`]: relationship lookups, root queries and mutations
//! - [`validation`]: document checks run before any resolver
//! - [`Engine`]: request execution and null propagation

pub mod resolvers;
pub mod types;
pub mod validation;

mod execution;
mod schema;
mod server;

pub use execution::Engine;
pub use schema::{MUTATION, PET, QUERY, USER, build_engine, build_registry};
pub use server::{build_router, run_server};
