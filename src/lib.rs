//! # petql - a GraphQL API over users and their pets
//!
//! petql keeps two related collections in memory, users and the pets they
//! own, and exposes them through one GraphQL endpoint. Cross-entity fields
//! (`Pet.user`, `User.pets`) are resolved lazily, only when a request
//! selects them.
//!
//! ## Quick Start
//!
//! ```bash
//! # Serve the API with GraphiQL on http://127.0.0.1:3000/graphql
//! petql serve
//!
//! # One-off query against the sample data
//! petql query '{ pet(id: 1) { name user { name } } }'
//! ```
//!
//! ## Modules
//!
//! - [`cli`]: Command-line interface definitions
//! - [`config`]: Configuration loading
//! - [`error`]: Error types and result aliases
//! - [`graphql`]: Type registry, resolvers, validation and execution
//! - [`model`]: Data models (User, Pet)
//! - [`storage`]: The in-memory entity store

/// Command-line interface definitions using clap.
pub mod cli;

/// Configuration loading and management.
///
/// Handles `.petql.yml` files; every setting has a default.
pub mod config;

/// Error types and result aliases.
pub mod error;

/// GraphQL engine and HTTP transport.
pub mod graphql;

/// Tracing subscriber setup for stderr and file logs.
pub mod logging;

/// Data models for users and pets.
pub mod model;

/// In-memory entity store.
pub mod storage;
