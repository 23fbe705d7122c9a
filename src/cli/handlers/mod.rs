mod init;
mod mutate;
mod query;
mod schema;
mod serve;

pub use init::handle_init;
pub use mutate::handle_mutate;
pub use query::handle_query;
pub use schema::handle_schema;
pub use serve::handle_serve;

use crate::config::PetqlConfig;
use crate::graphql::{Engine, build_engine};
use crate::storage::EntityStore;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

/// Common context passed to all command handlers
pub struct CommandContext {
    pub config: PetqlConfig,
    pub root: PathBuf,
}

impl CommandContext {
    pub fn new(config: PetqlConfig, root: PathBuf) -> Self {
        Self { config, root }
    }

    /// Engine over a store seeded according to the config.
    pub fn engine(&self) -> Result<Engine> {
        let seed = self
            .config
            .seed(&self.root)
            .context("Failed to load seed data")?;
        Ok(build_engine(Arc::new(EntityStore::from_seed(seed))))
    }
}

fn parse_variables(variables: Option<String>) -> Result<async_graphql::Variables> {
    match variables {
        Some(v) => {
            let json: serde_json::Value =
                serde_json::from_str(&v).context("Variables must be a JSON object")?;
            Ok(async_graphql::Variables::from_json(json))
        }
        None => Ok(async_graphql::Variables::default()),
    }
}

fn print_response(response: &async_graphql::Response) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}
