use crate::error::{PetqlError, Result};
use crate::storage::{Seed, SeedSource};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = ".petql.yml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PetqlConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub data: DataSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_path")]
    pub path: String,

    #[serde(default = "default_graphiql")]
    pub graphiql: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_path() -> String {
    "/graphql".to_string()
}

fn default_graphiql() -> bool {
    true
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            path: default_path(),
            graphiql: default_graphiql(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSettings {
    /// Built-in data set used when no seed file is configured.
    #[serde(default)]
    pub seed: SeedSource,

    /// YAML or JSON file with `users` and `pets`, relative to the config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_file: Option<String>,
}

impl PetqlConfig {
    /// Load the nearest `.petql.yml` at or above `start_path`, falling back to
    /// defaults when there is none. Returns the directory the config was found
    /// in, which relative paths are resolved against.
    pub fn load(start_path: &Path) -> Result<(Self, PathBuf)> {
        match Self::find_config_file(start_path) {
            Some(config_path) => Self::load_from(&config_path),
            None => Ok((Self::default(), start_path.to_path_buf())),
        }
    }

    pub fn load_from(config_path: &Path) -> Result<(Self, PathBuf)> {
        let content = std::fs::read_to_string(config_path)?;
        let config: PetqlConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        let root = config_path
            .parent()
            .ok_or_else(|| PetqlError::Config("Config file has no parent directory".to_string()))?
            .to_path_buf();
        Ok((config, root))
    }

    pub fn find_config_file(start_path: &Path) -> Option<PathBuf> {
        let mut current = start_path.to_path_buf();
        loop {
            let config_path = current.join(CONFIG_FILE);
            if config_path.exists() {
                return Some(config_path);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.server.path.starts_with('/') {
            return Err(PetqlError::Config(format!(
                "server.path must start with '/': {}",
                self.server.path
            )));
        }
        Ok(())
    }

    /// Initial store contents for this configuration.
    pub fn seed(&self, root: &Path) -> Result<Seed> {
        match &self.data.seed_file {
            Some(file) => Seed::load(&root.join(file)),
            None => Ok(Seed::from_source(self.data.seed)),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
