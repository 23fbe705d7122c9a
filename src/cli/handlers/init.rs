use crate::config::{CONFIG_FILE, PetqlConfig};
use anyhow::Result;
use colored::Colorize;

pub fn handle_init() -> Result<()> {
    let cwd = std::env::current_dir()?;
    let config_path = cwd.join(CONFIG_FILE);

    if config_path.exists() {
        return Err(
            crate::error::PetqlError::AlreadyInitialized(config_path.display().to_string()).into(),
        );
    }

    PetqlConfig::default().save(&config_path)?;

    println!("{} {}", "Initialized".green(), config_path.display());
    Ok(())
}
