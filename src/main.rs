use anyhow::{Context, Result};
use clap::Parser;

use petql::cli::handlers::{
    CommandContext, handle_init, handle_mutate, handle_query, handle_schema, handle_serve,
};
use petql::cli::{Cli, Commands};
use petql::config::PetqlConfig;
use petql::logging;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_file.clone());

    match cli.command {
        Commands::Init => handle_init(),
        Commands::Schema => handle_schema(),
        Commands::Query {
            query,
            variables,
            operation,
        } => handle_query(load_context(&cli.config)?, query, variables, operation),
        Commands::Mutate {
            mutation,
            variables,
        } => handle_mutate(load_context(&cli.config)?, mutation, variables),
        Commands::Serve { host, port } => handle_serve(load_context(&cli.config)?, host, port),
    }
}

fn load_context(config: &Option<std::path::PathBuf>) -> Result<CommandContext> {
    let (config, root) = match config {
        Some(path) => PetqlConfig::load_from(path),
        None => {
            let cwd = std::env::current_dir()?;
            PetqlConfig::load(&cwd)
        }
    }
    .context("Failed to load petql configuration")?;
    Ok(CommandContext::new(config, root))
}
