use crate::graphql::build_registry;
use anyhow::Result;

pub fn handle_schema() -> Result<()> {
    print!("{}", build_registry().to_sdl());
    Ok(())
}
