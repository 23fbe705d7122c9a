use anyhow::Result;

use super::{CommandContext, parse_variables, print_response};

pub fn handle_mutate(
    ctx: CommandContext,
    mutation: String,
    variables: Option<String>,
) -> Result<()> {
    let engine = ctx.engine()?;

    // Auto-wrap in mutation { }
    let query = format!("mutation {{ {} }}", mutation);
    let request = async_graphql::Request::new(query).variables(parse_variables(variables)?);

    print_response(&engine.execute(request))
}
