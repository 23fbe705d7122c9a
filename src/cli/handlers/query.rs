use anyhow::Result;

use super::{CommandContext, parse_variables, print_response};

pub fn handle_query(
    ctx: CommandContext,
    query: String,
    variables: Option<String>,
    operation: Option<String>,
) -> Result<()> {
    let engine = ctx.engine()?;

    let mut request = async_graphql::Request::new(query).variables(parse_variables(variables)?);
    if let Some(name) = operation {
        request = request.operation_name(name);
    }

    print_response(&engine.execute(request))
}
