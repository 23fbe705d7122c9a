use anyhow::Result;
use colored::Colorize;

use crate::graphql::run_server;

use super::CommandContext;

pub fn handle_serve(ctx: CommandContext, host: Option<String>, port: Option<u16>) -> Result<()> {
    let engine = ctx.engine()?;
    let mut settings = ctx.config.server;
    if let Some(host) = host {
        settings.host = host;
    }
    if let Some(port) = port {
        settings.port = port;
    }

    let url = format!("http://{}:{}{}", settings.host, settings.port, settings.path);
    println!("{} {}", "Starting GraphQL server on".green(), url.cyan());
    if settings.graphiql {
        println!("{} {}", "GraphiQL:".green(), url.cyan());
    }

    tokio::runtime::Runtime::new()?.block_on(async { run_server(engine, &settings).await })?;
    Ok(())
}
