use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    Router,
    extract::State,
    response::Html,
    routing::{MethodRouter, get},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::execution::Engine;
use crate::{config::ServerSettings, error::Result};

async fn graphql_handler(State(engine): State<Engine>, req: GraphQLRequest) -> GraphQLResponse {
    engine.execute(req.into_inner()).into()
}

/// Router serving the engine on `settings.path`.
///
/// With GraphiQL enabled, `GET` on the path returns the explorer page and
/// requests go through `POST`. Otherwise both methods execute requests.
pub fn build_router(engine: Engine, settings: &ServerSettings) -> Router {
    let endpoint: MethodRouter<Engine> = if settings.graphiql {
        let page = GraphiQLSource::build().endpoint(&settings.path).finish();
        get(move || {
            let page = page.clone();
            async move { Html(page) }
        })
        .post(graphql_handler)
    } else {
        get(graphql_handler).post(graphql_handler)
    };

    Router::new()
        .route(&settings.path, endpoint)
        .layer(TraceLayer::new_for_http())
        .with_state(engine)
}

pub async fn run_server(engine: Engine, settings: &ServerSettings) -> Result<()> {
    let app = build_router(engine, settings);
    let listener = TcpListener::bind((settings.host.as_str(), settings.port)).await?;

    info!(
        address = %listener.local_addr()?,
        path = %settings.path,
        "Server is running on {}",
        settings.port
    );
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphql::build_engine;
    use crate::storage::EntityStore;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn router(graphiql: bool) -> (Router, Engine) {
        let engine = build_engine(Arc::new(EntityStore::with_sample_data()));
        let settings = ServerSettings {
            graphiql,
            ..ServerSettings::default()
        };
        (build_router(engine.clone(), &settings), engine)
    }

    fn post(body: Value) -> Request<Body> {
        Request::post("/graphql")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_post_query() {
        let (app, _) = router(true);
        let response = app
            .oneshot(post(json!({ "query": "{ user(id: 1) { name } }" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({ "data": { "user": { "name": "Diane" } } })
        );
    }

    #[tokio::test]
    async fn test_post_mutation_with_variables_updates_shared_store() {
        let (app, engine) = router(true);
        let response = app
            .oneshot(post(json!({
                "query": "mutation ($name: String!) { addUser(name: $name) { id name } }",
                "variables": { "name": "Zoe" }
            })))
            .await
            .unwrap();
        assert_eq!(
            json_body(response).await,
            json!({ "data": { "addUser": { "id": 4, "name": "Zoe" } } })
        );
        assert_eq!(engine.store().user_count().unwrap(), 4);
    }

    #[tokio::test]
    async fn test_get_serves_graphiql() {
        let (app, _) = router(true);
        let response = app
            .oneshot(Request::get("/graphql").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("graphiql"));
    }

    #[tokio::test]
    async fn test_get_executes_without_graphiql() {
        let (app, _) = router(false);
        let response = app
            .oneshot(
                Request::get("/graphql?query=%7B%20pet(id%3A%203)%20%7B%20name%20%7D%20%7D")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            json_body(response).await,
            json!({ "data": { "pet": { "name": "Rolex" } } })
        );
    }
}
