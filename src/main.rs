use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use maven_resolver::config::ResolverConfig;
use maven_resolver::maven::paths::parse_maven_path;
use maven_resolver::maven::{ArtifactDownloader, GroupArtifact, RepositoryDescriptor, ResolutionCaches};

const RESOLVED_REPOSITORY_HEADER: &str = "x-resolved-repository";

struct AppState {
    downloader: ArtifactDownloader,
    repositories: Vec<RepositoryDescriptor>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ResolverConfig::from_args_or_env()?;
    let addr: SocketAddr = config.listen_address.parse()
        .with_context(|| format!("invalid listen address {:?}", config.listen_address))?;

    let state = Arc::new(AppState {
        downloader: ArtifactDownloader::new(&config, ResolutionCaches::default()),
        repositories: config.repositories.clone(),
    });

    let app = Router::new()
        .route("/repo/*path", get(repo))
        .route("/metadata/:group_id/:artifact_id", get(metadata))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("serving {}", addr);
    axum::Server::try_bind(&addr)?
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

async fn repo(State(state): State<Arc<AppState>>, Path(repo_path): Path<String>) -> Response {
    let artifact_ref = match parse_maven_path(repo_path.trim_start_matches('/')) {
        Ok(artifact_ref) => artifact_ref,
        Err(e) => {
            debug!("rejecting {:?}: {}", repo_path, e);
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    match state.downloader.download_artifact(&artifact_ref, None, &state.repositories).await {
        Ok(resolved) => (
            StatusCode::OK,
            [(RESOLVED_REPOSITORY_HEADER, resolved.repository.id)],
            resolved.content,
        ).into_response(),
        Err(e) => {
            info!("{}", e);
            (StatusCode::NOT_FOUND, e.to_string()).into_response()
        }
    }
}

async fn metadata(State(state): State<Arc<AppState>>, Path((group_id, artifact_id)): Path<(String, String)>) -> Response {
    let group_artifact = GroupArtifact::new(&group_id, &artifact_id);

    match state.downloader.download_metadata(&group_artifact, None, &state.repositories).await {
        Some(metadata) => Json(metadata).into_response(),
        None => (StatusCode::NOT_FOUND, format!("no metadata for {}", group_artifact)).into_response(),
    }
}
