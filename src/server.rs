use std::{net::SocketAddr, str::FromStr, sync::Arc};

use axum::{
    Extension, Router,
    routing::{get, post},
};

use crate::{
    api, config,
    error::{Error, Result},
    info,
    management::{ModuleStore, RunLog, ScheduleStore},
    pipeline::Runner,
    schedule::{HttpTimer, TimerFacility},
};

/// Everything a request handler needs, shared through an [`Extension`] layer.
pub struct AppState {
    pub runner: Runner,
    pub modules: ModuleStore,
    pub schedules: ScheduleStore,
    pub runs: RunLog,
    pub timer: Arc<dyn TimerFacility>,
    pub invoke_secret: String,
}

impl AppState {
    /// Wires the Spotify client, the stores below [`config::data_dir`] and the HTTP
    /// timer facility from the environment.
    pub fn from_env() -> Result<Self> {
        let data_dir = config::data_dir();

        Ok(Self {
            runner: Runner::from_env()?,
            modules: ModuleStore::new(data_dir.clone()),
            schedules: ScheduleStore::new(data_dir.clone()),
            runs: RunLog::new(data_dir),
            timer: Arc::new(HttpTimer::from_env()?),
            invoke_secret: config::invoke_secret()?,
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/invoke", post(api::invoke))
        .layer(Extension(state))
}

pub async fn start_api_server() -> Result<()> {
    let state = Arc::new(AppState::from_env()?);

    let addr = SocketAddr::from_str(&config::server_addr()?)
        .map_err(|e| Error::Config(format!("Failed to parse server address: {}", e)))?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
