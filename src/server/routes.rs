//! Axum HTTP routes for the diagnostic endpoint.

use crate::error::ServerError;
use crate::stress::{PoolMonitor, WorkerSnapshot};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Shared application state
pub struct AppState {
    pub monitor: PoolMonitor,
}

/// Body of `GET /debug/stats`
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub state: &'static str,
    pub stop_requested: bool,
    pub elapsed_secs: f64,
    pub total_workers: usize,
    pub active_workers: usize,
    pub failed_workers: usize,
    pub cycles_per_second: f64,
    pub totals: WorkerSnapshot,
}

/// One entry of `GET /debug/workers`
#[derive(Debug, Serialize)]
pub struct WorkerEntry {
    pub id: usize,
    #[serde(flatten)]
    pub stats: WorkerSnapshot,
}

// ─── Route builder ───────────────────────────────────────────────

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/debug/stats", get(stats))
        .route("/debug/workers", get(workers))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ─── Handlers ────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "disktroyer",
    }))
}

async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let progress = state.monitor.progress();
    Json(StatsResponse {
        state: progress.state.as_str(),
        stop_requested: state.monitor.stop_requested(),
        elapsed_secs: progress.elapsed.as_secs_f64(),
        total_workers: progress.total_workers,
        active_workers: progress.active_workers,
        failed_workers: progress.failed_workers,
        cycles_per_second: progress.cycles_per_second(),
        totals: progress.totals,
    })
}

async fn workers(State(state): State<Arc<AppState>>) -> Json<Vec<WorkerEntry>> {
    let entries = state
        .monitor
        .workers()
        .into_iter()
        .enumerate()
        .map(|(id, stats)| WorkerEntry { id, stats })
        .collect();
    Json(entries)
}

// ─── Server ──────────────────────────────────────────────────────

/// Serve diagnostics on `addr` until the process exits
pub async fn serve(addr: &str, monitor: PoolMonitor) -> Result<(), ServerError> {
    let state = Arc::new(AppState { monitor });
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Debug server listening");

    axum::serve(listener, router).await?;
    Ok(())
}

/// Run [`serve`] on its own thread with a small tokio runtime, so the
/// worker threads never share a scheduler with it
pub fn spawn_background(addr: String, monitor: PoolMonitor) -> Result<JoinHandle<()>, ServerError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .map_err(|e| ServerError::Runtime(e.to_string()))?;

    thread::Builder::new()
        .name("debug-server".to_string())
        .spawn(move || {
            if let Err(e) = runtime.block_on(serve(&addr, monitor)) {
                warn!(addr = %addr, error = %e, "Debug server stopped");
            }
        })
        .map_err(ServerError::Io)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StressConfig;
    use crate::stress::StressCoordinator;
    use tempfile::tempdir;

    fn app_state(max_dirs: usize) -> (tempfile::TempDir, Arc<AppState>) {
        let tmp = tempdir().unwrap();
        let coordinator = StressCoordinator::new(StressConfig {
            root: tmp.path().to_path_buf(),
            max_dirs,
            max_file_size: 16,
            ..StressConfig::default()
        })
        .unwrap();
        let state = Arc::new(AppState {
            monitor: coordinator.monitor(),
        });
        (tmp, state)
    }

    #[tokio::test]
    async fn test_stats_before_launch() {
        let (_tmp, state) = app_state(3);
        let Json(body) = stats(State(state)).await;

        assert_eq!(body.state, "idle");
        assert!(!body.stop_requested);
        assert_eq!(body.total_workers, 3);
        assert_eq!(body.active_workers, 0);
        assert_eq!(body.totals.cycles, 0);
    }

    #[tokio::test]
    async fn test_workers_listing() {
        let (_tmp, state) = app_state(2);
        let Json(entries) = workers(State(state)).await;

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].id, 1);

        let json = serde_json::to_value(&entries[0]).unwrap();
        assert_eq!(json["id"], 0);
        assert_eq!(json["cycles"], 0);
        assert_eq!(json["failed"], false);
    }
}
