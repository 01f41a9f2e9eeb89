use axum::{Json, extract::State};
use serde::Serialize;

use super::AppState;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub name: &'static str,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue: Option<QueueLoad>,
}

/// Load of the outbound Spotify request queue.
#[derive(Debug, Serialize)]
pub struct QueueLoad {
    pub limit: usize,
    pub running: usize,
    pub waiting: usize,
}

impl Health {
    fn ok(queue: Option<QueueLoad>) -> Self {
        Self {
            status: "ok",
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            queue,
        }
    }
}

pub async fn health() -> Json<Health> {
    Json(Health::ok(None))
}

pub async fn dashboard_health(State(state): State<AppState>) -> Json<Health> {
    let queue = state.client.queue();
    Json(Health::ok(Some(QueueLoad {
        limit: queue.limit(),
        running: queue.running(),
        waiting: queue.waiting(),
    })))
}
