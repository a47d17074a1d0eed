use std::time::Instant;

use rocket::{serde::json::Json, Route, State};
use serde::{Deserialize, Serialize};

use crate::store::Store;

pub fn routes() -> Vec<Route> {
    routes![health]
}

/// When the server was assembled, for reporting uptime.
#[derive(Debug, Copy, Clone)]
pub struct Started(Instant);

impl Started {
    pub fn now() -> Self {
        Self(Instant::now())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Health {
    status: String,
    db: String,
    /// Seconds since the server started.
    uptime: f64,
}

#[get("/health")]
async fn health(store: &State<Store>, started: &State<Started>) -> Json<Health> {
    let db = match store.ping().await {
        Ok(()) => "connected",
        Err(err) => {
            warn!("Health check could not reach the store: {err}");
            "disconnected"
        }
    };
    Json(Health {
        status: "ok".to_string(),
        db: db.to_string(),
        uptime: started.0.elapsed().as_secs_f64(),
    })
}
