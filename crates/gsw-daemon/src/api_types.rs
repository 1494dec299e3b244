//! Response types for the gsw-daemon HTTP endpoints.
//!
//! `Serialize + Deserialize` so they can be JSON-encoded by Axum and decoded
//! by tests. No logic lives here.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
}

// ---------------------------------------------------------------------------
// GET /
// ---------------------------------------------------------------------------

pub const LIVENESS_TEXT: &str = "🌱 Garden Horizons Bot is running!";
