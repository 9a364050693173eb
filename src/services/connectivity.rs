//! Backend reachability check.
//!
//! DESIGN
//! ======
//! One health request at session start decides connectivity for the whole
//! session. There is no polling or retry.

#[cfg(test)]
#[path = "connectivity_test.rs"]
mod connectivity_test;

use tracing::{info, warn};

use crate::net::api::ShopApi;
use crate::state::session::ConnectivityStatus;

/// Run one `GET /health` and report the outcome.
pub async fn probe<A: ShopApi + ?Sized>(api: &A) -> ConnectivityStatus {
    match api.health().await {
        Ok(()) => {
            info!("backend reachable");
            ConnectivityStatus::Connected
        }
        Err(e) => {
            warn!(error = %e, retryable = e.retryable(), "backend health check failed");
            ConnectivityStatus::Disconnected
        }
    }
}
