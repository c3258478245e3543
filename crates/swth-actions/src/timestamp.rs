//! Timestamp source for signed payloads.
//!
//! Every signed payload carries a millisecond timestamp the exchange checks
//! against its own clock. At session start the local clock is compared with
//! `GET /exchange/timestamp`; if the skew is within tolerance the local clock
//! is used, otherwise the server clock is queried for every action. The mode
//! is fixed for the session.
//!
//! # Offset Convention
//! `skew_ms = server_time - local_time` (positive = server ahead)

use std::sync::Arc;

use serde::Deserialize;
use swth_registry::ExchangeApi;
use tracing::{info, warn};

use crate::error::{ActionError, ActionResult};

const TIMESTAMP_PATH: &str = "/exchange/timestamp";

/// Default skew tolerance before falling back to the server clock.
pub const DEFAULT_SKEW_TOLERANCE_MS: u64 = 1000;

/// Trait for obtaining current time, enabling testability.
pub trait Clock: Send + Sync {
    /// Returns current time in milliseconds since Unix epoch.
    fn now_ms(&self) -> u64;
}

/// System clock implementation using real time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
    }
}

/// Which clock signed payloads are stamped with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampMode {
    Local,
    Server,
}

#[derive(Debug, Deserialize)]
struct ServerTime {
    timestamp: u64,
}

/// Timestamp provider chosen once per session.
#[derive(Clone)]
pub struct TimestampSource {
    mode: TimestampMode,
    clock: Arc<dyn Clock>,
}

impl TimestampSource {
    /// Always use `clock`.
    pub fn local(clock: Arc<dyn Clock>) -> Self {
        Self {
            mode: TimestampMode::Local,
            clock,
        }
    }

    /// Measure skew against the exchange and pick a mode.
    ///
    /// # Arguments
    /// * `tolerance_ms` - Maximum absolute skew for which the local clock is trusted
    pub async fn calibrate(
        api: &dyn ExchangeApi,
        clock: Arc<dyn Clock>,
        tolerance_ms: u64,
    ) -> ActionResult<Self> {
        let server_ms = fetch_server_time(api).await?;
        let local_ms = clock.now_ms();
        let skew_ms = server_ms as i64 - local_ms as i64;

        let mode = if skew_ms.unsigned_abs() < tolerance_ms {
            info!(skew_ms, "Local clock within tolerance, using local timestamps");
            TimestampMode::Local
        } else {
            warn!(
                skew_ms,
                tolerance_ms, "Local clock skew too large, using server timestamps"
            );
            TimestampMode::Server
        };

        Ok(Self { mode, clock })
    }

    pub fn mode(&self) -> TimestampMode {
        self.mode
    }

    /// Timestamp for a payload about to be signed.
    pub async fn now_ms(&self, api: &dyn ExchangeApi) -> ActionResult<u64> {
        match self.mode {
            TimestampMode::Local => Ok(self.clock.now_ms()),
            TimestampMode::Server => fetch_server_time(api).await,
        }
    }
}

impl std::fmt::Debug for TimestampSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimestampSource")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

async fn fetch_server_time(api: &dyn ExchangeApi) -> ActionResult<u64> {
    let value = api.get(TIMESTAMP_PATH, &[]).await?;
    let time: ServerTime = serde_json::from_value(value)
        .map_err(|e| ActionError::Deserialization(format!("server timestamp: {e}")))?;
    Ok(time.timestamp)
}
