//! Progress reporting for generations.
//!
//! The adapter pushes [`ProgressUpdate`]s into an optional channel. When the
//! MCP caller sent a progress token, [`forward`] relays them as
//! `notifications/progress` on the same session.

use std::time::Duration;

use rmcp::model::ProgressNotificationParam;
use rmcp::service::RequestContext;
use rmcp::RoleServer;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Progress is reported on a 0-100 scale.
pub const TOTAL: f64 = 100.0;

/// Reported once the upstream accepted the job.
pub const SUBMITTED: f64 = 5.0;

/// Polling never reports beyond this, leaving room for completion.
const POLL_CEILING: f64 = 95.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub progress: f64,
    pub message: String,
}

impl ProgressUpdate {
    pub fn new(progress: f64, message: impl Into<String>) -> Self {
        Self {
            progress,
            message: message.into(),
        }
    }
}

pub type ProgressSender = mpsc::Sender<ProgressUpdate>;

/// Send `update` if anyone is listening. A closed receiver is not an error.
pub async fn report(progress: Option<&ProgressSender>, update: ProgressUpdate) {
    if let Some(tx) = progress {
        let _ = tx.send(update).await;
    }
}

/// Position within the polling phase, from [`SUBMITTED`] up to 95 as the
/// wait approaches its timeout. Never decreases for a growing `elapsed`.
pub fn polling_progress(elapsed: Duration, timeout: Duration) -> f64 {
    let fraction = if timeout.is_zero() {
        1.0
    } else {
        (elapsed.as_secs_f64() / timeout.as_secs_f64()).min(1.0)
    };
    SUBMITTED + (POLL_CEILING - SUBMITTED) * fraction
}

/// Relay updates to the client for the request in `ctx`.
///
/// Returns `None` when the request carried no progress token. Drop the
/// sender and await the handle before responding so every notification
/// precedes the result.
pub fn forward(ctx: &RequestContext<RoleServer>) -> Option<(ProgressSender, JoinHandle<()>)> {
    let token = ctx.meta.get_progress_token()?;
    let peer = ctx.peer.clone();
    let (tx, mut rx) = mpsc::channel::<ProgressUpdate>(16);

    let handle = tokio::spawn(async move {
        while let Some(update) = rx.recv().await {
            let param = ProgressNotificationParam {
                progress_token: token.clone(),
                progress: update.progress,
                total: Some(TOTAL),
                message: Some(update.message),
            };
            if let Err(e) = peer.notify_progress(param).await {
                debug!(error = %e, "progress notification not delivered");
                break;
            }
        }
    });

    Some((tx, handle))
}
