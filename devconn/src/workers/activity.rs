//! Activity reporting worker

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::activity::manager::{ActivityManager, ActivityReport};

/// Activity worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Length of a reporting period
    pub reporting_period: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            reporting_period: Duration::from_secs(10),
        }
    }
}

/// Close a reporting period every `options.reporting_period` and forward the
/// resulting reports to `reports_tx` when one is attached.
///
/// Once the receiver is gone the sender is released and reports are only
/// logged from then on.
pub async fn run<S, F>(
    options: &Options,
    manager: Arc<ActivityManager>,
    mut reports_tx: Option<mpsc::Sender<ActivityReport>>,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!(
        "Activity worker starting with {} strategy...",
        manager.strategy_type()
    );

    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Activity worker shutting down...");
                return;
            }
            _ = sleep_fn(options.reporting_period) => {}
        }

        for report in manager.on_reporting_period_end() {
            debug!(
                "Reporting activity of {} at {}",
                report.key, report.last_activity_time
            );
            if let Some(tx) = &reports_tx {
                if let Err(e) = tx.send(report).await {
                    warn!("Activity report receiver dropped: {}", e);
                    reports_tx = None;
                }
            }
        }
    }
}
