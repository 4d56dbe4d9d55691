//! Status polling for long-running PAI operations
//!
//! Deploying an inference service, running a training job or a pipeline all
//! return immediately; the resource then moves through a series of statuses.
//! [`wait_for_status`] re-fetches the status on a fixed interval until it reaches
//! the target, hits a status from which the target can not be reached, or the
//! timeout runs out.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::{PaiError, Result};

/// Default time between status checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default upper bound on a wait
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(20 * 60);

/// Status of an EAS inference service
///
/// Open enumeration: statuses the server adds later land in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ServiceStatus {
    Creating,
    Deploying,
    Running,
    Waiting,
    Pending,
    Scaling,
    HotUpdate,
    Updating,
    Deleting,
    Stopping,
    Starting,
    Stopped,
    Failed,
    DeleteFailed,
    Other(String),
}

impl ServiceStatus {
    /// Statuses in which a service stays until something acts on it
    pub const COMPLETED: [ServiceStatus; 4] = [
        ServiceStatus::Running,
        ServiceStatus::Stopped,
        ServiceStatus::Failed,
        ServiceStatus::DeleteFailed,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ServiceStatus::Creating => "Creating",
            ServiceStatus::Deploying => "Deploying",
            ServiceStatus::Running => "Running",
            ServiceStatus::Waiting => "Waiting",
            ServiceStatus::Pending => "Pending",
            ServiceStatus::Scaling => "Scaling",
            ServiceStatus::HotUpdate => "HotUpdate",
            ServiceStatus::Updating => "Updating",
            ServiceStatus::Deleting => "Deleting",
            ServiceStatus::Stopping => "Stopping",
            ServiceStatus::Starting => "Starting",
            ServiceStatus::Stopped => "Stopped",
            ServiceStatus::Failed => "Failed",
            ServiceStatus::DeleteFailed => "DeleteFailed",
            ServiceStatus::Other(s) => s,
        }
    }

    pub fn is_completed(&self) -> bool {
        Self::COMPLETED.contains(self)
    }
}

impl FromStr for ServiceStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "Creating" => ServiceStatus::Creating,
            "Deploying" => ServiceStatus::Deploying,
            "Running" => ServiceStatus::Running,
            "Waiting" => ServiceStatus::Waiting,
            "Pending" => ServiceStatus::Pending,
            "Scaling" => ServiceStatus::Scaling,
            "HotUpdate" => ServiceStatus::HotUpdate,
            "Updating" => ServiceStatus::Updating,
            "Deleting" => ServiceStatus::Deleting,
            "Stopping" => ServiceStatus::Stopping,
            "Starting" => ServiceStatus::Starting,
            "Stopped" => ServiceStatus::Stopped,
            "Failed" => ServiceStatus::Failed,
            "DeleteFailed" => ServiceStatus::DeleteFailed,
            other => ServiceStatus::Other(other.to_string()),
        })
    }
}

impl From<&str> for ServiceStatus {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(status) => status,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ServiceStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ServiceStatus {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ServiceStatus::from(s.as_str()))
    }
}

/// Terminal statuses of DLC training jobs
pub mod job_status {
    pub const SUCCEEDED: &str = "Succeeded";
    pub const FAILED: &str = "Failed";
    pub const STOPPED: &str = "Stopped";
    pub const UNEXPECTED: [&str; 2] = [FAILED, STOPPED];
}

/// Terminal statuses of PAIFlow pipeline runs
pub mod run_status {
    pub const SUCCEEDED: &str = "Succeeded";
    pub const FAILED: &str = "Failed";
    pub const TERMINATED: &str = "Terminated";
    pub const UNEXPECTED: [&str; 2] = [FAILED, TERMINATED];
}

/// Progress events emitted while waiting
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Wait has begun
    Started { resource: String, target: String },
    /// One status check
    Polling {
        resource: String,
        status: String,
        elapsed: Duration,
    },
    /// Target status reached
    Completed { resource: String, status: String },
    /// Wait ended without reaching the target
    Failed { resource: String, error: String },
}

/// Callback type for progress updates
///
/// The CLI uses this to print status lines; library callers usually pass `None`.
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Anything whose current status can be re-fetched
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Name used in progress events and log lines
    fn resource_name(&self) -> String;

    /// Fetch the current status from the server
    async fn fetch_status(&self) -> Result<String>;
}

/// Poll `source` until its status equals `target`
///
/// Sleeps `interval` before the first check and between checks. A status listed in
/// `unexpected` aborts the wait at once with [`PaiError::UnexpectedStatus`]; once more
/// than `timeout` has elapsed the wait fails with [`PaiError::WaitTimeout`]. The
/// interval is constant and fetch errors are returned unchanged.
///
/// # Example
///
/// ```rust,ignore
/// use pai_core::progress::{wait_for_status, ProgressEvent};
/// use std::time::Duration;
///
/// let status = wait_for_status(
///     &service,
///     "Running",
///     &["Failed", "Stopped"],
///     Duration::from_secs(600),
///     Duration::from_secs(5),
///     Some(Box::new(|event| {
///         if let ProgressEvent::Polling { status, elapsed, .. } = event {
///             println!("{} ({:.0}s)", status, elapsed.as_secs());
///         }
///     })),
/// )
/// .await?;
/// ```
pub async fn wait_for_status<S>(
    source: &S,
    target: &str,
    unexpected: &[&str],
    timeout: Duration,
    interval: Duration,
    on_progress: Option<ProgressCallback>,
) -> Result<String>
where
    S: StatusSource + ?Sized,
{
    let start = Instant::now();
    let resource = source.resource_name();

    emit(
        &on_progress,
        ProgressEvent::Started {
            resource: resource.clone(),
            target: target.to_string(),
        },
    );

    loop {
        tokio::time::sleep(interval).await;

        let status = match source.fetch_status().await {
            Ok(status) => status,
            Err(e) => {
                emit(
                    &on_progress,
                    ProgressEvent::Failed {
                        resource: resource.clone(),
                        error: e.to_string(),
                    },
                );
                return Err(e);
            }
        };
        let elapsed = start.elapsed();
        tracing::debug!("{} status: {} ({:?})", resource, status, elapsed);

        emit(
            &on_progress,
            ProgressEvent::Polling {
                resource: resource.clone(),
                status: status.clone(),
                elapsed,
            },
        );

        if status == target {
            emit(
                &on_progress,
                ProgressEvent::Completed {
                    resource: resource.clone(),
                    status: status.clone(),
                },
            );
            return Ok(status);
        }

        if unexpected.contains(&status.as_str()) {
            let err = PaiError::UnexpectedStatus {
                status,
                target: target.to_string(),
            };
            emit(
                &on_progress,
                ProgressEvent::Failed {
                    resource,
                    error: err.to_string(),
                },
            );
            return Err(err);
        }

        if elapsed > timeout {
            let err = PaiError::WaitTimeout {
                target: target.to_string(),
                timeout,
            };
            emit(
                &on_progress,
                ProgressEvent::Failed {
                    resource,
                    error: err.to_string(),
                },
            );
            return Err(err);
        }
    }
}

/// Emit a progress event if a callback is provided
fn emit(callback: &Option<ProgressCallback>, event: ProgressEvent) {
    if let Some(cb) = callback {
        cb(event);
    }
}
