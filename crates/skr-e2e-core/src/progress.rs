//! Operation polling for asynchronous broker requests
//!
//! Provisioning, update and deprovisioning requests return an operation ID
//! which must be polled until the operation reaches a terminal state. This
//! module provides that polling with optional progress callbacks for UI
//! updates, and enriches failures with runtime diagnostics from KCP.

use crate::error::{CoreError, Result};
use crate::kcp::RuntimeDiagnostics;
use crate::keb::OperationSource;
use crate::operation::Operation;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Default time between polling attempts (30 seconds)
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

/// Default deadline for runtime operations (60 minutes)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Upper bound for each runtime status or event dump fetched after a failure
pub const DIAGNOSTIC_TIMEOUT: Duration = Duration::from_secs(60);

/// Progress events emitted while polling an operation
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Polling has started
    Started { operation_id: String },
    /// Polling iteration with the last observed state
    Polling {
        operation_id: String,
        state: Option<String>,
        elapsed: Duration,
    },
    /// The status fetch failed; polling continues
    FetchFailed {
        operation_id: String,
        error: String,
        elapsed: Duration,
    },
    /// Operation succeeded
    Completed { operation_id: String },
    /// Operation reached the `failed` state
    Failed { operation_id: String, error: String },
    /// Deadline elapsed before a terminal state was observed
    TimedOut {
        operation_id: String,
        elapsed: Duration,
    },
}

/// Callback type for progress updates
///
/// The CLI uses this to drive a spinner. Test scenarios usually pass `None`.
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Poll a broker operation until it succeeds
///
/// # Arguments
///
/// * `source` - Where operation records are fetched from (usually KEB)
/// * `diagnostics` - Runtime status and event dumps (usually KCP)
/// * `instance_id` - The service instance the operation belongs to
/// * `operation_id` - The operation to poll
/// * `timeout` - Maximum time to wait for a terminal state
/// * `interval` - Time between polling attempts
/// * `on_progress` - Optional callback for progress updates
///
/// # Returns
///
/// The terminal operation record when it `succeeded`.
///
/// # Errors
///
/// * [`CoreError::PollTimeout`] if no terminal state was observed before the
///   deadline. The message carries the runtime status and event log.
/// * [`CoreError::OperationFailed`] if the operation `failed`. The message
///   carries the full record and the runtime status.
///
/// A failing status fetch does not end the poll; it counts as "not yet
/// terminal" until the deadline. Each fetch is bounded by the time left before
/// the deadline, so a collaborator that never answers cannot hold the poll
/// past it. Diagnostic fetches are bounded by [`DIAGNOSTIC_TIMEOUT`] and their
/// failures are written into the error message instead of replacing it.
///
/// # Example
///
/// ```rust,ignore
/// use skr_e2e_core::{ProgressEvent, ensure_operation_succeeded};
/// use skr_e2e_core::progress::DEFAULT_INTERVAL;
/// use std::time::Duration;
///
/// let operation = ensure_operation_succeeded(
///     &keb,
///     &kcp,
///     &instance_id,
///     &operation_id,
///     Duration::from_secs(3600),
///     DEFAULT_INTERVAL,
///     Some(Box::new(|event| {
///         if let ProgressEvent::Polling { state, elapsed, .. } = event {
///             println!("State: {:?} ({:.0}s)", state, elapsed.as_secs());
///         }
///     })),
/// )
/// .await?;
/// ```
pub async fn ensure_operation_succeeded<S, D>(
    source: &S,
    diagnostics: &D,
    instance_id: &str,
    operation_id: &str,
    timeout: Duration,
    interval: Duration,
    on_progress: Option<ProgressCallback>,
) -> Result<Operation>
where
    S: OperationSource + ?Sized,
    D: RuntimeDiagnostics + ?Sized,
{
    emit(
        &on_progress,
        ProgressEvent::Started {
            operation_id: operation_id.to_string(),
        },
    );

    let start = Instant::now();
    let operation = match wait_for_terminal_state(
        source,
        instance_id,
        operation_id,
        timeout,
        interval,
        &on_progress,
    )
    .await
    {
        Ok(operation) => operation,
        Err(cause) => {
            emit(
                &on_progress,
                ProgressEvent::TimedOut {
                    operation_id: operation_id.to_string(),
                    elapsed: start.elapsed(),
                },
            );

            let status = diagnostics.runtime_status(instance_id);
            let runtime_status = describe_diagnostic("runtime status", status).await;
            let events = diagnostics.runtime_events(instance_id);
            let events = describe_diagnostic("runtime events", events).await;

            return Err(CoreError::PollTimeout {
                instance_id: instance_id.to_string(),
                operation_id: operation_id.to_string(),
                timeout,
                cause,
                runtime_status,
                events,
            });
        }
    };

    if !operation.is_succeeded() {
        let record = operation.to_pretty_json();
        emit(
            &on_progress,
            ProgressEvent::Failed {
                operation_id: operation_id.to_string(),
                error: operation
                    .description
                    .clone()
                    .unwrap_or_else(|| format!("Operation {}", operation.state_label())),
            },
        );

        let status = diagnostics.runtime_status(instance_id);
        let runtime_status = describe_diagnostic("runtime status", status).await;

        return Err(CoreError::OperationFailed {
            instance_id: instance_id.to_string(),
            operation_id: operation_id.to_string(),
            record,
            runtime_status,
        });
    }

    info!(
        "Operation {} finished with state {}",
        operation_id,
        operation.state_label()
    );
    emit(
        &on_progress,
        ProgressEvent::Completed {
            operation_id: operation_id.to_string(),
        },
    );

    Ok(operation)
}

/// Poll until a terminal record is seen; on deadline return the timeout cause
async fn wait_for_terminal_state<S>(
    source: &S,
    instance_id: &str,
    operation_id: &str,
    timeout: Duration,
    interval: Duration,
    on_progress: &Option<ProgressCallback>,
) -> std::result::Result<Operation, String>
where
    S: OperationSource + ?Sized,
{
    let start = Instant::now();
    let mut last_state: Option<String> = None;
    let mut last_error: Option<String> = None;

    loop {
        let elapsed = start.elapsed();
        let remaining = timeout.saturating_sub(elapsed);

        let fetch = source.operation(instance_id, operation_id);
        let fetched = match tokio::time::timeout(remaining, fetch).await {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(_) => Err(format!("no response within {}s", remaining.as_secs())),
        };

        match fetched {
            Ok(Some(operation)) if operation.is_terminal() => return Ok(operation),
            Ok(Some(operation)) => {
                debug!(
                    "Operation {} is {} after {:.0}s",
                    operation_id,
                    operation.state_label(),
                    elapsed.as_secs_f64()
                );
                let state = operation.state.map(String::from);
                emit(
                    on_progress,
                    ProgressEvent::Polling {
                        operation_id: operation_id.to_string(),
                        state: state.clone(),
                        elapsed,
                    },
                );
                last_state = state;
            }
            Ok(None) => {
                debug!("Operation {} not visible yet", operation_id);
                emit(
                    on_progress,
                    ProgressEvent::Polling {
                        operation_id: operation_id.to_string(),
                        state: None,
                        elapsed,
                    },
                );
            }
            Err(error) => {
                warn!("Failed to fetch operation {}: {}", operation_id, error);
                emit(
                    on_progress,
                    ProgressEvent::FetchFailed {
                        operation_id: operation_id.to_string(),
                        error: error.clone(),
                        elapsed,
                    },
                );
                last_error = Some(error);
            }
        }

        // The last poll may land exactly on the deadline
        let remaining = timeout.saturating_sub(start.elapsed());
        if remaining.is_zero() {
            return Err(timeout_cause(
                instance_id,
                operation_id,
                timeout,
                last_state.as_deref(),
                last_error.as_deref(),
            ));
        }
        tokio::time::sleep(interval.min(remaining)).await;
    }
}

fn timeout_cause(
    instance_id: &str,
    operation_id: &str,
    timeout: Duration,
    last_state: Option<&str>,
    last_error: Option<&str>,
) -> String {
    let mut cause = format!(
        "Operation {} for instance {} did not reach a terminal state within {}s",
        operation_id,
        instance_id,
        timeout.as_secs()
    );
    if let Some(state) = last_state {
        cause.push_str(&format!(" (last observed state: {})", state));
    }
    if let Some(error) = last_error {
        cause.push_str(&format!("; last fetch error: {}", error));
    }
    cause
}

/// Render a diagnostic dump, or the reason it could not be fetched
async fn describe_diagnostic<F>(what: &str, fetch: F) -> String
where
    F: Future<Output = Result<String>>,
{
    let error = match tokio::time::timeout(DIAGNOSTIC_TIMEOUT, fetch).await {
        Ok(Ok(dump)) => return dump,
        Ok(Err(e)) => e.to_string(),
        Err(_) => format!("no response within {}s", DIAGNOSTIC_TIMEOUT.as_secs()),
    };
    warn!("Failed to fetch {}: {}", what, error);
    format!("<failed to fetch {}: {}>", what, error)
}

/// Helper to emit progress events
fn emit(callback: &Option<ProgressCallback>, event: ProgressEvent) {
    if let Some(cb) = callback {
        cb(event);
    }
}
