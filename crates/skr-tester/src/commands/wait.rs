//! Waiting on broker operations with a terminal spinner
//!
//! Wraps the core poller's progress callback in an indicatif spinner and
//! renders the terminal operation record.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use skr_e2e_core::progress::{ProgressCallback, ProgressEvent};
use skr_e2e_core::{Operation, ensure_operation_succeeded};

use crate::cli::WaitArgs;
use crate::connection::ConnectionManager;
use crate::error::{Result as CliResult, SkrTesterError};
use crate::output::{OutputFormat, print_output};

/// Summary printed after a wait completes
#[derive(Debug, Serialize)]
pub struct OperationSummary {
    pub instance_id: String,
    pub operation_id: String,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl OperationSummary {
    pub fn new(instance_id: &str, operation_id: &str, operation: &Operation) -> Self {
        Self {
            instance_id: instance_id.to_string(),
            operation_id: operation_id.to_string(),
            state: operation.state_label().to_string(),
            description: operation.description.clone(),
        }
    }
}

/// Spinner plus a progress callback that drives it
pub fn progress_spinner(label: &str, visible: bool) -> (ProgressBar, ProgressCallback) {
    let pb = if visible {
        ProgressBar::new_spinner()
    } else {
        ProgressBar::hidden()
    };
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(label.to_string());

    let pb_clone = pb.clone();
    let callback: ProgressCallback = Box::new(move |event: ProgressEvent| match &event {
        ProgressEvent::Started { operation_id } => {
            pb_clone.set_message(format!("Operation {} started", operation_id));
        }
        ProgressEvent::Polling {
            operation_id,
            state,
            ..
        } => {
            let state = state.as_deref().unwrap_or("unknown");
            pb_clone.set_message(format!(
                "Operation {}: {}",
                operation_id,
                format_operation_state(state)
            ));
        }
        ProgressEvent::FetchFailed {
            operation_id,
            error,
            ..
        } => {
            pb_clone.set_message(format!(
                "Operation {}: fetch failed ({}), retrying",
                operation_id, error
            ));
        }
        ProgressEvent::Completed { operation_id } => {
            pb_clone.finish_with_message(format!(
                "Operation {}: {}",
                operation_id,
                format_operation_state("succeeded")
            ));
        }
        ProgressEvent::Failed { operation_id, .. } => {
            pb_clone.finish_with_message(format!(
                "Operation {}: {}",
                operation_id,
                format_operation_state("failed")
            ));
        }
        ProgressEvent::TimedOut {
            operation_id,
            elapsed,
        } => {
            pb_clone.finish_with_message(format!(
                "Operation {} timed out after {}s",
                operation_id,
                elapsed.as_secs()
            ));
        }
    });

    (pb, callback)
}

/// Format an operation state for display with status icons
pub fn format_operation_state(state: &str) -> String {
    match state {
        "succeeded" => format!("\u{2713} {}", state), // checkmark
        "failed" => format!("\u{2717} {}", state),    // x mark
        "in progress" | "pending" => format!("\u{21bb} {}", state), // arrow circle
        _ => state.to_string(),
    }
}

/// `skr-tester wait`
pub async fn handle_wait(
    conn_mgr: &ConnectionManager,
    args: &WaitArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let keb = conn_mgr.create_keb_client().await?;
    let kcp = conn_mgr.create_kcp_client()?;
    let poll = &conn_mgr.config.poll;

    let timeout = args.timeout.map(Duration::from_secs).unwrap_or(poll.timeout());
    let interval = args
        .interval
        .map(Duration::from_secs)
        .unwrap_or(poll.interval());

    let (pb, callback) = progress_spinner(
        &format!("Waiting for operation {}", args.operation_id),
        output.is_text(),
    );

    let result = ensure_operation_succeeded(
        &keb,
        &kcp,
        &args.instance_id,
        &args.operation_id,
        timeout,
        interval,
        Some(callback),
    )
    .await;

    match result {
        Ok(operation) => print_output(
            OperationSummary::new(&args.instance_id, &args.operation_id, &operation),
            output,
        ),
        Err(e) => {
            pb.abandon();
            Err(SkrTesterError::from(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_operation_state() {
        assert_eq!(format_operation_state("succeeded"), "\u{2713} succeeded");
        assert_eq!(format_operation_state("failed"), "\u{2717} failed");
        assert_eq!(format_operation_state("in progress"), "\u{21bb} in progress");
        assert_eq!(format_operation_state("orphaned"), "orphaned");
    }

    #[test]
    fn test_summary_from_operation() {
        let mut operation = Operation::with_state("succeeded");
        operation.description = Some("Operation succeeded".to_string());

        let summary = OperationSummary::new("inst-1", "op-1", &operation);
        assert_eq!(summary.state, "succeeded");
        assert_eq!(summary.description.as_deref(), Some("Operation succeeded"));
    }

    #[test]
    fn test_spinner_callback_handles_every_event() {
        let (pb, callback) = progress_spinner("test", false);
        callback(ProgressEvent::Started {
            operation_id: "op-1".to_string(),
        });
        callback(ProgressEvent::Polling {
            operation_id: "op-1".to_string(),
            state: None,
            elapsed: Duration::from_secs(30),
        });
        callback(ProgressEvent::Completed {
            operation_id: "op-1".to_string(),
        });
        assert!(pb.is_finished());
    }
}
