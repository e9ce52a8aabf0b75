// src/output/writer.rs
//! Executes output operations by performing actual I/O.

use super::types::*;
use crate::error::AppError;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

/// Delivers the output plan. Individual failures are collected in the
/// report rather than aborting the remaining operations.
pub fn deliver(plan: OutputPlan) -> Result<OutputReport, AppError> {
    let mut report = OutputReport::new();
    let start_time = Instant::now();

    log::info!(
        "Executing output plan with {} operations",
        plan.operations.len()
    );

    for operation in plan.operations {
        let op_start = Instant::now();
        match execute_operation(&operation) {
            Ok(bytes_written) => {
                report = report.with_completed(CompletedOperation {
                    operation,
                    bytes_written,
                    duration_ms: op_start.elapsed().as_millis() as u64,
                });
            }
            Err(e) => {
                log::error!("Operation failed: {}", e);
                report = report.with_failed(FailedOperation {
                    operation,
                    error: e.to_string(),
                });
            }
        }
    }

    report.total_duration_ms = start_time.elapsed().as_millis() as u64;
    log::info!(
        "Output plan execution complete: {} succeeded, {} failed in {}ms",
        report.completed.len(),
        report.failed.len(),
        report.total_duration_ms
    );

    Ok(report)
}

fn execute_operation(operation: &DeliveryTarget) -> Result<usize, AppError> {
    match operation {
        DeliveryTarget::WriteFile { path, content } => write_file(path, content),
        DeliveryTarget::PrintToStdout { content } => {
            print!("{}", content);
            std::io::stdout().flush()?;
            Ok(content.len())
        }
    }
}

fn write_file(path: &Path, content: &str) -> Result<usize, AppError> {
    log::debug!("Writing {} bytes to {}", content.len(), path.display());

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;

    log::info!("Wrote file: {}", path.display());
    Ok(content.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("notionpress-output-{}-{}", name, uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_write_file_creates_parents() {
        let dir = scratch_dir("write");
        let path = dir.join("posts").join("hello.html");
        let plan = OutputPlan::new().with_operation(DeliveryTarget::WriteFile {
            path: path.clone(),
            content: "<article></article>\n".into(),
        });

        let report = deliver(plan).unwrap();
        assert!(report.is_success());
        assert_eq!(report.bytes_written, 20);
        assert_eq!(fs::read_to_string(&path).unwrap(), "<article></article>\n");

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_failures_are_reported_not_raised() {
        let dir = scratch_dir("fail");
        fs::create_dir_all(&dir).unwrap();
        // A directory cannot be overwritten as a file.
        let plan = OutputPlan::new().with_operation(DeliveryTarget::WriteFile {
            path: dir.clone(),
            content: "x".into(),
        });

        let report = deliver(plan).unwrap();
        assert!(!report.is_success());
        assert_eq!(report.failed.len(), 1);

        let _ = fs::remove_dir_all(dir);
    }
}
