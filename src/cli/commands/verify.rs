//! Verify command - consistency check of course collections

use crate::cli::output::{colors, format_bytes};
use crate::cli::OutputFormat;
use crate::core::services::Services;
use crate::core::storage::{MetadataValidator, ValidationReport};
use clap::Args;
use serde::Serialize;
use std::sync::Arc;

/// Arguments for the verify command
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Course code (all indexed courses when omitted)
    pub course: Option<String>,
}

/// Verification response
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub checked: usize,
    pub inconsistent: usize,
    pub reports: Vec<ValidationReport>,
}

/// Execute the verify command
pub async fn execute(
    args: VerifyArgs,
    services: &Arc<Services>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let storage = Arc::clone(&services.storage);
    let reports = tokio::task::spawn_blocking(move || {
        let validator = MetadataValidator::new(&storage);
        match &args.course {
            Some(course) => validator.validate_collection(course).map(|r| vec![r]),
            None => validator.validate_all_collections(),
        }
    })
    .await??;

    let response = VerifyResponse {
        checked: reports.len(),
        inconsistent: reports.iter().filter(|r| !r.is_consistent).count(),
        reports,
    };

    match format {
        OutputFormat::Human => {
            if response.reports.is_empty() {
                println!("No indexed courses to verify.");
            }
            for report in &response.reports {
                let verdict = if report.is_consistent {
                    colors::success("OK")
                } else {
                    colors::error("INCONSISTENT")
                };
                println!(
                    "{} {} {} ({} chunks, {})",
                    verdict,
                    colors::course_id(&report.collection_id),
                    colors::dim(&report.generation),
                    colors::number(&report.metadata_chunks.to_string()),
                    format_bytes(report.actual_size)
                );
                for issue in &report.issues {
                    println!("    - {}", colors::warning(issue));
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    if response.inconsistent > 0 {
        return Err(format!(
            "{} of {} course collection(s) are inconsistent. Rebuild them with 'coursealign index-textbook'.",
            response.inconsistent, response.checked
        )
        .into());
    }

    Ok(())
}
