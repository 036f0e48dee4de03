use std::path::PathBuf;

use svcimpact_core::{Engine, EngineReport, SnapshotFile};

use super::load_snapshot;
use crate::OutputFormat;
use crate::output::print_report;

fn evaluate_file(file: &SnapshotFile, view: Option<&str>) -> Result<EngineReport, String> {
    let engine = Engine::for_file(file).map_err(|e| e.to_string())?;
    engine
        .evaluate_prepared(&file.prepare(), view)
        .map_err(|e| e.to_string())
}

fn evaluate_path(path: PathBuf, view: Option<String>) -> Result<(PathBuf, EngineReport), String> {
    let (path, file) = load_snapshot(Some(path))?;
    let report = evaluate_file(&file, view.as_deref()).map_err(|e| format!("{}: {}", path.display(), e))?;
    Ok((path, report))
}

/// Evaluate every snapshot. Files are processed concurrently; output keeps argument order.
pub async fn run_evaluate(
    files: Vec<PathBuf>,
    view: Option<String>,
    format: OutputFormat,
) -> Result<(), String> {
    let reports = if files.is_empty() {
        let (path, file) = load_snapshot(None)?;
        tracing::debug!(path = %path.display(), "using discovered snapshot");
        let report = evaluate_file(&file, view.as_deref())?;
        vec![(path, report)]
    } else {
        let handles: Vec<_> = files
            .into_iter()
            .map(|path| {
                let view = view.clone();
                tokio::task::spawn_blocking(move || evaluate_path(path, view))
            })
            .collect();

        let mut reports = Vec::with_capacity(handles.len());
        for handle in handles {
            let result = handle
                .await
                .map_err(|e| format!("evaluation task failed: {}", e))?;
            reports.push(result?);
        }
        reports
    };

    match format {
        OutputFormat::Json => {
            let value = if reports.len() == 1 {
                serde_json::to_value(&reports[0].1)
            } else {
                serde_json::to_value(
                    reports
                        .iter()
                        .map(|(path, report)| {
                            serde_json::json!({
                                "path": path.display().to_string(),
                                "report": report,
                            })
                        })
                        .collect::<Vec<_>>(),
                )
            }
            .map_err(|e| e.to_string())?;
            let text = serde_json::to_string_pretty(&value).map_err(|e| e.to_string())?;
            println!("{}", text);
        }
        OutputFormat::Text => {
            let many = reports.len() > 1;
            for (i, (path, report)) in reports.iter().enumerate() {
                if many {
                    if i > 0 {
                        println!();
                    }
                    println!("== {} ==", path.display());
                }
                print_report(report);
            }
        }
    }

    Ok(())
}
