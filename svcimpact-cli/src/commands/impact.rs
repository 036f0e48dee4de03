use std::path::PathBuf;

use svcimpact_core::Engine;
use svcimpact_core::impact::Direction;
use svcimpact_core::suggest::recommend_services;

use super::load_snapshot;
use crate::OutputFormat;

pub fn run_impact(
    file: Option<PathBuf>,
    from: &[String],
    direction: Direction,
    format: OutputFormat,
) -> Result<(), String> {
    let (_, snapshot) = load_snapshot(file)?;
    let engine = Engine::for_file(&snapshot).map_err(|e| e.to_string())?;
    let prepared = snapshot.prepare();

    let unknown: Vec<&String> = from
        .iter()
        .filter(|id| !prepared.input.services.iter().any(|s| &s.id == *id))
        .collect();
    for id in &unknown {
        tracing::warn!(service = %id, "unknown service ignored");
    }

    let reached = engine
        .impact(&prepared.input, from, direction)
        .map_err(|e| e.to_string())?;

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "direction": direction,
                "from": from,
                "services": reached,
            });
            let text = serde_json::to_string_pretty(&value).map_err(|e| e.to_string())?;
            println!("{}", text);
        }
        OutputFormat::Text => {
            println!("{} of {}: {} service(s)", direction, from.join(", "), reached.len());
            for id in &reached {
                println!("  {}", id);
            }
        }
    }

    Ok(())
}

pub fn run_recommend(
    file: Option<PathBuf>,
    monitor_type: &str,
    monitor_ref: &str,
) -> Result<(), String> {
    let (_, snapshot) = load_snapshot(file)?;
    let recommendations = recommend_services(&snapshot.services, monitor_type, monitor_ref);

    if recommendations.is_empty() {
        println!("No matching services for {}:{}", monitor_type, monitor_ref);
        return Ok(());
    }

    println!("Candidates for {}:{}", monitor_type, monitor_ref);
    for rec in &recommendations {
        println!("  {:<24} {:<24} score {}", rec.service_id, rec.service_name, rec.score);
    }
    Ok(())
}
