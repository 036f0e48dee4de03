use std::collections::BTreeSet;

use svcimpact_core::model::{Health, ServiceHealthResult};
use svcimpact_core::EngineReport;

const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[2m";

fn health_color(health: Health) -> &'static str {
    match health {
        Health::Up => "\x1b[32m",
        Health::Degraded => "\x1b[33m",
        Health::Impacted => "\x1b[35m",
        Health::Down => "\x1b[31m",
    }
}

fn health_icon(health: Health) -> &'static str {
    match health {
        Health::Up => "●",
        Health::Degraded => "◐",
        Health::Impacted => "◎",
        Health::Down => "✗",
    }
}

pub fn print_report(report: &EngineReport) {
    let app = report.application.as_deref().unwrap_or("(unnamed)");
    let color = health_color(report.application_health);
    println!(
        "{} {}{}{}",
        app, color, report.application_health, RESET
    );
    println!(
        "  {} services: {} up, {} degraded, {} impacted, {} down",
        report.summary.total_services,
        report.summary.up,
        report.summary.degraded,
        report.summary.impacted,
        report.summary.down
    );
    println!();

    let visible: BTreeSet<&str> = report
        .view
        .visible_service_ids
        .iter()
        .map(String::as_str)
        .collect();

    for result in report
        .services
        .iter()
        .filter(|r| visible.contains(r.service_id.as_str()))
    {
        print_service(result);
    }

    println!();
    let mut view_line = format!(
        "view: {} ({} of {} services, {} edges)",
        report.view.mode,
        report.view.visible_service_ids.len(),
        report.summary.total_services,
        report.view.visible_edges.len()
    );
    if report.view.fell_back {
        view_line.push_str(" [fallback]");
    }
    println!("{}{}{}", DIM, view_line, RESET);

    if !report.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for warning in &report.warnings {
            println!("  - {}", warning);
        }
    }
}

fn print_service(result: &ServiceHealthResult) {
    let color = health_color(result.health);
    println!(
        "  {}{}{} {:<24} {:<9} {}{}{}",
        color,
        health_icon(result.health),
        RESET,
        result.service_id,
        result.criticality,
        color,
        result.health,
        RESET
    );
    for reason in &result.reasons {
        println!("    └─ {}", reason);
    }
    if !result.affected_services.is_empty() {
        println!("    affects: {}", result.affected_services.join(", "));
    }
}
