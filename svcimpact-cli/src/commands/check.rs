//! Snapshot validation and binding audit, printed as a checklist

use std::path::PathBuf;

use svcimpact_core::quality::audit_bindings;
use svcimpact_core::{Engine, SnapshotFile, TopologySnapshot, Warning};

use super::read_snapshot;

#[derive(Debug)]
struct Check {
    name: String,
    passed: bool,
    message: String,
}

impl Check {
    fn ok(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            message: message.into(),
        }
    }

    fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            message: message.into(),
        }
    }
}

/// Everything `check` reports for one snapshot
#[derive(Debug, Default)]
struct CheckReport {
    checks: Vec<Check>,
    details: Vec<String>,
    warnings: Vec<Warning>,
}

impl CheckReport {
    /// Binding audit findings are advisory; any other failed check is fatal.
    fn is_fatal(&self) -> bool {
        self.checks.iter().any(|c| !c.passed && c.name != "bindings")
    }
}

fn print_check(check: &Check) {
    let icon = if check.passed { "✓" } else { "✗" };
    let color = if check.passed { "\x1b[32m" } else { "\x1b[31m" };
    let reset = "\x1b[0m";

    println!(
        "  {}{}{} {}: {}",
        color, icon, reset, check.name, check.message
    );
}

fn check_snapshot(snapshot: &SnapshotFile) -> CheckReport {
    let mut report = CheckReport::default();
    report.checks.push(Check::ok(
        "parse",
        format!(
            "{} services, {} dependencies, {} bindings",
            snapshot.services.len(),
            snapshot.dependencies.len(),
            snapshot.bindings.len()
        ),
    ));

    report.checks.push(match Engine::for_file(snapshot) {
        Ok(_) => Check::ok("settings", "propagation policy is valid"),
        Err(e) => Check::fail("settings", e.to_string()),
    });

    let prepared = snapshot.prepare();
    report.warnings = prepared.warnings.clone();

    let topology = match TopologySnapshot::build(&prepared.input) {
        Ok(topology) => topology,
        Err(e) => {
            report.checks.push(Check::fail("topology", e.to_string()));
            return report;
        }
    };
    report.checks.push(Check::ok(
        "topology",
        format!("{} edges after normalization", topology.edges().len()),
    ));
    report.warnings.extend_from_slice(topology.warnings());

    let quality = audit_bindings(&topology);
    report.checks.push(if quality.is_clean() {
        Check::ok(
            "bindings",
            format!("{} of {} valid", quality.valid_bindings, quality.total_bindings),
        )
    } else {
        Check::fail(
            "bindings",
            format!(
                "{} unsupported, {} monitor(s) bound to several services",
                quality.unsupported.len(),
                quality.duplicates.len()
            ),
        )
    });

    for item in &quality.unsupported {
        report.details.push(format!(
            "unsupported monitor type '{}' ({}) on {}",
            item.monitor_type, item.monitor_ref, item.service_id
        ));
    }
    for dup in &quality.duplicates {
        report
            .details
            .push(format!("{} bound to {}", dup.monitor_key, dup.service_ids.join(", ")));
    }

    report
}

pub fn run_check(file: Option<PathBuf>) -> Result<(), String> {
    let (path, snapshot) = read_snapshot(file)?;
    println!("Snapshot: {}\n", path.display());

    let report = check_snapshot(&snapshot);

    for check in &report.checks {
        print_check(check);
    }
    for detail in &report.details {
        println!("    └─ {}", detail);
    }

    if !report.warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &report.warnings {
            println!("  - {}", warning);
        }
    }

    if report.is_fatal() {
        return Err("snapshot is invalid".to_string());
    }

    println!("\nSnapshot is valid.");
    Ok(())
}
