use std::collections::BTreeSet;

use serde::Serialize;

use crate::adjacency::AdjacencyIndex;
use crate::config::{PreparedSnapshot, Settings, SnapshotFile};
use crate::error::{ConfigError, ValidationError, Warning};
use crate::health::{HealthEvaluator, HealthSummary};
use crate::impact::{Direction, ImpactPropagator};
use crate::model::{Health, ServiceHealthResult, ServiceId};
use crate::topology::{SnapshotInput, TopologySnapshot};
use crate::view::{FilteredView, ViewFilter};

/// Everything computed for one snapshot: per-service health, rollup, and the filtered view
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EngineReport {
    pub application: Option<String>,
    pub application_health: Health,
    pub summary: HealthSummary,
    pub services: Vec<ServiceHealthResult>,
    pub view: FilteredView,
    pub warnings: Vec<Warning>,
    pub passes: usize,
    pub converged: bool,
}

impl EngineReport {
    pub fn service(&self, id: &str) -> Option<&ServiceHealthResult> {
        self.services.iter().find(|s| s.service_id == id)
    }
}

/// Stateless evaluator. Holds settings only; every call builds its own snapshot and index.
#[derive(Clone, Debug, Default)]
pub struct Engine {
    settings: Settings,
}

impl Engine {
    pub fn new(settings: Settings) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self { settings })
    }

    /// Engine configured from a snapshot file's `settings` block
    pub fn for_file(file: &SnapshotFile) -> Result<Self, ConfigError> {
        Self::new(file.settings.clone())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn evaluate(
        &self,
        input: &SnapshotInput,
        view: Option<&str>,
    ) -> Result<EngineReport, ValidationError> {
        self.run(input, Vec::new(), view)
    }

    /// Evaluate a prepared snapshot, carrying its preparation warnings into the report.
    pub fn evaluate_prepared(
        &self,
        prepared: &PreparedSnapshot,
        view: Option<&str>,
    ) -> Result<EngineReport, ValidationError> {
        self.run(&prepared.input, prepared.warnings.clone(), view)
    }

    /// Closure of `start` in `direction` over the validated snapshot
    pub fn impact<S: AsRef<str>>(
        &self,
        input: &SnapshotInput,
        start: &[S],
        direction: Direction,
    ) -> Result<BTreeSet<ServiceId>, ValidationError> {
        let snapshot = TopologySnapshot::build(input)?;
        let index = AdjacencyIndex::build(&snapshot);
        Ok(ImpactPropagator::new(&snapshot, &index).closure(start, direction))
    }

    fn run(
        &self,
        input: &SnapshotInput,
        mut warnings: Vec<Warning>,
        view: Option<&str>,
    ) -> Result<EngineReport, ValidationError> {
        let snapshot = TopologySnapshot::build(input)?;
        warnings.extend_from_slice(snapshot.warnings());

        let index = AdjacencyIndex::build(&snapshot);
        let evaluation = HealthEvaluator::new(&snapshot, &index)
            .with_policy(self.settings.propagation)
            .evaluate();
        if !evaluation.converged {
            warnings.push(Warning::NotConverged {
                passes: evaluation.passes,
            });
        }

        let requested = view.or(self.settings.default_view.as_deref());
        let filtered = ViewFilter::new(&snapshot, &index, &evaluation.results).apply(requested);
        if filtered.fell_back {
            warnings.push(Warning::UnknownViewMode {
                requested: requested.unwrap_or_default().to_string(),
            });
        }

        let summary = HealthSummary::from_results(&evaluation.results);
        tracing::info!(
            application = snapshot.application().unwrap_or("-"),
            health = %summary.application_health(),
            services = summary.total_services,
            down = summary.down,
            impacted = summary.impacted,
            view = %filtered.mode,
            "snapshot evaluated"
        );

        Ok(EngineReport {
            application: snapshot.application().map(str::to_string),
            application_health: summary.application_health(),
            summary,
            services: evaluation.results,
            view: filtered,
            warnings,
            passes: evaluation.passes,
            converged: evaluation.converged,
        })
    }
}
