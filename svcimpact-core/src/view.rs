//! Projection of the evaluated topology into a reduced node/edge set for rendering

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::adjacency::AdjacencyIndex;
use crate::impact::ImpactPropagator;
use crate::model::{Health, ServiceHealthResult, ServiceId};
use crate::topology::{Edge, TopologySnapshot};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Every service and edge
    #[default]
    All,
    /// Upstream closure of DOWN services
    DownOnly,
    /// Unhealthy services plus everything upstream and downstream of them
    Attention,
    /// Upstream closure of DOWN services plus every critical-tier service
    CriticalPath,
}

impl ViewMode {
    pub const ALL_MODES: [ViewMode; 4] = [
        ViewMode::All,
        ViewMode::DownOnly,
        ViewMode::Attention,
        ViewMode::CriticalPath,
    ];

    /// Parse a mode name. Case and `-`/`_` are not significant.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().replace('-', "_").as_str() {
            "all" => Some(Self::All),
            "down_only" => Some(Self::DownOnly),
            "attention" => Some(Self::Attention),
            "critical_path" => Some(Self::CriticalPath),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::DownOnly => "down_only",
            Self::Attention => "attention",
            Self::CriticalPath => "critical_path",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visible subset of the topology for one mode
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FilteredView {
    /// Mode actually applied
    pub mode: ViewMode,
    /// Mode name as requested, if any
    pub requested: Option<String>,
    /// Set when the requested name was not recognized and `all` was used instead
    pub fell_back: bool,
    /// Visible services in registration order
    pub visible_service_ids: Vec<ServiceId>,
    /// Edges whose endpoints are both visible
    pub visible_edges: Vec<Edge>,
}

pub struct ViewFilter<'a> {
    snapshot: &'a TopologySnapshot,
    index: &'a AdjacencyIndex,
    results: &'a [ServiceHealthResult],
}

impl<'a> ViewFilter<'a> {
    pub fn new(
        snapshot: &'a TopologySnapshot,
        index: &'a AdjacencyIndex,
        results: &'a [ServiceHealthResult],
    ) -> Self {
        Self {
            snapshot,
            index,
            results,
        }
    }

    /// Apply a mode by name. Unknown names fall back to `all` with `fell_back` set.
    pub fn apply(&self, requested: Option<&str>) -> FilteredView {
        let (mode, fell_back) = match requested {
            None => (ViewMode::All, false),
            Some(name) => match ViewMode::parse(name) {
                Some(mode) => (mode, false),
                None => {
                    tracing::warn!(requested = %name, "unknown view mode, falling back to all");
                    (ViewMode::All, true)
                }
            },
        };

        let mut view = self.apply_mode(mode);
        view.requested = requested.map(str::to_string);
        view.fell_back = fell_back;
        view
    }

    pub fn apply_mode(&self, mode: ViewMode) -> FilteredView {
        let visible: BTreeSet<ServiceId> = match mode {
            ViewMode::All => self.snapshot.services().iter().map(|s| s.id.clone()).collect(),
            ViewMode::DownOnly => self.propagator().upstream(self.with_health(&[Health::Down])),
            ViewMode::Attention => {
                let unhealthy =
                    self.with_health(&[Health::Down, Health::Impacted, Health::Degraded]);
                let prop = self.propagator();
                let mut visible = prop.upstream(&unhealthy);
                visible.extend(prop.downstream(&unhealthy));
                visible
            }
            ViewMode::CriticalPath => {
                let mut visible = self.propagator().upstream(self.with_health(&[Health::Down]));
                visible.extend(
                    self.snapshot
                        .services()
                        .iter()
                        .filter(|s| s.criticality.is_max_tier())
                        .map(|s| s.id.clone()),
                );
                visible
            }
        };

        let visible_service_ids: Vec<ServiceId> = self
            .snapshot
            .services()
            .iter()
            .filter(|s| visible.contains(&s.id))
            .map(|s| s.id.clone())
            .collect();
        let visible_edges: Vec<Edge> = self
            .snapshot
            .edges()
            .iter()
            .filter(|e| visible.contains(&e.parent) && visible.contains(&e.child))
            .cloned()
            .collect();

        tracing::debug!(
            %mode,
            services = visible_service_ids.len(),
            edges = visible_edges.len(),
            "view filtered"
        );

        FilteredView {
            mode,
            requested: None,
            fell_back: false,
            visible_service_ids,
            visible_edges,
        }
    }

    fn propagator(&self) -> ImpactPropagator<'a> {
        ImpactPropagator::new(self.snapshot, self.index)
    }

    fn with_health(&self, states: &[Health]) -> Vec<ServiceId> {
        self.results
            .iter()
            .filter(|r| states.contains(&r.health))
            .map(|r| r.service_id.clone())
            .collect()
    }
}
