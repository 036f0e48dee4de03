//! Validated, immutable topology snapshot
//!
//! A snapshot is built once from raw input records and never mutated afterwards.
//! Construction rejects dangling references and unknown dependency types, and
//! normalizes the edge set (self-loops dropped, duplicate pairs collapsed).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, Warning};
use crate::model::{
    BindingHealth, BindingSpec, Criticality, DependencySpec, DependencyType, EdgeOrigin, ServiceId,
    ServiceSpec,
};

/// Raw engine input: everything one evaluation needs, scoped to one application
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotInput {
    #[serde(default)]
    pub application: Option<String>,
    #[serde(default)]
    pub services: Vec<ServiceSpec>,
    #[serde(default)]
    pub dependencies: Vec<DependencySpec>,
    #[serde(default)]
    pub bindings: Vec<BindingSpec>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    pub service_type: Option<String>,
    pub criticality: Criticality,
}

/// Edge in the working edge set. `parent` depends on `child`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Edge {
    pub parent: ServiceId,
    pub child: ServiceId,
    pub kind: DependencyType,
    pub origin: EdgeOrigin,
}

impl Edge {
    /// Whether a failing child propagates into the parent's health.
    /// Suggested edges are display-only regardless of their type.
    pub fn propagates(&self) -> bool {
        self.kind == DependencyType::Hard && self.origin == EdgeOrigin::Real
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Binding {
    pub service_id: ServiceId,
    pub monitor_type: String,
    pub monitor_ref: String,
    pub display_name: Option<String>,
    pub health: BindingHealth,
}

#[derive(Clone, Debug)]
pub struct TopologySnapshot {
    application: Option<String>,
    services: Vec<Service>,
    positions: BTreeMap<ServiceId, usize>,
    edges: Vec<Edge>,
    bindings: Vec<Binding>,
    warnings: Vec<Warning>,
}

impl TopologySnapshot {
    /// Validate raw input and build a snapshot.
    pub fn build(input: &SnapshotInput) -> Result<Self, ValidationError> {
        let mut warnings = Vec::new();

        let mut services = Vec::with_capacity(input.services.len());
        let mut positions = BTreeMap::new();
        for (position, spec) in input.services.iter().enumerate() {
            let id = spec.id.trim().to_string();
            if id.is_empty() {
                return Err(ValidationError::EmptyServiceId { position });
            }
            if positions.insert(id.clone(), services.len()).is_some() {
                return Err(ValidationError::DuplicateService { id });
            }
            services.push(Service {
                name: spec.name.clone().unwrap_or_else(|| id.clone()),
                id,
                service_type: spec.service_type.clone(),
                criticality: spec.criticality,
            });
        }

        let edges = build_edges(&input.dependencies, &positions, &mut warnings)?;
        let bindings = build_bindings(&input.bindings, &positions, &mut warnings)?;

        tracing::debug!(
            services = services.len(),
            edges = edges.len(),
            bindings = bindings.len(),
            warnings = warnings.len(),
            "snapshot built"
        );

        Ok(Self {
            application: input.application.clone(),
            services,
            positions,
            edges,
            bindings,
            warnings,
        })
    }

    pub fn application(&self) -> Option<&str> {
        self.application.as_deref()
    }

    /// Services in registration order
    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn service(&self, id: &str) -> Option<&Service> {
        self.position(id).map(|i| &self.services[i])
    }

    /// Registration index of a service
    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    /// Deduplicated edges in first-seen order
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

fn resolve_id(raw: &str, positions: &BTreeMap<ServiceId, usize>) -> Option<ServiceId> {
    let id = raw.trim();
    positions.contains_key(id).then(|| id.to_string())
}

fn build_edges(
    specs: &[DependencySpec],
    positions: &BTreeMap<ServiceId, usize>,
    warnings: &mut Vec<Warning>,
) -> Result<Vec<Edge>, ValidationError> {
    let mut edges: Vec<Edge> = Vec::with_capacity(specs.len());
    let mut seen: BTreeMap<(ServiceId, ServiceId), usize> = BTreeMap::new();

    for spec in specs {
        let missing = |id: &str| ValidationError::UnknownDependencyService {
            parent: spec.parent.clone(),
            child: spec.child.clone(),
            missing: id.trim().to_string(),
        };
        let parent = resolve_id(&spec.parent, positions).ok_or_else(|| missing(&spec.parent))?;
        let child = resolve_id(&spec.child, positions).ok_or_else(|| missing(&spec.child))?;
        let kind = DependencyType::parse(&spec.dependency_type).ok_or_else(|| {
            ValidationError::InvalidDependencyType {
                parent: parent.clone(),
                child: child.clone(),
                value: spec.dependency_type.clone(),
            }
        })?;

        if parent == child {
            tracing::warn!(service = %parent, "dropping self-loop dependency");
            warnings.push(Warning::SelfLoopDropped { service_id: parent });
            continue;
        }

        let edge = Edge {
            parent: parent.clone(),
            child: child.clone(),
            kind,
            origin: spec.origin,
        };

        match seen.get(&(parent.clone(), child.clone())).copied() {
            Some(i) => {
                tracing::warn!(%parent, %child, "collapsing duplicate dependency edge");
                warnings.push(Warning::DuplicateEdgeCollapsed { parent, child });
                merge_edge(&mut edges[i], edge);
            }
            None => {
                seen.insert((parent, child), edges.len());
                edges.push(edge);
            }
        }
    }

    Ok(edges)
}

/// Collapse a duplicate into an existing edge: real beats suggested, hard beats soft.
fn merge_edge(existing: &mut Edge, incoming: Edge) {
    match (existing.origin, incoming.origin) {
        (EdgeOrigin::Suggested, EdgeOrigin::Real) => *existing = incoming,
        (EdgeOrigin::Real, EdgeOrigin::Suggested) => {}
        _ => {
            if incoming.kind == DependencyType::Hard {
                existing.kind = DependencyType::Hard;
            }
        }
    }
}

fn build_bindings(
    specs: &[BindingSpec],
    positions: &BTreeMap<ServiceId, usize>,
    warnings: &mut Vec<Warning>,
) -> Result<Vec<Binding>, ValidationError> {
    let mut bindings: Vec<Binding> = Vec::with_capacity(specs.len());
    let mut seen: BTreeMap<(ServiceId, String, String), usize> = BTreeMap::new();

    for spec in specs {
        let service_id = resolve_id(&spec.service, positions).ok_or_else(|| {
            ValidationError::UnknownBindingService {
                service_id: spec.service.trim().to_string(),
                monitor_type: spec.monitor_type.clone(),
                monitor_ref: spec.monitor_ref.clone(),
            }
        })?;

        let health = spec.health.clone().unwrap_or(BindingHealth::Unknown);
        let key = (
            service_id.clone(),
            spec.monitor_type.trim().to_lowercase(),
            spec.monitor_ref.trim().to_lowercase(),
        );

        if let Some(&i) = seen.get(&key) {
            tracing::warn!(
                service = %service_id,
                monitor_type = %spec.monitor_type,
                monitor_ref = %spec.monitor_ref,
                "collapsing duplicate binding"
            );
            warnings.push(Warning::DuplicateBindingCollapsed {
                service_id,
                monitor_type: spec.monitor_type.clone(),
                monitor_ref: spec.monitor_ref.clone(),
            });
            if health.rank() > bindings[i].health.rank() {
                bindings[i].health = health;
            }
            continue;
        }

        seen.insert(key, bindings.len());
        bindings.push(Binding {
            service_id,
            monitor_type: spec.monitor_type.clone(),
            monitor_ref: spec.monitor_ref.clone(),
            display_name: spec.display_name.clone(),
            health,
        });
    }

    Ok(bindings)
}
