//! Service health evaluation
//!
//! Each service gets a direct status from its own bindings, then hard-dependency
//! impact is relaxed to a fixed point. Cycles are allowed: the relaxation is
//! monotone and bounded to `service count + 1` passes. With a validated policy
//! it settles within `service count` passes.

use serde::{Deserialize, Serialize};

use crate::adjacency::{AdjacencyIndex, Link};
use crate::error::ConfigError;
use crate::model::{Health, Reason, ServiceHealthResult, ServiceId};
use crate::topology::{Binding, TopologySnapshot};

/// How a hard-dependency child's health maps onto its parent
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagationPolicy {
    #[serde(with = "lowercase_health")]
    pub on_child_down: Health,
    #[serde(with = "lowercase_health")]
    pub on_child_impacted: Health,
    #[serde(with = "lowercase_health")]
    pub on_child_degraded: Health,
}

impl Default for PropagationPolicy {
    fn default() -> Self {
        Self {
            on_child_down: Health::Impacted,
            on_child_impacted: Health::Impacted,
            on_child_degraded: Health::Up,
        }
    }
}

impl PropagationPolicy {
    /// What a child in `child` state contributes to its parent
    pub fn contribution(&self, child: Health) -> Health {
        match child {
            Health::Up => Health::Up,
            Health::Degraded => self.on_child_degraded,
            Health::Impacted => self.on_child_impacted,
            Health::Down => self.on_child_down,
        }
    }

    /// The mapping must be monotone and never escalate: a child contributes at
    /// most its own state. Both hold for every accepted policy, which keeps the
    /// relaxation within `service count` passes even around cycles.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, mapped, child) in [
            ("on_child_degraded", self.on_child_degraded, Health::Degraded),
            ("on_child_impacted", self.on_child_impacted, Health::Impacted),
        ] {
            if mapped > child {
                return Err(ConfigError::InvalidPolicy {
                    reason: format!("{} ({}) is worse than the child's own state", field, mapped),
                });
            }
        }
        if self.on_child_degraded > self.on_child_impacted {
            return Err(ConfigError::InvalidPolicy {
                reason: format!(
                    "on_child_degraded ({}) is worse than on_child_impacted ({})",
                    self.on_child_degraded, self.on_child_impacted
                ),
            });
        }
        if self.on_child_impacted > self.on_child_down {
            return Err(ConfigError::InvalidPolicy {
                reason: format!(
                    "on_child_impacted ({}) is worse than on_child_down ({})",
                    self.on_child_impacted, self.on_child_down
                ),
            });
        }
        Ok(())
    }
}

mod lowercase_health {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::model::Health;

    pub fn serialize<S: Serializer>(h: &Health, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&h.label().to_lowercase())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Health, D::Error> {
        let raw = String::deserialize(d)?;
        match raw.trim().to_lowercase().as_str() {
            "up" => Ok(Health::Up),
            "degraded" => Ok(Health::Degraded),
            "impacted" => Ok(Health::Impacted),
            "down" => Ok(Health::Down),
            other => Err(serde::de::Error::unknown_variant(
                other,
                &["up", "degraded", "impacted", "down"],
            )),
        }
    }
}

/// Direct status from a service's own bindings
pub fn direct_status<'a>(bindings: impl IntoIterator<Item = &'a Binding>) -> Health {
    let mut status = Health::Up;
    for b in bindings {
        if b.health.is_down() {
            return Health::Down;
        }
        if !b.health.is_up() {
            status = Health::Degraded;
        }
    }
    status
}

/// Result of one evaluation pass over a snapshot
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    /// One result per service, in registration order
    pub results: Vec<ServiceHealthResult>,
    /// Relaxation passes run
    pub passes: usize,
    /// Whether the fixed point was reached within the pass bound
    pub converged: bool,
}

impl Evaluation {
    pub fn get(&self, id: &str) -> Option<&ServiceHealthResult> {
        self.results.iter().find(|r| r.service_id == id)
    }

    pub fn health_of(&self, id: &str) -> Option<Health> {
        self.get(id).map(|r| r.health)
    }
}

pub struct HealthEvaluator<'a> {
    snapshot: &'a TopologySnapshot,
    index: &'a AdjacencyIndex,
    policy: PropagationPolicy,
}

impl<'a> HealthEvaluator<'a> {
    pub fn new(snapshot: &'a TopologySnapshot, index: &'a AdjacencyIndex) -> Self {
        Self {
            snapshot,
            index,
            policy: PropagationPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: PropagationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn evaluate(&self) -> Evaluation {
        let services = self.snapshot.services();
        let n = services.len();

        // Bindings grouped by service position, keeping input order within each group
        let mut bindings: Vec<Vec<&Binding>> = vec![Vec::new(); n];
        for b in self.snapshot.bindings() {
            if let Some(i) = self.snapshot.position(&b.service_id) {
                bindings[i].push(b);
            }
        }

        let hard_children: Vec<Vec<usize>> = services
            .iter()
            .map(|s| self.hard_neighbours(self.index.children_of(&s.id)))
            .collect();
        let hard_parents: Vec<Vec<usize>> = services
            .iter()
            .map(|s| self.hard_neighbours(self.index.parents_of(&s.id)))
            .collect();

        let direct: Vec<Health> = bindings.iter().map(|bs| direct_status(bs.iter().copied())).collect();

        let max_passes = n + 1;
        let mut effective = direct.clone();
        let mut passes = 0;
        let mut converged = false;
        while passes < max_passes {
            passes += 1;
            let next: Vec<Health> = (0..n)
                .map(|i| {
                    hard_children[i].iter().fold(direct[i], |acc, &c| {
                        acc.worst(self.policy.contribution(effective[c]))
                    })
                })
                .collect();
            if next == effective {
                converged = true;
                break;
            }
            effective = next;
        }

        if converged {
            tracing::debug!(services = n, passes, "health propagation converged");
        } else {
            tracing::warn!(services = n, passes, "health propagation hit the pass bound");
        }

        let results = services
            .iter()
            .enumerate()
            .map(|(i, svc)| {
                let health = effective[i];
                let mut reasons = Vec::new();
                if !health.is_up() {
                    reasons.extend(bindings[i].iter().filter(|b| !b.health.is_up()).map(|b| {
                        Reason::Binding {
                            monitor_type: b.monitor_type.clone(),
                            monitor_ref: b.monitor_ref.clone(),
                            display_name: b.display_name.clone(),
                            health: b.health.clone(),
                        }
                    }));
                    reasons.extend(
                        hard_children[i]
                            .iter()
                            .filter(|&&c| !self.policy.contribution(effective[c]).is_up())
                            .map(|&c| Reason::Dependency {
                                child_service_id: services[c].id.clone(),
                                child_health: effective[c],
                            }),
                    );
                }

                let affected_services: Vec<ServiceId> =
                    if self.policy.contribution(health).is_up() {
                        Vec::new()
                    } else {
                        hard_parents[i]
                            .iter()
                            .filter(|&&p| !effective[p].is_up())
                            .map(|&p| services[p].id.clone())
                            .collect()
                    };

                ServiceHealthResult {
                    service_id: svc.id.clone(),
                    name: svc.name.clone(),
                    criticality: svc.criticality,
                    health,
                    reasons,
                    affected_services,
                }
            })
            .collect();

        Evaluation {
            results,
            passes,
            converged,
        }
    }

    /// Positions of propagating neighbours, sorted into registration order
    fn hard_neighbours(&self, links: &[Link]) -> Vec<usize> {
        let mut out: Vec<usize> = links
            .iter()
            .filter(|l| l.propagates())
            .filter_map(|l| self.snapshot.position(&l.service_id))
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}

/// Per-state service counts for an application
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSummary {
    pub total_services: usize,
    pub up: usize,
    pub degraded: usize,
    pub impacted: usize,
    pub down: usize,
}

impl HealthSummary {
    pub fn from_results(results: &[ServiceHealthResult]) -> Self {
        let mut summary = Self {
            total_services: results.len(),
            ..Self::default()
        };
        for r in results {
            match r.health {
                Health::Up => summary.up += 1,
                Health::Degraded => summary.degraded += 1,
                Health::Impacted => summary.impacted += 1,
                Health::Down => summary.down += 1,
            }
        }
        summary
    }

    /// Worst state present; UP for an application with no services
    pub fn application_health(&self) -> Health {
        if self.down > 0 {
            Health::Down
        } else if self.impacted > 0 {
            Health::Impacted
        } else if self.degraded > 0 {
            Health::Degraded
        } else {
            Health::Up
        }
    }
}
