use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::adjacency::AdjacencyIndex;
use crate::model::ServiceId;
use crate::topology::TopologySnapshot;

/// Which way to walk the dependency graph
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Who is affected if the start set fails (follows parents)
    Upstream,
    /// What the start set depends on (follows children)
    Downstream,
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "upstream" | "up" => Ok(Self::Upstream),
            "downstream" | "down" => Ok(Self::Downstream),
            other => Err(format!("unknown direction '{}'", other)),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upstream => write!(f, "upstream"),
            Self::Downstream => write!(f, "downstream"),
        }
    }
}

/// Transitive reachability over every edge in the working set (hard, soft and suggested).
pub struct ImpactPropagator<'a> {
    snapshot: &'a TopologySnapshot,
    index: &'a AdjacencyIndex,
}

impl<'a> ImpactPropagator<'a> {
    pub fn new(snapshot: &'a TopologySnapshot, index: &'a AdjacencyIndex) -> Self {
        Self { snapshot, index }
    }

    /// Breadth-first closure of `start` in `direction`. The start services are part of
    /// the result. Ids not present in the snapshot are ignored.
    pub fn closure<I, S>(&self, start: I, direction: Direction) -> BTreeSet<ServiceId>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut visited: BTreeSet<ServiceId> = BTreeSet::new();
        let mut queue: VecDeque<ServiceId> = VecDeque::new();

        for id in start {
            let id = id.as_ref().trim();
            if !self.snapshot.contains(id) {
                tracing::debug!(service = %id, "ignoring unknown service in impact start set");
                continue;
            }
            if visited.insert(id.to_string()) {
                queue.push_back(id.to_string());
            }
        }

        while let Some(current) = queue.pop_front() {
            let next = match direction {
                Direction::Upstream => self.index.parents_of(&current),
                Direction::Downstream => self.index.children_of(&current),
            };
            for link in next {
                if visited.insert(link.service_id.clone()) {
                    queue.push_back(link.service_id.clone());
                }
            }
        }

        tracing::trace!(%direction, reached = visited.len(), "impact closure computed");
        visited
    }

    pub fn upstream<I, S>(&self, start: I) -> BTreeSet<ServiceId>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.closure(start, Direction::Upstream)
    }

    pub fn downstream<I, S>(&self, start: I) -> BTreeSet<ServiceId>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.closure(start, Direction::Downstream)
    }
}
