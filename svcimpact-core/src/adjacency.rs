use std::collections::BTreeMap;

use crate::model::{DependencyType, EdgeOrigin, ServiceId};
use crate::topology::{Edge, TopologySnapshot};

/// One neighbour in the adjacency lists
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
    pub service_id: ServiceId,
    pub kind: DependencyType,
    pub origin: EdgeOrigin,
}

impl Link {
    pub fn propagates(&self) -> bool {
        self.kind == DependencyType::Hard && self.origin == EdgeOrigin::Real
    }
}

/// Parent -> children and child -> parents lookups for one snapshot.
///
/// Built fresh per snapshot in a single pass over the edge list; never cached
/// across snapshots.
#[derive(Clone, Debug, Default)]
pub struct AdjacencyIndex {
    children_of: BTreeMap<ServiceId, Vec<Link>>,
    parents_of: BTreeMap<ServiceId, Vec<Link>>,
}

impl AdjacencyIndex {
    pub fn build(snapshot: &TopologySnapshot) -> Self {
        Self::from_edges(snapshot.edges())
    }

    /// Build from an already deduplicated edge list. List order follows edge order.
    pub fn from_edges(edges: &[Edge]) -> Self {
        let mut index = Self::default();
        for edge in edges {
            index
                .children_of
                .entry(edge.parent.clone())
                .or_default()
                .push(Link {
                    service_id: edge.child.clone(),
                    kind: edge.kind,
                    origin: edge.origin,
                });
            index
                .parents_of
                .entry(edge.child.clone())
                .or_default()
                .push(Link {
                    service_id: edge.parent.clone(),
                    kind: edge.kind,
                    origin: edge.origin,
                });
        }
        index
    }

    /// Services `id` depends on
    pub fn children_of(&self, id: &str) -> &[Link] {
        self.children_of.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Services depending on `id`
    pub fn parents_of(&self, id: &str) -> &[Link] {
        self.parents_of.get(id).map(Vec::as_slice).unwrap_or(&[])
    }
}
