//! Externally suggested topology: inferred dependency edges and binding targets

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::Warning;
use crate::model::{
    Criticality, DependencySpec, DependencyType, EdgeOrigin, ServiceId, ServiceSpec,
    SuggestedDependency,
};
use crate::monitor::{normalize_key, normalize_monitor_type, normalize_ref_for_type};

pub const DEFAULT_MIN_CONFIDENCE: u32 = 70;

/// Working edge list produced by merging suggestions into registered dependencies
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergedEdges {
    pub edges: Vec<DependencySpec>,
    pub warnings: Vec<Warning>,
}

/// Merge suggested edges into the registered dependency list.
///
/// Registered edges come first and are passed through untouched. Suggestions at or
/// above `min_confidence` are appended tagged `EdgeOrigin::Suggested`. A suggestion
/// for a pair that is already registered, naming a service outside `services`, or
/// carrying an unparseable type is dropped with a warning.
pub fn merge_suggested(
    services: &[ServiceSpec],
    dependencies: &[DependencySpec],
    suggestions: &[SuggestedDependency],
    min_confidence: u32,
) -> MergedEdges {
    let threshold = min_confidence.min(100);
    let registered: BTreeSet<(&str, &str)> = dependencies
        .iter()
        .filter(|d| d.origin == EdgeOrigin::Real)
        .map(|d| (d.parent.trim(), d.child.trim()))
        .collect();
    let known: BTreeSet<&str> = services.iter().map(|s| s.id.trim()).collect();

    let mut merged = MergedEdges {
        edges: dependencies.to_vec(),
        warnings: Vec::new(),
    };

    for s in suggestions {
        let parent = s.parent.trim();
        let child = s.child.trim();
        let confidence = s.confidence.min(100);

        if let Some(missing) = [parent, child].into_iter().find(|id| !known.contains(id)) {
            tracing::warn!(%parent, %child, %missing, "suggested edge names an unknown service");
            merged.warnings.push(Warning::SuggestionUnknownService {
                parent: parent.to_string(),
                child: child.to_string(),
                missing: missing.to_string(),
            });
            continue;
        }
        if DependencyType::parse(&s.dependency_type).is_none() {
            tracing::warn!(%parent, %child, value = %s.dependency_type, "suggested edge has an invalid type");
            merged.warnings.push(Warning::SuggestionInvalidType {
                parent: parent.to_string(),
                child: child.to_string(),
                value: s.dependency_type.clone(),
            });
            continue;
        }
        if registered.contains(&(parent, child)) {
            tracing::debug!(%parent, %child, "suggested edge already registered");
            merged.warnings.push(Warning::SuggestionShadowed {
                parent: parent.to_string(),
                child: child.to_string(),
            });
            continue;
        }
        if confidence < threshold {
            tracing::debug!(%parent, %child, confidence, threshold, "suggested edge below confidence");
            merged.warnings.push(Warning::SuggestionBelowConfidence {
                parent: parent.to_string(),
                child: child.to_string(),
                confidence,
                threshold,
            });
            continue;
        }

        merged.edges.push(DependencySpec {
            parent: parent.to_string(),
            child: child.to_string(),
            dependency_type: s.dependency_type.clone(),
            origin: EdgeOrigin::Suggested,
        });
    }

    merged
}

/// Candidate service for an unbound monitor
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecommendation {
    pub service_id: ServiceId,
    pub service_name: String,
    pub score: u32,
}

/// Rank services as binding targets for a monitor. At most three, best first.
pub fn recommend_services(
    services: &[ServiceSpec],
    monitor_type: &str,
    monitor_ref: &str,
) -> Vec<ServiceRecommendation> {
    let kind = normalize_monitor_type(monitor_type);
    let mtype = kind.map(|k| k.as_str().to_string()).unwrap_or_else(|| normalize_key(monitor_type));
    let mref = normalize_key(&normalize_ref_for_type(kind, monitor_ref));

    let mut scored: Vec<ServiceRecommendation> = services
        .iter()
        .map(|s| {
            let name = s.name.as_deref().unwrap_or(&s.id);
            let st = s.service_type.as_deref().map(normalize_key).unwrap_or_default();
            let sn = normalize_key(name);

            let mut score = 0;
            if !mtype.is_empty() && !st.is_empty() && st.contains(&mtype) {
                score += 4;
            }
            if !mtype.is_empty() && sn.contains(&mtype) {
                score += 3;
            }
            if !sn.is_empty() && (mref.contains(&sn) || sn.contains(&mref)) {
                score += 2;
            }
            if s.criticality == Criticality::Critical {
                score += 1;
            }

            ServiceRecommendation {
                service_id: s.id.clone(),
                service_name: name.to_string(),
                score,
            }
        })
        .filter(|r| r.score > 0)
        .collect();

    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(3);
    scored
}
