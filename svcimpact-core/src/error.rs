use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ServiceId;

/// Fatal problems with a snapshot. An invalid snapshot is never evaluated.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("service with empty id at position {position}")]
    EmptyServiceId { position: usize },

    #[error("service '{id}' is registered more than once")]
    DuplicateService { id: ServiceId },

    #[error("dependency {parent} -> {child} references unknown service '{missing}'")]
    UnknownDependencyService {
        parent: ServiceId,
        child: ServiceId,
        missing: ServiceId,
    },

    #[error("dependency {parent} -> {child} has invalid type '{value}' (expected hard or soft)")]
    InvalidDependencyType {
        parent: ServiceId,
        child: ServiceId,
        value: String,
    },

    #[error("binding {monitor_type}:{monitor_ref} references unknown service '{service_id}'")]
    UnknownBindingService {
        service_id: ServiceId,
        monitor_type: String,
        monitor_ref: String,
    },
}

/// Snapshot file and settings errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no snapshot file found, searched: {searched:?}")]
    NotFound { searched: Vec<PathBuf> },

    #[error("unsupported snapshot format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("invalid propagation policy: {reason}")]
    InvalidPolicy { reason: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Non-fatal data anomaly. Attached to results for diagnostics; never blocks evaluation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    SelfLoopDropped {
        service_id: ServiceId,
    },
    DuplicateEdgeCollapsed {
        parent: ServiceId,
        child: ServiceId,
    },
    DuplicateBindingCollapsed {
        service_id: ServiceId,
        monitor_type: String,
        monitor_ref: String,
    },
    SuggestionShadowed {
        parent: ServiceId,
        child: ServiceId,
    },
    SuggestionBelowConfidence {
        parent: ServiceId,
        child: ServiceId,
        confidence: u32,
        threshold: u32,
    },
    SuggestionUnknownService {
        parent: ServiceId,
        child: ServiceId,
        missing: ServiceId,
    },
    SuggestionInvalidType {
        parent: ServiceId,
        child: ServiceId,
        value: String,
    },
    UnknownViewMode {
        requested: String,
    },
    NotConverged {
        passes: usize,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfLoopDropped { service_id } => {
                write!(f, "self-loop on '{}' dropped", service_id)
            }
            Self::DuplicateEdgeCollapsed { parent, child } => {
                write!(f, "duplicate edge {} -> {} collapsed", parent, child)
            }
            Self::DuplicateBindingCollapsed {
                service_id,
                monitor_type,
                monitor_ref,
            } => write!(
                f,
                "duplicate binding {}:{} on '{}' collapsed",
                monitor_type, monitor_ref, service_id
            ),
            Self::SuggestionShadowed { parent, child } => {
                write!(f, "suggested edge {} -> {} already registered", parent, child)
            }
            Self::SuggestionBelowConfidence {
                parent,
                child,
                confidence,
                threshold,
            } => write!(
                f,
                "suggested edge {} -> {} skipped (confidence {} < {})",
                parent, child, confidence, threshold
            ),
            Self::SuggestionUnknownService {
                parent,
                child,
                missing,
            } => write!(
                f,
                "suggested edge {} -> {} skipped (unknown service '{}')",
                parent, child, missing
            ),
            Self::SuggestionInvalidType {
                parent,
                child,
                value,
            } => write!(
                f,
                "suggested edge {} -> {} skipped (invalid type '{}')",
                parent, child, value
            ),
            Self::UnknownViewMode { requested } => {
                write!(f, "unknown view mode '{}', showing all", requested)
            }
            Self::NotConverged { passes } => {
                write!(f, "health propagation did not settle after {} passes", passes)
            }
        }
    }
}
