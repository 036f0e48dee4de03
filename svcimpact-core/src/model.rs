use std::fmt;

use serde::{Deserialize, Serialize};

pub type ServiceId = String;

/// Business criticality tier of a service, ordered `low < medium < high < critical`
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Criticality {
    #[serde(alias = "LOW", alias = "Low")]
    Low,
    #[serde(alias = "MEDIUM", alias = "Medium")]
    Medium,
    #[default]
    #[serde(alias = "HIGH", alias = "High")]
    High,
    #[serde(alias = "CRITICAL", alias = "Critical")]
    Critical,
}

impl Criticality {
    /// The highest tier; services at this tier are always on the critical path view.
    pub const MAX: Criticality = Criticality::Critical;

    pub fn is_max_tier(&self) -> bool {
        *self == Self::MAX
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a parent relies on a child
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    /// Child failure propagates into the parent's computed health
    Hard,
    /// Informational only; never changes computed health
    Soft,
}

impl DependencyType {
    /// Parse a raw dependency type, case-insensitive. Returns `None` for anything unrecognized.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "hard" => Some(Self::Hard),
            "soft" => Some(Self::Soft),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hard => "hard",
            Self::Soft => "soft",
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an edge in the working edge set came from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeOrigin {
    /// Registered dependency
    #[default]
    Real,
    /// Externally inferred dependency merged in for display
    Suggested,
}

/// Raw health signal attached to a monitoring binding by the health source.
///
/// Values other than `UP`/`DOWN`/`UNKNOWN`/`DEGRADED` are kept verbatim in `Other`
/// and treated as non-UP.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BindingHealth {
    Up,
    Down,
    Unknown,
    Degraded,
    Other(String),
}

impl BindingHealth {
    pub fn is_up(&self) -> bool {
        matches!(self, Self::Up)
    }

    pub fn is_down(&self) -> bool {
        matches!(self, Self::Down)
    }

    /// Severity rank used when collapsing duplicate bindings
    pub fn rank(&self) -> u8 {
        match self {
            Self::Up => 0,
            Self::Unknown | Self::Other(_) => 1,
            Self::Degraded => 2,
            Self::Down => 3,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::Unknown => "UNKNOWN",
            Self::Degraded => "DEGRADED",
            Self::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for BindingHealth {
    fn from(raw: String) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "UP" => Self::Up,
            "DOWN" => Self::Down,
            "UNKNOWN" => Self::Unknown,
            "DEGRADED" => Self::Degraded,
            _ => Self::Other(raw.trim().to_string()),
        }
    }
}

impl From<&str> for BindingHealth {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<BindingHealth> for String {
    fn from(h: BindingHealth) -> Self {
        match h {
            BindingHealth::Other(s) => s,
            other => other.label().to_string(),
        }
    }
}

impl fmt::Display for BindingHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Computed health of a service. Variant order is severity order: `Up < Degraded < Impacted < Down`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Health {
    #[default]
    Up,
    Degraded,
    Impacted,
    Down,
}

impl Health {
    pub fn worst(self, other: Health) -> Health {
        self.max(other)
    }

    pub fn is_up(&self) -> bool {
        matches!(self, Self::Up)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Up => "UP",
            Self::Degraded => "DEGRADED",
            Self::Impacted => "IMPACTED",
            Self::Down => "DOWN",
        }
    }
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn default_dependency_type() -> String {
    "hard".into()
}

/// Service as registered under an application
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub id: ServiceId,

    /// Display name (defaults to id)
    #[serde(default)]
    pub name: Option<String>,

    /// Free-form classification (api, db, queue, frontend, ...)
    #[serde(default)]
    pub service_type: Option<String>,

    #[serde(default)]
    pub criticality: Criticality,
}

impl ServiceSpec {
    pub fn new(id: impl Into<ServiceId>, criticality: Criticality) -> Self {
        Self {
            id: id.into(),
            name: None,
            service_type: None,
            criticality,
        }
    }

    pub fn with_type(mut self, service_type: impl Into<String>) -> Self {
        self.service_type = Some(service_type.into());
        self
    }
}

/// Directed dependency edge: `parent` relies on `child`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DependencySpec {
    #[serde(alias = "parent_service_id")]
    pub parent: ServiceId,

    #[serde(alias = "child_service_id")]
    pub child: ServiceId,

    /// Raw type string; validated when the snapshot is built
    #[serde(
        rename = "type",
        alias = "dependency_type",
        default = "default_dependency_type"
    )]
    pub dependency_type: String,

    #[serde(default)]
    pub origin: EdgeOrigin,
}

impl DependencySpec {
    pub fn new(parent: impl Into<ServiceId>, child: impl Into<ServiceId>, kind: DependencyType) -> Self {
        Self {
            parent: parent.into(),
            child: child.into(),
            dependency_type: kind.as_str().to_string(),
            origin: EdgeOrigin::Real,
        }
    }

    pub fn hard(parent: impl Into<ServiceId>, child: impl Into<ServiceId>) -> Self {
        Self::new(parent, child, DependencyType::Hard)
    }

    pub fn soft(parent: impl Into<ServiceId>, child: impl Into<ServiceId>) -> Self {
        Self::new(parent, child, DependencyType::Soft)
    }
}

/// Link from a service to an externally monitored entity
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BindingSpec {
    #[serde(alias = "service_id")]
    pub service: ServiceId,

    pub monitor_type: String,

    pub monitor_ref: String,

    #[serde(default)]
    pub display_name: Option<String>,

    /// Supplied by the health source; missing means not yet resolved
    #[serde(default)]
    pub health: Option<BindingHealth>,
}

impl BindingSpec {
    pub fn new(
        service: impl Into<ServiceId>,
        monitor_type: impl Into<String>,
        monitor_ref: impl Into<String>,
        health: BindingHealth,
    ) -> Self {
        Self {
            service: service.into(),
            monitor_type: monitor_type.into(),
            monitor_ref: monitor_ref.into(),
            display_name: None,
            health: Some(health),
        }
    }
}

/// Dependency inferred by an external system (e.g. asset reconciliation)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SuggestedDependency {
    #[serde(alias = "parent_service_id")]
    pub parent: ServiceId,

    #[serde(alias = "child_service_id")]
    pub child: ServiceId,

    #[serde(
        rename = "type",
        alias = "dependency_type",
        default = "default_dependency_type"
    )]
    pub dependency_type: String,

    /// 0-100; larger values are clamped
    pub confidence: u32,

    #[serde(default)]
    pub source: Option<String>,
}

/// One causal entry explaining why a service is not UP
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reason {
    /// A binding on the service itself reports a non-UP signal
    Binding {
        monitor_type: String,
        monitor_ref: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        display_name: Option<String>,
        health: BindingHealth,
    },
    /// A hard-dependency child whose health propagated to this service
    Dependency {
        child_service_id: ServiceId,
        child_health: Health,
    },
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binding {
                monitor_type,
                monitor_ref,
                health,
                ..
            } => write!(f, "{}:{} is {}", monitor_type, monitor_ref, health),
            Self::Dependency {
                child_service_id,
                child_health,
            } => write!(f, "depends on {} which is {}", child_service_id, child_health),
        }
    }
}

/// Computed health for a single service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceHealthResult {
    pub service_id: ServiceId,
    pub name: String,
    pub criticality: Criticality,
    pub health: Health,
    /// Bindings first, then propagated children; each group in registration order
    pub reasons: Vec<Reason>,
    /// Direct hard-edge parents that are not UP as a consequence of this service
    pub affected_services: Vec<ServiceId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_ordering() {
        assert!(Health::Down > Health::Impacted);
        assert!(Health::Impacted > Health::Degraded);
        assert!(Health::Degraded > Health::Up);
        assert_eq!(Health::Up.worst(Health::Impacted), Health::Impacted);
        assert_eq!(Health::Down.worst(Health::Impacted), Health::Down);
    }

    #[test]
    fn test_binding_health_parse() {
        assert_eq!(BindingHealth::from("up"), BindingHealth::Up);
        assert_eq!(BindingHealth::from(" DOWN "), BindingHealth::Down);
        assert_eq!(BindingHealth::from("Degraded"), BindingHealth::Degraded);
        assert_eq!(
            BindingHealth::from("MAINTENANCE"),
            BindingHealth::Other("MAINTENANCE".into())
        );
        assert!(!BindingHealth::from("MAINTENANCE").is_up());
    }

    #[test]
    fn test_dependency_type_parse() {
        assert_eq!(DependencyType::parse("HARD"), Some(DependencyType::Hard));
        assert_eq!(DependencyType::parse(" soft"), Some(DependencyType::Soft));
        assert_eq!(DependencyType::parse("optional"), None);
    }

    #[test]
    fn test_parse_specs_from_yaml() {
        let yaml = r#"
- parent_service_id: api
  child_service_id: db
  dependency_type: soft
- parent: api
  child: cache
"#;
        let deps: Vec<DependencySpec> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(deps[0].parent, "api");
        assert_eq!(deps[0].dependency_type, "soft");
        assert_eq!(deps[1].dependency_type, "hard");
        assert_eq!(deps[1].origin, EdgeOrigin::Real);
    }

    #[test]
    fn test_reason_serializes_tagged() {
        let reason = Reason::Dependency {
            child_service_id: "db".into(),
            child_health: Health::Down,
        };
        let json = serde_json::to_value(&reason).unwrap();
        assert_eq!(json["kind"], "dependency");
        assert_eq!(json["child_health"], "DOWN");
    }
}
