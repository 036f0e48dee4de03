use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::alerts::{ActiveAlertIndex, resolve_bindings};
use crate::error::{ConfigError, Warning};
use crate::health::PropagationPolicy;
use crate::model::{BindingSpec, DependencySpec, ServiceSpec, SuggestedDependency};
use crate::suggest::{DEFAULT_MIN_CONFIDENCE, merge_suggested};
use crate::topology::SnapshotInput;

/// Environment variable naming a snapshot file, checked before directory search
pub const SNAPSHOT_ENV: &str = "SVCIMPACT_SNAPSHOT";

const SNAPSHOT_NAMES: [&str; 3] = ["svcimpact.yaml", "svcimpact.yml", "svcimpact.json"];

/// Engine settings, usually read from the `settings` block of a snapshot file
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    /// View mode used when the caller does not request one
    #[serde(default)]
    pub default_view: Option<String>,

    /// Suggested edges below this confidence (0-100) are not merged
    #[serde(default = "default_min_confidence")]
    pub min_suggestion_confidence: u32,

    /// Merge suggested edges into the working edge set at all
    #[serde(default = "default_true")]
    pub include_suggestions: bool,

    /// Severity mapping for hard-dependency propagation
    #[serde(default)]
    pub propagation: PropagationPolicy,
}

fn default_min_confidence() -> u32 {
    DEFAULT_MIN_CONFIDENCE
}
fn default_true() -> bool {
    true
}
fn default_version() -> String {
    "1".into()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_view: None,
            min_suggestion_confidence: DEFAULT_MIN_CONFIDENCE,
            include_suggestions: true,
            propagation: PropagationPolicy::default(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.propagation.validate()
    }
}

/// Root structure of a snapshot file
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SnapshotFile {
    #[serde(default = "default_version")]
    pub version: String,

    /// Application the services belong to
    #[serde(default)]
    pub application: Option<String>,

    #[serde(default)]
    pub settings: Settings,

    #[serde(default)]
    pub services: Vec<ServiceSpec>,

    #[serde(default)]
    pub dependencies: Vec<DependencySpec>,

    #[serde(default)]
    pub bindings: Vec<BindingSpec>,

    /// Externally inferred edges, merged for display only
    #[serde(default)]
    pub suggested_dependencies: Vec<SuggestedDependency>,

    /// Active alert keys used to resolve bindings without an explicit health
    #[serde(default)]
    pub active_alerts: Option<Vec<String>>,
}

/// Engine input derived from a snapshot file, with the anomalies found on the way
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PreparedSnapshot {
    pub input: SnapshotInput,
    pub warnings: Vec<Warning>,
}

impl SnapshotFile {
    /// Load a snapshot from a `.yaml`, `.yml` or `.json` file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = Self::read(path)?;
        file.settings.validate()?;
        Ok(file)
    }

    /// Parse a snapshot file without validating its settings
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        let file: SnapshotFile = match ext.as_deref() {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            Some("json") => serde_json::from_str(&content)?,
            _ => {
                return Err(ConfigError::UnsupportedFormat {
                    path: path.to_path_buf(),
                });
            }
        };
        tracing::debug!(path = %path.display(), services = file.services.len(), "snapshot loaded");
        Ok(file)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let file: SnapshotFile = serde_yaml::from_str(content)?;
        file.settings.validate()?;
        Ok(file)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let file: SnapshotFile = serde_json::from_str(content)?;
        file.settings.validate()?;
        Ok(file)
    }

    /// Find and load a snapshot file
    pub fn discover(start_dir: &Path) -> Result<(PathBuf, Self), ConfigError> {
        let path = Self::locate(start_dir)?;
        let file = Self::load(&path)?;
        Ok((path, file))
    }

    /// Path of the snapshot file to use: `SVCIMPACT_SNAPSHOT` first, then the
    /// standard names in `start_dir` and each of its parents.
    pub fn locate(start_dir: &Path) -> Result<PathBuf, ConfigError> {
        let mut searched = Vec::new();

        if let Ok(env_path) = std::env::var(SNAPSHOT_ENV) {
            let path = PathBuf::from(&env_path);
            if path.exists() {
                return Ok(path);
            }
            searched.push(path);
        }

        let mut dir = Some(start_dir);
        while let Some(current) = dir {
            for name in &SNAPSHOT_NAMES {
                let path = current.join(name);
                if path.exists() {
                    return Ok(path);
                }
                searched.push(path);
            }
            dir = current.parent();
        }

        Err(ConfigError::NotFound { searched })
    }

    /// Resolve binding health from active alerts and merge suggested edges,
    /// producing the input for one evaluation.
    pub fn prepare(&self) -> PreparedSnapshot {
        let bindings = match &self.active_alerts {
            Some(keys) => resolve_bindings(&self.bindings, &ActiveAlertIndex::new(keys)),
            None => self.bindings.clone(),
        };

        let (dependencies, warnings) = if self.settings.include_suggestions {
            let merged = merge_suggested(
                &self.services,
                &self.dependencies,
                &self.suggested_dependencies,
                self.settings.min_suggestion_confidence,
            );
            (merged.edges, merged.warnings)
        } else {
            (self.dependencies.clone(), Vec::new())
        };

        PreparedSnapshot {
            input: SnapshotInput {
                application: self.application.clone(),
                services: self.services.clone(),
                dependencies,
                bindings,
            },
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BindingHealth, EdgeOrigin, Health};

    const SHOP: &str = r#"
version: "1"
application: shop
settings:
  default_view: attention
  min_suggestion_confidence: 80
  propagation:
    on_child_down: impacted
services:
  - id: web
    criticality: critical
  - id: api
    service_type: api
  - id: db
    name: Postgres
    criticality: low
dependencies:
  - parent: web
    child: api
  - parent_service_id: api
    child_service_id: db
    dependency_type: hard
bindings:
  - service: db
    monitor_type: ping
    monitor_ref: db-01
  - service: api
    monitor_type: url
    monitor_ref: https://api.local
    health: UP
suggested_dependencies:
  - parent: web
    child: db
    confidence: 91
  - parent: api
    child: web
    confidence: 30
active_alerts:
  - "ping:db-01"
"#;

    #[test]
    fn test_parse_snapshot_file() {
        let file = SnapshotFile::from_yaml_str(SHOP).unwrap();
        assert_eq!(file.application.as_deref(), Some("shop"));
        assert_eq!(file.settings.default_view.as_deref(), Some("attention"));
        assert_eq!(file.settings.min_suggestion_confidence, 80);
        assert_eq!(file.settings.propagation.on_child_down, Health::Impacted);
        assert_eq!(file.services.len(), 3);
        assert_eq!(file.services[2].name.as_deref(), Some("Postgres"));
    }

    #[test]
    fn test_prepare_resolves_and_merges() {
        let file = SnapshotFile::from_yaml_str(SHOP).unwrap();
        let prepared = file.prepare();

        assert_eq!(prepared.input.bindings[0].health, Some(BindingHealth::Down));
        assert_eq!(prepared.input.bindings[1].health, Some(BindingHealth::Up));

        assert_eq!(prepared.input.dependencies.len(), 3);
        assert_eq!(prepared.input.dependencies[2].origin, EdgeOrigin::Suggested);
        assert_eq!(prepared.warnings.len(), 1);
    }

    #[test]
    fn test_suggestions_can_be_disabled() {
        let mut file = SnapshotFile::from_yaml_str(SHOP).unwrap();
        file.settings.include_suggestions = false;
        let prepared = file.prepare();
        assert_eq!(prepared.input.dependencies.len(), 2);
        assert!(prepared.warnings.is_empty());
    }

    #[test]
    fn test_non_monotone_policy_rejected() {
        let yaml = r#"
settings:
  propagation:
    on_child_down: up
services: []
"#;
        assert!(matches!(
            SnapshotFile::from_yaml_str(yaml),
            Err(ConfigError::InvalidPolicy { .. })
        ));
    }

    #[test]
    fn test_parse_json_snapshot() {
        let json = r#"{
            "services": [{"id": "a"}, {"id": "b"}],
            "dependencies": [{"parent": "a", "child": "b", "type": "soft"}]
        }"#;
        let file = SnapshotFile::from_json_str(json).unwrap();
        assert_eq!(file.version, "1");
        assert_eq!(file.dependencies[0].dependency_type, "soft");
        assert!(file.active_alerts.is_none());
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = std::env::temp_dir().join("svcimpact-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("snapshot.toml");
        std::fs::write(&path, "services = []").unwrap();
        assert!(matches!(
            SnapshotFile::load(&path),
            Err(ConfigError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_read_defers_settings_validation() {
        let dir = std::env::temp_dir().join("svcimpact-config-read-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("escalating.yaml");
        std::fs::write(
            &path,
            "settings:\n  propagation:\n    on_child_degraded: impacted\nservices: []\n",
        )
        .unwrap();

        let file = SnapshotFile::read(&path).unwrap();
        assert_eq!(file.settings.propagation.on_child_degraded, Health::Impacted);
        assert!(matches!(
            SnapshotFile::load(&path),
            Err(ConfigError::InvalidPolicy { .. })
        ));
    }
}
