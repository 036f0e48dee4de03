//! Binding health resolution
//!
//! The engine never computes binding health itself; a `HealthSource` supplies it.
//! `ActiveAlertIndex` is the source used when the snapshot carries the set of
//! currently active alert keys from the alerting engine.

use std::collections::BTreeSet;

use crate::model::{BindingHealth, BindingSpec};
use crate::monitor::normalize_key;

/// Source of current binding health keyed by `monitor_type` + `monitor_ref`
pub trait HealthSource {
    /// `None` when the source has no opinion on this monitor
    fn health_of(&self, monitor_type: &str, monitor_ref: &str) -> Option<BindingHealth>;
}

impl<F> HealthSource for F
where
    F: Fn(&str, &str) -> Option<BindingHealth>,
{
    fn health_of(&self, monitor_type: &str, monitor_ref: &str) -> Option<BindingHealth> {
        self(monitor_type, monitor_ref)
    }
}

/// Set of active alert keys. A binding is DOWN when an alert targets it, UP otherwise.
///
/// Keys are matched case-insensitively as `ref` or `type:ref`. Host-level bindings
/// also match derived targets (`host|disk|C:`), and an oracle binding ending in
/// `:__all__` matches every alert sharing its prefix.
#[derive(Clone, Debug, Default)]
pub struct ActiveAlertIndex {
    keys: BTreeSet<String>,
}

impl ActiveAlertIndex {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keys: keys
                .into_iter()
                .map(|k| normalize_key(k.as_ref()))
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn is_active(&self, monitor_type: &str, monitor_ref: &str) -> bool {
        let r = normalize_key(monitor_ref);
        if r.is_empty() {
            return false;
        }
        let t = normalize_key(monitor_type);
        let typed = format!("{}:{}", t, r);

        if self.keys.contains(&r) || self.keys.contains(&typed) {
            return true;
        }

        if self.has_prefix(&format!("{}|", r)) || self.has_prefix(&format!("{}|", typed)) {
            return true;
        }

        if t == "oracle" && r.ends_with(":__all__") {
            if let Some((db, _)) = r.rsplit_once(':') {
                return self.has_prefix(&format!("{}:", db));
            }
        }

        false
    }

    fn has_prefix(&self, prefix: &str) -> bool {
        self.keys
            .range(prefix.to_string()..)
            .next()
            .is_some_and(|k| k.starts_with(prefix))
    }
}

impl HealthSource for ActiveAlertIndex {
    fn health_of(&self, monitor_type: &str, monitor_ref: &str) -> Option<BindingHealth> {
        Some(if self.is_active(monitor_type, monitor_ref) {
            BindingHealth::Down
        } else {
            BindingHealth::Up
        })
    }
}

/// Fill in health for bindings that do not carry an explicit value.
pub fn resolve_bindings(bindings: &[BindingSpec], source: &dyn HealthSource) -> Vec<BindingSpec> {
    let mut resolved = 0usize;
    let out: Vec<BindingSpec> = bindings
        .iter()
        .map(|b| {
            let mut b = b.clone();
            if b.health.is_none() {
                b.health = source.health_of(&b.monitor_type, &b.monitor_ref);
                if b.health.is_some() {
                    resolved += 1;
                }
            }
            b
        })
        .collect();
    tracing::debug!(total = bindings.len(), resolved, "binding health resolved");
    out
}
