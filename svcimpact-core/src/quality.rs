use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::ServiceId;
use crate::monitor::{monitor_key, normalize_monitor_type};
use crate::topology::TopologySnapshot;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsupportedBinding {
    pub service_id: ServiceId,
    pub monitor_type: String,
    pub monitor_ref: String,
}

/// One monitor bound to more than one service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateMonitor {
    pub monitor_key: String,
    pub service_ids: Vec<ServiceId>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingQuality {
    pub total_bindings: usize,
    pub valid_bindings: usize,
    pub unsupported: Vec<UnsupportedBinding>,
    pub duplicates: Vec<DuplicateMonitor>,
}

impl BindingQuality {
    pub fn is_clean(&self) -> bool {
        self.unsupported.is_empty() && self.duplicates.is_empty()
    }
}

/// Audit the bindings of a snapshot for unsupported monitor types and monitors
/// shared between services. Monitors are compared by [`monitor_key`].
pub fn audit_bindings(snapshot: &TopologySnapshot) -> BindingQuality {
    let mut report = BindingQuality {
        total_bindings: snapshot.bindings().len(),
        ..BindingQuality::default()
    };
    let mut by_key: BTreeMap<String, Vec<ServiceId>> = BTreeMap::new();

    for b in snapshot.bindings() {
        let owners = by_key
            .entry(monitor_key(&b.monitor_type, &b.monitor_ref))
            .or_default();
        if !owners.contains(&b.service_id) {
            owners.push(b.service_id.clone());
        }

        if normalize_monitor_type(&b.monitor_type).is_none() {
            report.unsupported.push(UnsupportedBinding {
                service_id: b.service_id.clone(),
                monitor_type: b.monitor_type.clone(),
                monitor_ref: b.monitor_ref.clone(),
            });
        } else {
            report.valid_bindings += 1;
        }
    }

    report.duplicates = by_key
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|(monitor_key, service_ids)| DuplicateMonitor {
            monitor_key,
            service_ids,
        })
        .collect();

    report
}
