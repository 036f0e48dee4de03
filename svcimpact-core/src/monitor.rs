use std::fmt;

use serde::{Deserialize, Serialize};

/// Monitor kinds a binding can point at
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorType {
    Server,
    Desktop,
    Ping,
    Port,
    Url,
    Snmp,
    Link,
    Sqlserver,
    Oracle,
    Idrac,
    Ilo,
    Proxy,
}

impl MonitorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Desktop => "desktop",
            Self::Ping => "ping",
            Self::Port => "port",
            Self::Url => "url",
            Self::Snmp => "snmp",
            Self::Link => "link",
            Self::Sqlserver => "sqlserver",
            Self::Oracle => "oracle",
            Self::Idrac => "idrac",
            Self::Ilo => "ilo",
            Self::Proxy => "proxy",
        }
    }
}

impl fmt::Display for MonitorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trimmed, lowercased form used for all key comparisons
pub fn normalize_key(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Map a raw monitor type (including legacy aliases) onto a known kind.
pub fn normalize_monitor_type(raw: &str) -> Option<MonitorType> {
    let key = normalize_key(raw).replace(' ', "_");
    let mtype = match key.as_str() {
        "server" | "service_down" => MonitorType::Server,
        "desktop" => MonitorType::Desktop,
        "ping" => MonitorType::Ping,
        "port" => MonitorType::Port,
        "url" => MonitorType::Url,
        "snmp" | "snmp_interface" => MonitorType::Snmp,
        "link" | "bandwidth" => MonitorType::Link,
        "sqlserver" => MonitorType::Sqlserver,
        "oracle" => MonitorType::Oracle,
        "idrac" => MonitorType::Idrac,
        "ilo" => MonitorType::Ilo,
        "proxy" => MonitorType::Proxy,
        _ => return None,
    };
    Some(mtype)
}

/// Reduce a monitor reference to the entity a binding should target.
///
/// Server and desktop refs like `host|net|eth0` keep the host; SNMP interface
/// refs like `10.0.0.1::ifDescr` keep the address.
pub fn normalize_ref_for_type(mtype: Option<MonitorType>, raw_ref: &str) -> String {
    let r = raw_ref.trim();
    match mtype {
        Some(MonitorType::Server | MonitorType::Desktop) => match r.split_once('|') {
            Some((host, _)) => host.trim().to_string(),
            None => r.to_string(),
        },
        Some(MonitorType::Snmp) => match r.split_once("::") {
            Some((host, _)) => host.trim().to_string(),
            None => r.to_string(),
        },
        _ => r.to_string(),
    }
}

/// Identity of the monitored entity behind a binding, as `type::ref`.
///
/// Aliased types and derived refs collapse onto the same key, so
/// `snmp_interface` / `10.0.0.1::ifDescr` and `snmp` / `10.0.0.1` match.
pub fn monitor_key(monitor_type: &str, monitor_ref: &str) -> String {
    let kind = normalize_monitor_type(monitor_type);
    let mtype = match kind {
        Some(k) => k.as_str().to_string(),
        None => normalize_key(monitor_type),
    };
    format!("{}::{}", mtype, normalize_key(&normalize_ref_for_type(kind, monitor_ref)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_monitor_type_maps_variants() {
        assert_eq!(normalize_monitor_type("SNMP_Interface"), Some(MonitorType::Snmp));
        assert_eq!(normalize_monitor_type("service down"), Some(MonitorType::Server));
        assert_eq!(normalize_monitor_type("bandwidth"), Some(MonitorType::Link));
        assert_eq!(normalize_monitor_type(" url "), Some(MonitorType::Url));
        assert_eq!(normalize_monitor_type("unknown_type"), None);
    }

    #[test]
    fn test_normalize_ref_for_type() {
        assert_eq!(
            normalize_ref_for_type(Some(MonitorType::Server), "host1|net|eth0"),
            "host1"
        );
        assert_eq!(
            normalize_ref_for_type(Some(MonitorType::Desktop), "desk01|disk|C:"),
            "desk01"
        );
        assert_eq!(
            normalize_ref_for_type(Some(MonitorType::Snmp), "10.1.1.1::ifDescr"),
            "10.1.1.1"
        );
        assert_eq!(
            normalize_ref_for_type(Some(MonitorType::Url), "https://a|b"),
            "https://a|b"
        );
        assert_eq!(normalize_ref_for_type(None, "  x  "), "x");
    }

    #[test]
    fn test_monitor_key_collapses_aliases() {
        assert_eq!(monitor_key("snmp_interface", "10.0.0.1::ifDescr"), "snmp::10.0.0.1");
        assert_eq!(monitor_key("SNMP", " 10.0.0.1 "), "snmp::10.0.0.1");
        assert_eq!(monitor_key("service_down", "Web01|svc|nginx"), "server::web01");
        assert_eq!(monitor_key("carrier_pigeon", "Coop-3"), "carrier_pigeon::coop-3");
    }
}
