use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// State of one logical uplink, keyed by its stable logical name.
///
/// Records are created on first mention and mutated in place afterwards;
/// they are never deleted. Stale entries are harmless since resolution
/// filters by the priority list and the live OS interface set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceRecord {
    pub name: String,

    /// OS-visible device name when it differs from the logical name
    #[serde(rename = "actualIface", skip_serializing_if = "Option::is_none")]
    pub actual_iface: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,

    /// Administratively/physically up
    pub status: bool,

    /// Eligible to carry the default route
    pub wan: bool,
}

/// Partial update form of an [`InterfaceRecord`].
///
/// Fields left out of an update preserve the stored value; `status` and
/// `wan` default to `true` only when the update creates the record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceUpdate {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub wan: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,

    #[serde(rename = "actualIface", skip_serializing_if = "Option::is_none")]
    pub actual_iface: Option<String>,
}

/// Authoritative in-memory map of logical interface name to uplink state
#[derive(Debug, Default)]
pub struct InterfaceRegistry {
    records: BTreeMap<String, InterfaceRecord>,
}

impl InterfaceRegistry {
    pub fn new() -> Self {
        InterfaceRegistry::default()
    }

    /// Merge `update` into the record for its name, creating the record
    /// with `status=true, wan=true` if absent.
    pub fn upsert(&mut self, update: InterfaceUpdate) {
        let record = self
            .records
            .entry(update.name.clone())
            .or_insert_with(|| InterfaceRecord {
                name: update.name.clone(),
                actual_iface: None,
                gateway: None,
                status: true,
                wan: true,
            });

        if let Some(status) = update.status {
            record.status = status;
        }
        if let Some(wan) = update.wan {
            record.wan = wan;
        }
        if let Some(gateway) = update.gateway {
            // an explicitly empty gateway clears the stored one
            record.gateway = if gateway.is_empty() {
                None
            } else {
                Some(gateway)
            };
        }
        if let Some(actual) = update.actual_iface {
            record.actual_iface = if actual.is_empty() { None } else { Some(actual) };
        }

        debug!("Registry upsert: {:?}", record);
    }

    pub fn get(&self, name: &str) -> Option<&InterfaceRecord> {
        self.records.get(name)
    }

    /// Snapshot of every record, for diagnostics endpoints
    pub fn all(&self) -> &BTreeMap<String, InterfaceRecord> {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(name: &str) -> InterfaceUpdate {
        InterfaceUpdate {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_defaults_to_up_and_wan() {
        let mut registry = InterfaceRegistry::new();
        registry.upsert(update("eth0"));

        let record = registry.get("eth0").unwrap();
        assert!(record.status);
        assert!(record.wan);
        assert_eq!(record.gateway, None);
        assert_eq!(record.actual_iface, None);
    }

    #[test]
    fn test_partial_update_preserves_absent_fields() {
        let mut registry = InterfaceRegistry::new();
        registry.upsert(InterfaceUpdate {
            gateway: Some("192.168.31.254".to_string()),
            status: Some(false),
            ..update("eth0")
        });

        // a later update without status/gateway must not reset them
        registry.upsert(InterfaceUpdate {
            wan: Some(false),
            ..update("eth0")
        });

        let record = registry.get("eth0").unwrap();
        assert!(!record.status);
        assert!(!record.wan);
        assert_eq!(record.gateway.as_deref(), Some("192.168.31.254"));
    }

    #[test]
    fn test_empty_gateway_clears_stored_value() {
        let mut registry = InterfaceRegistry::new();
        registry.upsert(InterfaceUpdate {
            gateway: Some("192.168.31.254".to_string()),
            ..update("eth0")
        });
        registry.upsert(InterfaceUpdate {
            gateway: Some(String::new()),
            ..update("eth0")
        });

        assert_eq!(registry.get("eth0").unwrap().gateway, None);
    }

    #[test]
    fn test_records_are_never_deleted() {
        let mut registry = InterfaceRegistry::new();
        registry.upsert(update("eth0"));
        registry.upsert(update("wwan0"));

        assert_eq!(registry.all().len(), 2);
        assert!(registry.get("eth0").is_some());
        assert!(registry.get("wwan0").is_some());
    }
}
