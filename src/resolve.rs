use crate::commands::CommandExecutor;
use crate::errors::{RouteError, RouteResult};
use crate::mapping::MappingTable;
use crate::registry::InterfaceRegistry;
use log::debug;
use std::collections::HashMap;

/// Outcome of one resolution pass: the uplink that should own the default
/// route, or empty when no candidate is eligible.
///
/// Computed fresh on every pass and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedDefault {
    /// Logical uplink name
    pub interface: Option<String>,

    /// OS device name when it differs from the logical name
    pub actual_iface: Option<String>,

    /// Next-hop gateway, if known for the uplink
    pub gateway: Option<String>,
}

impl ResolvedDefault {
    pub fn is_empty(&self) -> bool {
        self.interface.is_none() && self.gateway.is_none()
    }
}

/// Interfaces that are link-up and carry at least one address
pub fn live_interfaces(executor: &dyn CommandExecutor) -> RouteResult<Vec<String>> {
    let mut live = Vec::new();
    for iface in executor.list_interfaces()? {
        let status = match executor.interface_status(&iface) {
            Ok(status) => status,
            Err(e) => {
                debug!("Skipping {}: {}", iface, e);
                continue;
            }
        };
        if status.link_up && status.addresses.iter().any(|a| !a.is_empty()) {
            live.push(iface);
        }
    }
    debug!("Live interfaces: {:?}", live);
    Ok(live)
}

/// Walk the priority list and pick the first live, WAN-eligible uplink.
///
/// Names are resolved before liveness is checked; whenever resolution maps a
/// logical name to a different device, the pair is recorded in `alias`
/// (device -> logical) so OS-observed names can be translated back later.
/// An uplink with no registry record is eligible by default.
pub fn resolve_default(
    priority_list: &[String],
    registry: &InterfaceRegistry,
    mappings: &MappingTable,
    executor: &dyn CommandExecutor,
    alias: &mut HashMap<String, String>,
) -> RouteResult<ResolvedDefault> {
    let live = live_interfaces(executor)?;

    for logical in priority_list {
        let device = match mappings.resolve(logical, executor) {
            Ok(Some(device)) => device,
            Ok(None) => continue,
            Err(e) => {
                debug!("{}", e);
                continue;
            }
        };

        if device != *logical {
            alias.insert(device.clone(), logical.clone());
        }

        if !live.contains(&device) {
            continue;
        }

        // registry lookup by logical name, falling back through the device
        let record = registry.get(logical).or_else(|| registry.get(&device));
        if let Some(record) = record {
            if !record.status || !record.wan {
                continue;
            }
        }

        let actual_iface = record
            .and_then(|r| r.actual_iface.clone())
            .or_else(|| (device != *logical).then(|| device.clone()));

        let resolved = ResolvedDefault {
            interface: Some(logical.clone()),
            actual_iface,
            gateway: record.and_then(|r| r.gateway.clone()),
        };
        debug!("Resolved default: {:?}", resolved);
        return Ok(resolved);
    }

    debug!("{} (priority list {:?})", RouteError::NoEligibleInterface, priority_list);
    Ok(ResolvedDefault::default())
}
