//! Transport-agnostic request/response shapes.
//!
//! The pub/sub or REST transport carrying these payloads lives outside this
//! crate; adapters deserialize into these types at the boundary and call the
//! handler methods below.

use crate::errors::{RouteError, RouteResult};
use crate::registry::{InterfaceRecord, InterfaceUpdate};
use crate::service::RouteService;
use serde::{Deserialize, Serialize};

/// Response for get-default and set-priority requests: the OS-observed
/// default route plus the configured priority list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultRouteInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,

    #[serde(rename = "actualIface", skip_serializing_if = "Option::is_none")]
    pub actual_iface: Option<String>,

    #[serde(rename = "priorityList")]
    pub priority_list: Vec<String>,
}

/// Request body for replacing the priority list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetPriorityRequest {
    #[serde(rename = "priorityList")]
    pub priority_list: Vec<String>,
}

/// Registry update payload: either a bulk list of records or a single one.
///
/// Decided here at the adapter boundary; the core only ever sees typed
/// updates.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RegistryUpdate {
    Batch(Vec<InterfaceUpdate>),
    Single(InterfaceUpdate),
}

impl RouteService {
    /// Get current default route + priority list
    pub fn handle_get_default(&self) -> RouteResult<DefaultRouteInfo> {
        let default = self.get_default()?;
        Ok(DefaultRouteInfo {
            gateway: default.gateway,
            interface: default.interface,
            actual_iface: default.actual_iface,
            priority_list: self.get_priority_list(),
        })
    }

    /// Replace the priority list; the response mirrors the resulting state
    pub fn handle_set_priority(&self, request: SetPriorityRequest) -> RouteResult<DefaultRouteInfo> {
        self.set_priority_list(request.priority_list)?;
        self.handle_get_default()
    }

    /// Bulk registry snapshot
    pub fn handle_get_registry(&self) -> Vec<InterfaceRecord> {
        self.registry_snapshot().into_values().collect()
    }

    /// Apply a batch or single registry update; malformed payloads are a
    /// client error
    pub fn handle_update_registry(
        &self,
        payload: serde_json::Value,
    ) -> RouteResult<Vec<InterfaceRecord>> {
        let update: RegistryUpdate = serde_json::from_value(payload)
            .map_err(|e| RouteError::MalformedUpdate(e.to_string()))?;

        match update {
            RegistryUpdate::Batch(updates) => {
                for update in updates {
                    self.update_interface(update);
                }
            }
            RegistryUpdate::Single(update) => self.update_interface(update),
        }

        Ok(self.handle_get_registry())
    }

    /// Interface-event hook: fire-and-forget, no response
    pub fn handle_interface_event(&self, event: InterfaceUpdate) {
        self.update_interface(event);
    }
}
