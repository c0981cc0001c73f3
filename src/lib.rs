//! # WAN Failover
//!
//! A failover utility for multi-uplink gateway devices (Ethernet, cellular,
//! Wi-Fi) that keeps the OS default route on the best available uplink,
//! following an operator-defined priority order and live interface health.
//!
//! This library provides the default-route resolution and failover engine:
//! an interface registry, regex-driven logical-to-device name resolution,
//! priority-list based route selection, and a mutex-serialized
//! reconciliation loop that applies changes to the routing table through a
//! narrow command interface.

pub mod api;
pub mod apply;
pub mod commands;
pub mod errors;
pub mod mapping;
pub mod notify;
pub mod persist;
pub mod registry;
pub mod resolve;
pub mod service;

#[cfg(test)]
mod testutil;

// Re-export commonly used types
pub use api::{DefaultRouteInfo, RegistryUpdate, SetPriorityRequest};
pub use commands::{CommandExecutor, CurrentRoute, LinkStatus, SystemCommandExecutor};
pub use errors::{RouteError, RouteResult};
pub use mapping::{MappingTable, NameMapping};
pub use notify::{LogNotifier, WanNotifier};
pub use persist::{JsonStore, Store};
pub use registry::{InterfaceRecord, InterfaceRegistry, InterfaceUpdate};
pub use resolve::ResolvedDefault;
pub use service::RouteService;
