//! Shared fakes for unit tests: a stateful Command Executor, an in-memory
//! store, and a recording notifier.

use crate::commands::{CommandExecutor, CurrentRoute, LinkStatus};
use crate::errors::{RouteError, RouteResult};
use crate::mapping::NameMapping;
use crate::notify::WanNotifier;
use crate::persist::Store;
use std::sync::{Arc, Mutex};

/// Executor whose routing table is plain shared state.
///
/// Clones share the state, so tests can keep a handle for inspection after
/// handing one to the service. Every route mutation is recorded in `calls`.
#[derive(Clone, Default)]
pub(crate) struct FakeExecutor {
    state: Arc<FakeExecutorState>,
}

#[derive(Default)]
struct FakeExecutorState {
    live: Mutex<Vec<String>>,
    route: Mutex<Option<CurrentRoute>>,
    calls: Mutex<Vec<String>>,
    fail_add_device: Mutex<Option<String>>,
}

impl FakeExecutor {
    pub fn new(live: &[&str]) -> Self {
        let executor = FakeExecutor::default();
        executor.set_live(live);
        executor
    }

    pub fn set_live(&self, live: &[&str]) {
        *self.state.live.lock().unwrap() = live.iter().map(|s| s.to_string()).collect();
    }

    pub fn set_route(&self, route: Option<CurrentRoute>) {
        *self.state.route.lock().unwrap() = route;
    }

    pub fn current_route(&self) -> Option<CurrentRoute> {
        self.state.route.lock().unwrap().clone()
    }

    /// Make `add_default_route` fail whenever it targets this device
    pub fn fail_add_on(&self, device: &str) {
        *self.state.fail_add_device.lock().unwrap() = Some(device.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.calls.lock().unwrap().clone()
    }
}

impl CommandExecutor for FakeExecutor {
    fn list_interfaces(&self) -> RouteResult<Vec<String>> {
        Ok(self.state.live.lock().unwrap().clone())
    }

    fn interface_status(&self, iface: &str) -> RouteResult<LinkStatus> {
        let live = self.state.live.lock().unwrap();
        if live.iter().any(|l| l == iface) {
            Ok(LinkStatus {
                link_up: true,
                addresses: vec!["10.0.0.2".to_string()],
            })
        } else {
            Ok(LinkStatus {
                link_up: false,
                addresses: vec![],
            })
        }
    }

    fn current_default_route(&self) -> RouteResult<Option<CurrentRoute>> {
        Ok(self.state.route.lock().unwrap().clone())
    }

    fn delete_default_route(&self) -> RouteResult<()> {
        self.state.calls.lock().unwrap().push("del default".to_string());
        *self.state.route.lock().unwrap() = None;
        Ok(())
    }

    fn add_default_route(&self, device: Option<&str>, gateway: Option<&str>) -> RouteResult<()> {
        self.state.calls.lock().unwrap().push(format!(
            "add {} via {}",
            device.unwrap_or("-"),
            gateway.unwrap_or("-")
        ));

        if self.state.fail_add_device.lock().unwrap().as_deref() == device {
            return Err(RouteError::CommandFailed(format!(
                "ip route add default dev {}",
                device.unwrap_or("-")
            )));
        }

        *self.state.route.lock().unwrap() = Some(CurrentRoute {
            device: device.map(String::from),
            gateway: gateway.map(String::from),
        });
        Ok(())
    }

    fn substitute(&self, _command: &str) -> RouteResult<String> {
        Ok(String::new())
    }
}

/// In-memory `Store`
#[derive(Clone, Default)]
pub(crate) struct MemStore {
    state: Arc<MemStoreState>,
}

#[derive(Default)]
struct MemStoreState {
    priority: Mutex<Vec<String>>,
    mappings: Mutex<Vec<NameMapping>>,
}

impl MemStore {
    pub fn with_priority(list: &[&str]) -> Self {
        let store = MemStore::default();
        *store.state.priority.lock().unwrap() = list.iter().map(|s| s.to_string()).collect();
        store
    }

    pub fn set_mappings(&self, mappings: Vec<NameMapping>) {
        *self.state.mappings.lock().unwrap() = mappings;
    }

    pub fn saved_priority(&self) -> Vec<String> {
        self.state.priority.lock().unwrap().clone()
    }
}

impl Store for MemStore {
    fn load_priority_list(&self) -> RouteResult<Vec<String>> {
        Ok(self.state.priority.lock().unwrap().clone())
    }

    fn save_priority_list(&self, list: &[String]) -> RouteResult<()> {
        *self.state.priority.lock().unwrap() = list.to_vec();
        Ok(())
    }

    fn load_name_mappings(&self) -> RouteResult<Vec<NameMapping>> {
        Ok(self.state.mappings.lock().unwrap().clone())
    }
}

/// Notifier that collects `(interface, actual_iface)` events
#[derive(Clone, Default)]
pub(crate) struct RecordingNotifier {
    events: Arc<Mutex<Vec<(String, Option<String>)>>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<(String, Option<String>)> {
        self.events.lock().unwrap().clone()
    }
}

impl WanNotifier for RecordingNotifier {
    fn wan_changed(&self, interface: &str, actual_iface: Option<&str>) {
        self.events
            .lock()
            .unwrap()
            .push((interface.to_string(), actual_iface.map(String::from)));
    }
}
