use crate::apply::apply_default;
use crate::commands::{CommandExecutor, CurrentRoute};
use crate::errors::{RouteError, RouteResult};
use crate::mapping::MappingTable;
use crate::notify::WanNotifier;
use crate::persist::Store;
use crate::registry::{InterfaceRecord, InterfaceRegistry, InterfaceUpdate};
use crate::resolve::{resolve_default, ResolvedDefault};
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

const MAX_NAME_LEN: usize = 255;

/// A poisoned lock only means another thread panicked mid-update; the
/// guarded state is still the best state we have.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The default-route engine.
///
/// Owns the interface registry, the name-mapping table, the priority list,
/// and the single mutex that serializes every OS route mutation. External
/// collaborators (OS commands, persistence, notifications) are injected at
/// construction.
pub struct RouteService {
    executor: Box<dyn CommandExecutor>,
    store: Box<dyn Store>,
    notifier: Box<dyn WanNotifier>,
    mappings: MappingTable,
    registry: Mutex<InterfaceRegistry>,
    priority: Mutex<Vec<String>>,
    // device name -> logical name, filled in by resolution passes
    alias: Mutex<HashMap<String, String>>,
    update_lock: Mutex<()>,
    interval: Duration,
}

impl RouteService {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

    /// Build the service, loading the persisted priority list and the
    /// name-mapping rules from the store.
    pub fn new(
        executor: Box<dyn CommandExecutor>,
        store: Box<dyn Store>,
        notifier: Box<dyn WanNotifier>,
        interval: Duration,
    ) -> RouteResult<Self> {
        let mappings = MappingTable::new(store.load_name_mappings()?)?;
        let priority = store.load_priority_list()?;
        info!("Priority list: {:?}", priority);

        Ok(RouteService {
            executor,
            store,
            notifier,
            mappings,
            registry: Mutex::new(InterfaceRegistry::new()),
            priority: Mutex::new(priority),
            alias: Mutex::new(HashMap::new()),
            update_lock: Mutex::new(()),
            interval,
        })
    }

    /// Re-evaluate the default route against the stored priority list and
    /// apply the outcome if it differs from what the OS currently has.
    ///
    /// This is the only path that mutates the OS routing table after
    /// startup; the periodic loop and every external trigger funnel through
    /// it.
    pub fn try_update_default(&self) -> RouteResult<()> {
        let list = lock(&self.priority).clone();
        self.reconcile(&list)
    }

    fn reconcile(&self, list: &[String]) -> RouteResult<()> {
        let _guard = lock(&self.update_lock);

        let resolved = {
            let registry = lock(&self.registry);
            let mut alias = lock(&self.alias);
            resolve_default(
                list,
                &registry,
                &self.mappings,
                self.executor.as_ref(),
                &mut alias,
            )?
        };

        // fetched fresh on every pass, never cached
        let current = self.executor.current_default_route()?;
        if !self.route_changed(current, &resolved) {
            debug!("Default route unchanged, nothing to apply");
            return Ok(());
        }

        apply_default(&resolved, self.executor.as_ref(), self.notifier.as_ref())
    }

    /// Compare the OS-observed default against a resolution outcome on both
    /// device (translated back to its logical name) and gateway.
    fn route_changed(&self, current: Option<CurrentRoute>, resolved: &ResolvedDefault) -> bool {
        let alias = lock(&self.alias);
        let (current_iface, current_gateway) = match current {
            Some(route) => {
                let iface = route
                    .device
                    .map(|dev| alias.get(&dev).cloned().unwrap_or(dev));
                (iface, route.gateway)
            }
            None => (None, None),
        };
        current_iface != resolved.interface || current_gateway != resolved.gateway
    }

    /// Replace the priority list, persist it, and reconcile.
    ///
    /// On reconciliation failure a single recovery pass runs against the
    /// previous list (best effort, logged); the original error is returned
    /// to the caller either way. The new list stays persisted — it is
    /// operator configuration, not runtime state.
    pub fn set_priority_list(&self, list: Vec<String>) -> RouteResult<Vec<String>> {
        validate_priority_list(&list)?;

        // save and swap under the list lock so concurrent updates cannot
        // interleave their writes
        let previous = {
            let mut priority = lock(&self.priority);
            let prev = priority.clone();
            self.store.save_priority_list(&list)?;
            *priority = list.clone();
            prev
        };
        info!("Priority list updated: {:?}", list);

        if let Err(e) = self.reconcile(&list) {
            warn!("Update default gateway failed: {}", e);
            if let Err(recovery) = self.reconcile(&previous) {
                warn!("Failed to recover the default gateway: {}", recovery);
            }
            return Err(e);
        }

        Ok(list)
    }

    pub fn get_priority_list(&self) -> Vec<String> {
        lock(&self.priority).clone()
    }

    /// The OS-observed current default route, with the device name
    /// translated back to its logical uplink name where an alias is known.
    pub fn get_default(&self) -> RouteResult<ResolvedDefault> {
        let current = match self.executor.current_default_route()? {
            Some(route) => route,
            None => return Ok(ResolvedDefault::default()),
        };

        let alias = lock(&self.alias);
        let (interface, actual_iface) = match current.device {
            Some(device) => match alias.get(&device) {
                Some(logical) => (Some(logical.clone()), Some(device)),
                None => (Some(device), None),
            },
            None => (None, None),
        };

        Ok(ResolvedDefault {
            interface,
            actual_iface,
            gateway: current.gateway,
        })
    }

    /// Merge an interface event into the registry and reconcile.
    ///
    /// Fire-and-forget: reconciliation failures are logged and retried at
    /// the next tick, never surfaced to the event source.
    pub fn update_interface(&self, update: InterfaceUpdate) {
        lock(&self.registry).upsert(update);
        if let Err(e) = self.try_update_default() {
            debug!("Reconciliation after interface update failed: {}", e);
        }
    }

    /// Snapshot of every registry record, for diagnostics
    pub fn registry_snapshot(&self) -> BTreeMap<String, InterfaceRecord> {
        lock(&self.registry).all().clone()
    }

    /// Periodic reconciliation loop. Runs until `stop` is set; every
    /// failure is logged and deferred to the next tick.
    pub fn run(&self, stop: &AtomicBool) {
        info!("Reconciliation loop started (interval {:?})", self.interval);
        while !stop.load(Ordering::SeqCst) {
            let mut slept = Duration::ZERO;
            while slept < self.interval {
                if stop.load(Ordering::SeqCst) {
                    info!("Reconciliation loop stopped");
                    return;
                }
                let step = Duration::from_millis(500).min(self.interval - slept);
                thread::sleep(step);
                slept += step;
            }

            if let Err(e) = self.try_update_default() {
                debug!("Periodic reconciliation failed: {}", e);
            }
        }
        info!("Reconciliation loop stopped");
    }
}

fn validate_priority_list(list: &[String]) -> RouteResult<()> {
    for name in list {
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(RouteError::InvalidPriorityList(format!(
                "interface names must be 1-{} characters, got {:?}",
                MAX_NAME_LEN, name
            )));
        }
    }
    Ok(())
}
