use crate::commands::CommandExecutor;
use crate::errors::{RouteError, RouteResult};
use crate::notify::WanNotifier;
use crate::resolve::ResolvedDefault;
use log::{debug, info};

/// Apply a resolution outcome to the OS routing table.
///
/// The existing default route is always deleted first (idempotent); an empty
/// outcome leaves the table without a default route. On a successful add, the
/// WAN-changed notification is emitted. Delete/add failures surface as
/// [`RouteError::ApplyFailed`] — recovery is the caller's responsibility.
pub fn apply_default(
    resolved: &ResolvedDefault,
    executor: &dyn CommandExecutor,
    notifier: &dyn WanNotifier,
) -> RouteResult<()> {
    executor
        .delete_default_route()
        .map_err(|e| RouteError::ApplyFailed(e.to_string()))?;

    if resolved.is_empty() {
        info!("Default route removed, no eligible uplink");
        return Ok(());
    }

    let device = resolved
        .actual_iface
        .as_deref()
        .or(resolved.interface.as_deref())
        .filter(|d| !d.is_empty());
    let gateway = resolved.gateway.as_deref().filter(|g| !g.is_empty());

    if device.is_none() && gateway.is_none() {
        return Err(RouteError::InvalidDefaultRoute);
    }

    executor
        .add_default_route(device, gateway)
        .map_err(|e| RouteError::ApplyFailed(e.to_string()))?;
    info!(
        "Default route set: dev {} via {}",
        device.unwrap_or("-"),
        gateway.unwrap_or("-")
    );

    if let Some(interface) = resolved.interface.as_deref() {
        let actual = resolved
            .actual_iface
            .as_deref()
            .filter(|a| *a != interface);
        debug!("Publishing WAN change: {} ({:?})", interface, actual);
        notifier.wan_changed(interface, actual);
    }

    Ok(())
}
