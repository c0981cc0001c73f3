use log::info;

/// Sink for WAN-changed notifications.
///
/// Downstream consumers (DNS, status reporting) react to the logical uplink
/// now carrying the default route; the transport that delivers the event is
/// outside this crate.
pub trait WanNotifier: Send + Sync {
    /// `actual_iface` is set only when the OS device name differs from the
    /// logical uplink name.
    fn wan_changed(&self, interface: &str, actual_iface: Option<&str>);
}

/// Notifier that records WAN changes in the log
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl WanNotifier for LogNotifier {
    fn wan_changed(&self, interface: &str, actual_iface: Option<&str>) {
        match actual_iface {
            Some(actual) => info!("WAN interface changed to {} (device {})", interface, actual),
            None => info!("WAN interface changed to {}", interface),
        }
    }
}
