use crate::errors::{RouteError, RouteResult};
use log::debug;
use std::fs;
use std::path::Path;
use std::process::Command;

/// Link-layer status of a single interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkStatus {
    /// Carrier is up (operstate/carrier from sysfs)
    pub link_up: bool,

    /// IPv4 addresses currently assigned to the interface
    pub addresses: Vec<String>,
}

/// The default route currently installed in the OS routing table
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CurrentRoute {
    /// Output device of the route, if any
    pub device: Option<String>,

    /// Next-hop gateway of the route, if any
    pub gateway: Option<String>,
}

/// Narrow contract for everything this crate asks of the operating system.
///
/// All calls are synchronous and may block on OS I/O; callers that mutate the
/// routing table are expected to hold the reconciliation lock while invoking
/// them.
#[cfg_attr(test, mockall::automock)]
pub trait CommandExecutor: Send + Sync {
    /// List the names of all network interfaces known to the OS
    fn list_interfaces(&self) -> RouteResult<Vec<String>>;

    /// Retrieve link state and assigned addresses for one interface
    fn interface_status(&self, iface: &str) -> RouteResult<LinkStatus>;

    /// Read the currently installed default route, if one exists
    fn current_default_route(&self) -> RouteResult<Option<CurrentRoute>>;

    /// Remove the default route. Deleting a nonexistent default route is
    /// not an error.
    fn delete_default_route(&self) -> RouteResult<()>;

    /// Install a default route via the given device and/or gateway
    fn add_default_route<'a>(&self, device: Option<&'a str>, gateway: Option<&'a str>) -> RouteResult<()>;

    /// Run a shell command and return its trimmed stdout.
    ///
    /// Used by name resolution to late-bind OS device names (e.g. asking the
    /// modem manager which ppp unit is active).
    fn substitute(&self, command: &str) -> RouteResult<String>;
}

/// `CommandExecutor` backed by `ip(8)` and `/sys/class/net`
#[derive(Debug, Default, Clone)]
pub struct SystemCommandExecutor;

impl SystemCommandExecutor {
    pub fn new() -> Self {
        SystemCommandExecutor
    }

    fn ip_output(args: &[&str]) -> RouteResult<String> {
        debug!("Executing command: ip {}", args.join(" "));
        let output = Command::new("ip")
            .args(args)
            .output()
            .map_err(|e| RouteError::CommandFailed(format!("ip {}: {}", args.join(" "), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RouteError::CommandFailed(format!(
                "ip {}: {}",
                args.join(" "),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl CommandExecutor for SystemCommandExecutor {
    fn list_interfaces(&self) -> RouteResult<Vec<String>> {
        let mut ifaces = Vec::new();
        for entry in fs::read_dir("/sys/class/net")? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            // loopback and monitor interfaces never carry a default route
            if name.starts_with("lo") || name.starts_with("mon.") {
                continue;
            }
            ifaces.push(name);
        }
        ifaces.sort();
        debug!("Found interfaces: {:?}", ifaces);
        Ok(ifaces)
    }

    fn interface_status(&self, iface: &str) -> RouteResult<LinkStatus> {
        let sys = Path::new("/sys/class/net").join(iface);
        if !sys.exists() {
            return Err(RouteError::CommandFailed(format!(
                "Device \"{}\" does not exist",
                iface
            )));
        }

        // operstate says "down" while the link is administratively down;
        // carrier distinguishes cable-present for states like "unknown"
        let operstate = fs::read_to_string(sys.join("operstate"))
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| "down".to_string());
        let link_up = if operstate == "down" {
            false
        } else {
            fs::read_to_string(sys.join("carrier"))
                .map(|s| s.trim() == "1")
                .unwrap_or(false)
        };

        let stdout = Self::ip_output(&["-4", "addr", "show", iface])?;
        let mut addresses = Vec::new();
        for line in stdout.lines() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.first() == Some(&"inet") {
                if let Some(cidr) = parts.get(1) {
                    let ip = cidr.split('/').next().unwrap_or("");
                    if !ip.is_empty() {
                        addresses.push(ip.to_string());
                    }
                }
            }
        }

        debug!(
            "Interface {}: link_up={}, addresses={:?}",
            iface, link_up, addresses
        );
        Ok(LinkStatus { link_up, addresses })
    }

    fn current_default_route(&self) -> RouteResult<Option<CurrentRoute>> {
        let stdout = Self::ip_output(&["route", "show"])?;

        // Look for lines like "default via 192.168.1.1 dev eth0 ..."
        for line in stdout.lines() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.first() != Some(&"default") {
                continue;
            }
            let mut route = CurrentRoute::default();
            if let Some(i) = parts.iter().position(|&p| p == "via") {
                route.gateway = parts.get(i + 1).map(|s| s.to_string());
            }
            if let Some(i) = parts.iter().position(|&p| p == "dev") {
                route.device = parts.get(i + 1).map(|s| s.to_string());
            }
            debug!("Current default route: {:?}", route);
            return Ok(Some(route));
        }

        debug!("No default route installed");
        Ok(None)
    }

    fn delete_default_route(&self) -> RouteResult<()> {
        debug!("Executing command: ip route del default");
        let output = Command::new("ip")
            .args(["route", "del", "default"])
            .output()
            .map_err(|e| RouteError::CommandFailed(format!("ip route del default: {}", e)))?;

        // exit code 2 means there was no default route to delete
        if !output.status.success() && output.status.code() != Some(2) {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RouteError::CommandFailed(format!(
                "ip route del default: {}",
                stderr.trim()
            )));
        }
        Ok(())
    }

    fn add_default_route(&self, device: Option<&str>, gateway: Option<&str>) -> RouteResult<()> {
        let mut args = vec!["route", "add", "default"];
        if let Some(dev) = device {
            args.push("dev");
            args.push(dev);
        }
        if let Some(gw) = gateway {
            args.push("via");
            args.push(gw);
        }
        Self::ip_output(&args).map(|_| ())
    }

    fn substitute(&self, command: &str) -> RouteResult<String> {
        debug!("Executing substitution command: {}", command);
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .output()
            .map_err(|e| RouteError::CommandFailed(format!("{}: {}", command, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RouteError::CommandFailed(format!(
                "{}: {}",
                command,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
