use std::collections::BTreeSet;
use std::net::{SocketAddrV4, SocketAddrV6};
use std::path::PathBuf;

use log::{debug, trace};
use nix::net::if_::InterfaceFlags;

use crate::constants::{RESERVED_PREFIXES, SYSFS_NET_DIR};
use crate::error::{MtuError, MtuResult};

/// Snapshot of one local link, valid for a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInterface {
    pub name: String,
    pub addresses: BTreeSet<String>,
    /// Not backed by a hardware device according to sysfs
    pub is_virtual: bool,
}

impl NetworkInterface {
    pub fn new<S: Into<String>>(name: S) -> NetworkInterface {
        NetworkInterface {
            name: name.into(),
            addresses: BTreeSet::new(),
            is_virtual: false,
        }
    }
}

pub trait InterfaceEnumerator {
    /// Eligible interfaces, in the order the OS reports them
    fn list(&self) -> MtuResult<Vec<NetworkInterface>>;
}

/// One (interface, address) record as reported by the OS.
/// The same interface shows up once per address family.
#[derive(Debug, Clone)]
pub struct LinkRecord {
    pub name: String,
    pub loopback: bool,
    pub address: Option<String>,
}

/// Drop anything after the first '@' (e.g. "eth0@NONE", "gre1@eth0")
pub fn normalize_name(name: &str) -> &str {
    name.split('@').next().unwrap_or(name)
}

pub fn is_reserved<S: AsRef<str>>(name: &str, reserved_prefixes: &[S]) -> bool {
    reserved_prefixes.iter().any(|p| name.starts_with(p.as_ref()))
}

/// Group records by normalized name, keeping first-seen order, and filter out
/// loopback and reserved virtual devices.
pub fn select_interfaces<S, F>(records: impl IntoIterator<Item = LinkRecord>,
                               reserved_prefixes: &[S],
                               is_virtual: F) -> Vec<NetworkInterface>
where S: AsRef<str>, F: Fn(&str) -> bool {
    let mut result: Vec<NetworkInterface> = Vec::new();
    for record in records {
        let name = normalize_name(&record.name);
        if record.loopback || name == "lo" || name.is_empty() {
            continue;
        }
        if is_reserved(name, reserved_prefixes) {
            trace!("Skipping reserved interface {}", record.name);
            continue;
        }
        let idx = match result.iter().position(|x| x.name == name) {
            Some(idx) => idx,
            None => {
                let mut iface = NetworkInterface::new(name);
                iface.is_virtual = is_virtual(name);
                result.push(iface);
                result.len() - 1
            }
        };
        if let Some(addr) = record.address {
            result[idx].addresses.insert(addr);
        }
    }
    result
}

/// Enumerates links with getifaddrs(3).
pub struct SystemInterfaceEnumerator {
    reserved_prefixes: Vec<String>,
    sysfs_root: PathBuf,
}

impl Default for SystemInterfaceEnumerator {
    fn default() -> Self {
        Self::new(RESERVED_PREFIXES.iter().map(|s| s.to_string()).collect())
    }
}

impl SystemInterfaceEnumerator {
    pub fn new(reserved_prefixes: Vec<String>) -> SystemInterfaceEnumerator {
        SystemInterfaceEnumerator {
            reserved_prefixes,
            sysfs_root: PathBuf::from(SYSFS_NET_DIR),
        }
    }

    // physical NICs expose a "device" link in sysfs, tunnels and bridges don't
    fn is_virtual(&self, name: &str) -> bool {
        !self.sysfs_root.join(name).join("device").exists()
    }
}

impl InterfaceEnumerator for SystemInterfaceEnumerator {
    fn list(&self) -> MtuResult<Vec<NetworkInterface>> {
        let addrs = nix::ifaddrs::getifaddrs()
            .map_err(|e| MtuError::Enumeration(e.to_string()))?;

        let records = addrs.map(|ifaddr| {
            let address = ifaddr.address.as_ref().and_then(|addr| {
                if let Some(sin) = addr.as_sockaddr_in() {
                    Some(SocketAddrV4::from(*sin).ip().to_string())
                } else {
                    addr.as_sockaddr_in6().map(|sin6| SocketAddrV6::from(*sin6).ip().to_string())
                }
            });
            LinkRecord {
                loopback: ifaddr.flags.contains(InterfaceFlags::IFF_LOOPBACK),
                name: ifaddr.interface_name,
                address,
            }
        });

        let result = select_interfaces(records, self.reserved_prefixes.as_slice(), |name| self.is_virtual(name));
        debug!("Enumerated interfaces: {:?}",
               result.iter().map(|x| x.name.as_str()).collect::<Vec<_>>());
        Ok(result)
    }
}
