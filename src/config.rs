use std::time;

use serde::{Deserialize, Serialize};

use crate::constants::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    /// Menu choice "1" / "2", also accepts "4" / "6"
    pub fn from_choice(s: &str) -> Option<IpVersion> {
        match s.trim() {
            "1" | "4" => Some(IpVersion::V4),
            "2" | "6" => Some(IpVersion::V6),
            _ => None,
        }
    }
}

impl std::fmt::Display for IpVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IpVersion::V4 => write!(f, "IPv4"),
            IpVersion::V6 => write!(f, "IPv6"),
        }
    }
}

/// All tunables of a discovery run. Passed explicitly into the engine.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub min_mtu: u32,
    pub max_mtu: u32,
    pub step: u32,
    pub ipv4_overhead: u32,
    pub ipv6_overhead: u32,
    pub probe_timeout_secs: u32,
    /// Back-off after each failed probe
    pub retry_delay: time::Duration,
    /// Subtracted from the discovered MTU of non-physical interfaces
    pub correction: u32,
    /// Subtracted from every discovered MTU, before `correction`
    pub safety_margin: u32,
    pub reserved_prefixes: Vec<String>,
    pub physical_patterns: Vec<String>,
    /// Set the interface MTU to `max_mtu` before probing it
    pub raise_before_probe: bool,
    /// Write the applied value into durable network configuration
    pub persist: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            min_mtu: DEFAULT_MIN_MTU,
            max_mtu: DEFAULT_MAX_MTU,
            step: DEFAULT_STEP,
            ipv4_overhead: IPV4_OVERHEAD,
            ipv6_overhead: IPV6_OVERHEAD,
            probe_timeout_secs: PROBE_TIMEOUT_SECS,
            retry_delay: RETRY_DELAY,
            correction: DEFAULT_CORRECTION,
            safety_margin: DEFAULT_SAFETY_MARGIN,
            reserved_prefixes: RESERVED_PREFIXES.iter().map(|s| s.to_string()).collect(),
            physical_patterns: PHYSICAL_PATTERNS.iter().map(|s| s.to_string()).collect(),
            raise_before_probe: false,
            persist: false,
        }
    }
}

impl DiscoveryConfig {
    /// Bytes of IP + ICMP header between the MTU and the ICMP payload size
    pub fn overhead(&self, ip_version: IpVersion) -> u32 {
        match ip_version {
            IpVersion::V4 => self.ipv4_overhead,
            IpVersion::V6 => self.ipv6_overhead,
        }
    }
}

/// Parameters of the last interactive run, reused by unattended runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunParams {
    pub ip_version: IpVersion,
    pub target: String,
    pub step: u32,
}

/// An operator-chosen MTU. Discovery leaves this interface alone until cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualOverride {
    pub interface: String,
    pub mtu: u32,
}
