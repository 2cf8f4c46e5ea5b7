use crate::config::DiscoveryConfig;
use crate::iface::NetworkInterface;

/// Turns a discovered MTU into the value to apply.
///
/// Interfaces matching `physical_patterns` get the discovered value as is. Everything
/// else (tunnels, overlays, bonds of unknown kind) loses `correction` bytes for
/// encapsulation the ICMP probe doesn't see. The result never drops below `min_mtu`.
#[derive(Debug, Clone)]
pub struct AdjustmentPolicy {
    pub correction: u32,
    pub safety_margin: u32,
    pub min_mtu: u32,
    /// Exact names, or prefixes when ending with '*'
    pub physical_patterns: Vec<String>,
}

impl AdjustmentPolicy {
    pub fn from_config(config: &DiscoveryConfig) -> AdjustmentPolicy {
        AdjustmentPolicy {
            correction: config.correction,
            safety_margin: config.safety_margin,
            min_mtu: config.min_mtu,
            physical_patterns: config.physical_patterns.clone(),
        }
    }

    pub fn is_physical(&self, iface: &NetworkInterface) -> bool {
        self.physical_patterns.iter().any(|pattern| {
            match pattern.strip_suffix('*') {
                Some(prefix) => iface.name.starts_with(prefix),
                None => iface.name == *pattern,
            }
        })
    }

    pub fn adjust(&self, raw_mtu: u32, iface: &NetworkInterface) -> u32 {
        let mtu = raw_mtu.saturating_sub(self.safety_margin);
        let mtu = if self.is_physical(iface) {
            mtu
        } else {
            mtu.saturating_sub(self.correction)
        };
        u32::max(mtu, self.min_mtu)
    }
}
