// Lower and upper bound of the MTU scan.
pub const DEFAULT_MIN_MTU: u32 = 1000;
pub const DEFAULT_MAX_MTU: u32 = 1500;

pub const DEFAULT_STEP: u32 = 1;
pub const MAX_STEP: u32 = 10;

// IPv4 header = 20, ICMP header = 8
pub const IPV4_OVERHEAD: u32 = 28;
// IPv6 header = 40, ICMPv6 header = 8
// no extra margin on top of that for now
pub const IPV6_OVERHEAD: u32 = 48;

static_assertions::const_assert!(DEFAULT_MIN_MTU <= DEFAULT_MAX_MTU);
static_assertions::const_assert!(IPV6_OVERHEAD < DEFAULT_MIN_MTU);
static_assertions::const_assert!(DEFAULT_STEP >= 1 && DEFAULT_STEP <= MAX_STEP);

// Subtracted from the discovered MTU of non-physical interfaces (tunnels, overlays),
// whose encapsulation is invisible to a bare ICMP probe.
pub const DEFAULT_CORRECTION: u32 = 40;

// Subtracted from every discovered MTU before the correction above.
pub const DEFAULT_SAFETY_MARGIN: u32 = 0;

pub const PROBE_TIMEOUT_SECS: u32 = 1;
pub const RETRY_DELAY: std::time::Duration = std::time::Duration::from_secs(1);

pub const DEFAULT_TARGET: &str = "1.1.1.1";

pub const RESERVED_PREFIXES: &[&str] = &["veth", "docker", "br-", "vmnet", "virbr"];

// Trailing '*' means prefix match.
pub const PHYSICAL_PATTERNS: &[&str] = &["eth*", "ens*", "enp*", "eno*", "enx*"];

pub const REQUIRED_TOOLS: &[&str] = &["ping", "ip"];

pub const NETPLAN_DIR: &str = "/etc/netplan";
pub const IFUPDOWN_FILE: &str = "/etc/network/interfaces";
pub const SYSFS_NET_DIR: &str = "/sys/class/net";
