use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::{thread, time};

use log::{debug, error, info, warn};

use crate::adjust::AdjustmentPolicy;
use crate::config::{DiscoveryConfig, IpVersion, ManualOverride};
use crate::error::{MtuError, MtuResult};
use crate::iface::{InterfaceEnumerator, NetworkInterface};
use crate::persist::PersistenceGateway;
use crate::probe::{ProbeRequest, ProbeTransport};

/// Probing parameters for one interface.
/// Invariant: `min_mtu <= max_mtu`, `step > 0`.
#[derive(Debug, Clone)]
pub struct DiscoverySession {
    pub interface: NetworkInterface,
    pub ip_version: IpVersion,
    pub target: String,
    pub min_mtu: u32,
    pub max_mtu: u32,
    pub step: u32,
}

impl DiscoverySession {
    pub fn new(interface: NetworkInterface, ip_version: IpVersion, target: &str,
               min_mtu: u32, max_mtu: u32, step: u32) -> MtuResult<DiscoverySession> {
        if step == 0 {
            return Err(MtuError::InvalidSession("step must be positive".into()));
        }
        if min_mtu > max_mtu {
            return Err(MtuError::InvalidSession(
                format!("min MTU {min_mtu} is above max MTU {max_mtu}")));
        }
        if target.trim().is_empty() {
            return Err(MtuError::InvalidSession("empty target address".into()));
        }
        Ok(DiscoverySession {
            interface,
            ip_version,
            target: target.trim().to_string(),
            min_mtu,
            max_mtu,
            step,
        })
    }

    /// max_mtu, max_mtu - step, ... down to min_mtu
    pub fn candidates(&self) -> impl Iterator<Item = u32> {
        let (min_mtu, step) = (self.min_mtu, self.step);
        std::iter::successors(Some(self.max_mtu), move |mtu| {
            mtu.checked_sub(step).filter(|x| *x >= min_mtu)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryOutcome {
    pub interface: NetworkInterface,
    pub raw_mtu: Option<u32>,
    /// Some iff raw_mtu is Some
    pub applied_mtu: Option<u32>,
    pub probes: usize,
}

/// Intent to set `mtu` on `interface`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Apply {
    pub interface: String,
    pub mtu: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceStatus {
    Skipped { override_mtu: u32 },
    NoWorkingMtu,
    Applied,
    Persisted,
    ApplyFailed(String),
    /// Live value is set, durable config is not
    PersistFailed(String),
}

impl std::fmt::Display for InterfaceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterfaceStatus::Skipped { override_mtu } => write!(f, "skipped (manual MTU {override_mtu})"),
            InterfaceStatus::NoWorkingMtu => write!(f, "no working MTU found"),
            InterfaceStatus::Applied => write!(f, "applied"),
            InterfaceStatus::Persisted => write!(f, "applied and saved"),
            InterfaceStatus::ApplyFailed(reason) => write!(f, "apply failed: {reason}"),
            InterfaceStatus::PersistFailed(reason) => write!(f, "applied, not saved: {reason}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InterfaceReport {
    pub interface: String,
    /// None when skipped
    pub outcome: Option<DiscoveryOutcome>,
    pub status: InterfaceStatus,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub interfaces: Vec<InterfaceReport>,
}

impl RunReport {
    pub fn get(&self, interface: &str) -> Option<&InterfaceReport> {
        self.interfaces.iter().find(|x| x.interface == interface)
    }

    /// Apply intents the gateway accepted
    pub fn applied(&self) -> Vec<Apply> {
        self.interfaces.iter()
            .filter(|x| matches!(x.status,
                                 InterfaceStatus::Applied | InterfaceStatus::Persisted
                                 | InterfaceStatus::PersistFailed(_)))
            .filter_map(|x| {
                let outcome = x.outcome.as_ref()?;
                Some(Apply { interface: x.interface.clone(), mtu: outcome.applied_mtu? })
            })
            .collect()
    }
}

const INTERRUPT_POLL_INTERVAL: time::Duration = time::Duration::from_millis(100);

pub struct MtuSearchEngine<T> {
    transport: T,
    config: DiscoveryConfig,
    policy: AdjustmentPolicy,
    interrupted: Arc<AtomicBool>,
}

impl<T: ProbeTransport> MtuSearchEngine<T> {
    pub fn new(transport: T, config: DiscoveryConfig) -> MtuSearchEngine<T> {
        MtuSearchEngine {
            transport,
            policy: AdjustmentPolicy::from_config(&config),
            config,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The run aborts with `Interrupted` once this flag is set
    pub fn with_interrupt_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupted = flag;
        self
    }

    pub fn session(&self, interface: NetworkInterface, ip_version: IpVersion,
                   target: &str) -> MtuResult<DiscoverySession> {
        let session = DiscoverySession::new(interface, ip_version, target,
                                            self.config.min_mtu, self.config.max_mtu, self.config.step)?;
        self.check_overhead(&session)?;
        Ok(session)
    }

    // every candidate must leave a non-empty payload, or distinct MTUs map to the same probe
    fn check_overhead(&self, session: &DiscoverySession) -> MtuResult<()> {
        let overhead = self.config.overhead(session.ip_version);
        if session.min_mtu <= overhead {
            return Err(MtuError::InvalidSession(
                format!("min MTU {} must exceed the {} byte {} header overhead",
                        session.min_mtu, overhead, session.ip_version)));
        }
        Ok(())
    }

    fn check_interrupted(&self) -> MtuResult<()> {
        if self.interrupted.load(Ordering::SeqCst) {
            return Err(MtuError::Interrupted);
        }
        Ok(())
    }

    fn back_off(&self) -> MtuResult<()> {
        let deadline = time::Instant::now() + self.config.retry_delay;
        loop {
            self.check_interrupted()?;
            let now = time::Instant::now();
            if now >= deadline {
                return Ok(());
            }
            thread::sleep(time::Duration::min(deadline - now, INTERRUPT_POLL_INTERVAL));
        }
    }

    /// Descending linear scan. The first success ends it, one failure rules out
    /// that MTU. Only fails when interrupted.
    pub fn run_once(&self, session: &DiscoverySession) -> MtuResult<DiscoveryOutcome> {
        self.check_overhead(session)?;
        let overhead = self.config.overhead(session.ip_version);
        let mut raw_mtu = None;
        let mut probes = 0;

        for mtu in session.candidates() {
            self.check_interrupted()?;
            let request = ProbeRequest {
                target: session.target.clone(),
                ip_version: session.ip_version,
                payload_size: mtu - overhead,
                timeout_secs: self.config.probe_timeout_secs,
                interface: session.interface.name.clone(),
            };
            probes += 1;
            if self.transport.probe(&request).succeeded {
                debug!("{}: MTU {mtu} ok", session.interface.name);
                raw_mtu = Some(mtu);
                break;
            }
            debug!("{}: MTU {mtu} failed", session.interface.name);
            self.back_off()?;
        }

        let applied_mtu = raw_mtu.map(|mtu| self.policy.adjust(mtu, &session.interface));
        Ok(DiscoveryOutcome {
            interface: session.interface.clone(),
            raw_mtu,
            applied_mtu,
            probes,
        })
    }

    fn apply<G: PersistenceGateway>(&self, gateway: &mut G, apply: &Apply) -> InterfaceStatus {
        if let Err(e) = gateway.apply_live(apply) {
            error!("{e}");
            return InterfaceStatus::ApplyFailed(e.to_string());
        }
        info!("MTU successfully set to {} on {}", apply.mtu, apply.interface);
        if !self.config.persist {
            return InterfaceStatus::Applied;
        }
        match gateway.persist(apply) {
            Ok(()) => {
                info!("MTU {} for {} saved permanently", apply.mtu, apply.interface);
                InterfaceStatus::Persisted
            },
            Err(e) => {
                error!("{e}");
                InterfaceStatus::PersistFailed(e.to_string())
            },
        }
    }

    /// Discover and apply the MTU of every eligible interface, one at a time.
    /// Per-interface failures are recorded in the report; only enumeration problems
    /// and interruption abort the run. Values applied before an abort stay applied.
    pub fn run<E, G>(&self, enumerator: &E, overrides: &[ManualOverride], gateway: &mut G,
                     ip_version: IpVersion, target: &str) -> MtuResult<RunReport>
    where E: InterfaceEnumerator + ?Sized, G: PersistenceGateway {
        let interfaces = enumerator.list()?;
        if interfaces.is_empty() {
            return Err(MtuError::NoInterfacesFound);
        }

        let mut report = RunReport::default();
        for iface in interfaces {
            if let Some(manual) = overrides.iter().find(|x| x.interface == iface.name) {
                info!("Skipping {}: manual MTU {} is set", iface.name, manual.mtu);
                report.interfaces.push(InterfaceReport {
                    interface: iface.name,
                    outcome: None,
                    status: InterfaceStatus::Skipped { override_mtu: manual.mtu },
                });
                continue;
            }

            let session = self.session(iface, ip_version, target)?;
            let name = session.interface.name.clone();
            info!("Starting MTU discovery for {} on {} via {} ({}..={}, step {})",
                  ip_version, session.target, name, session.min_mtu, session.max_mtu, session.step);

            if self.config.raise_before_probe {
                let raise = Apply { interface: name.clone(), mtu: session.max_mtu };
                if let Err(e) = gateway.apply_live(&raise) {
                    warn!("Probing {name} without raising its MTU first: {e}");
                }
            }

            let outcome = self.run_once(&session)?;
            let status = match (outcome.raw_mtu, outcome.applied_mtu) {
                (Some(raw_mtu), Some(applied_mtu)) => {
                    info!("Maximum working MTU for {name} is {raw_mtu} ({} probes), setting {applied_mtu}",
                          outcome.probes);
                    self.apply(gateway, &Apply { interface: name.clone(), mtu: applied_mtu })
                },
                _ => {
                    warn!("{} after {} probes", MtuError::NoWorkingMtuFound(name.clone()), outcome.probes);
                    InterfaceStatus::NoWorkingMtu
                },
            };
            report.interfaces.push(InterfaceReport {
                interface: name,
                outcome: Some(outcome),
                status,
            });
        }
        Ok(report)
    }
}


#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use anyhow::Result;

    use super::*;
    use crate::probe::scripted::ScriptedTransport;

    fn config(min_mtu: u32, max_mtu: u32, step: u32) -> DiscoveryConfig {
        DiscoveryConfig {
            min_mtu,
            max_mtu,
            step,
            retry_delay: time::Duration::ZERO,
            ..DiscoveryConfig::default()
        }
    }

    fn probed_mtus(transport: &ScriptedTransport, overhead: u32) -> Vec<u32> {
        transport.requests().iter().map(|x| x.payload_size + overhead).collect()
    }

    struct StaticEnumerator(Vec<NetworkInterface>);

    impl InterfaceEnumerator for StaticEnumerator {
        fn list(&self) -> MtuResult<Vec<NetworkInterface>> {
            Ok(self.0.clone())
        }
    }

    fn enumerator(names: &[&str]) -> StaticEnumerator {
        StaticEnumerator(names.iter().map(|x| NetworkInterface::new(*x)).collect())
    }

    struct FailingEnumerator;

    impl InterfaceEnumerator for FailingEnumerator {
        fn list(&self) -> MtuResult<Vec<NetworkInterface>> {
            Err(MtuError::Enumeration("netlink unavailable".into()))
        }
    }

    #[derive(Default)]
    struct RecordingGateway {
        live: Vec<Apply>,
        persisted: Vec<Apply>,
        fail_apply: HashSet<String>,
        fail_persist: HashSet<String>,
    }

    impl PersistenceGateway for RecordingGateway {
        fn apply_live(&mut self, apply: &Apply) -> MtuResult<()> {
            if self.fail_apply.contains(&apply.interface) {
                return Err(MtuError::ApplyFailure {
                    interface: apply.interface.clone(),
                    mtu: apply.mtu,
                    reason: "RTNETLINK answers: Operation not permitted".into(),
                });
            }
            self.live.push(apply.clone());
            Ok(())
        }

        fn persist(&mut self, apply: &Apply) -> MtuResult<()> {
            if self.fail_persist.contains(&apply.interface) {
                return Err(MtuError::PersistenceWriteFailure {
                    interface: apply.interface.clone(),
                    mtu: apply.mtu,
                    reason: "read-only file system".into(),
                });
            }
            self.persisted.push(apply.clone());
            Ok(())
        }
    }

    #[test]
    fn test_first_success_stops_scan() -> Result<()> {
        // fails for 1475..=1461, succeeds at 1460
        let transport = ScriptedTransport::with_ceiling(1460 - 28);
        let engine = MtuSearchEngine::new(&transport, config(1420, 1475, 1));
        let session = engine.session(NetworkInterface::new("eth0"), IpVersion::V4, "1.1.1.1")?;

        let outcome = engine.run_once(&session)?;
        assert_eq!(outcome.raw_mtu, Some(1460));
        assert_eq!(outcome.applied_mtu, Some(1460));
        assert_eq!(outcome.probes, 16);
        assert_eq!(transport.probe_count(), 16);
        assert_eq!(probed_mtus(&transport, 28), (1460..=1475).rev().collect::<Vec<_>>());
        Ok(())
    }

    #[test]
    fn test_all_probes_fail() -> Result<()> {
        let transport = ScriptedTransport::new();
        let engine = MtuSearchEngine::new(&transport, config(1420, 1475, 1));
        let mut gateway = RecordingGateway::default();

        let report = engine.run(&enumerator(&["eth0"]), &[], &mut gateway, IpVersion::V4, "1.1.1.1")?;
        let iface = report.get("eth0").unwrap();
        let outcome = iface.outcome.as_ref().unwrap();
        assert_eq!(outcome.raw_mtu, None);
        assert_eq!(outcome.applied_mtu, None);
        assert_eq!(outcome.probes, 56);
        assert_eq!(iface.status, InterfaceStatus::NoWorkingMtu);

        // every candidate exactly once, strictly descending
        assert_eq!(probed_mtus(&transport, 28), (1420..=1475).rev().collect::<Vec<_>>());
        assert!(gateway.live.is_empty());
        assert!(report.applied().is_empty());
        Ok(())
    }

    #[test]
    fn test_tunnel_correction_clamped() -> Result<()> {
        let transport = ScriptedTransport::with_ceiling(1460 - 28);
        let engine = MtuSearchEngine::new(&transport, DiscoveryConfig {
            correction: 40,
            ..config(1420, 1475, 1)
        });
        let mut gateway = RecordingGateway::default();

        let report = engine.run(&enumerator(&["tun0"]), &[], &mut gateway, IpVersion::V4, "1.1.1.1")?;
        let outcome = report.get("tun0").unwrap().outcome.clone().unwrap();
        assert_eq!(outcome.raw_mtu, Some(1460));
        assert_eq!(outcome.applied_mtu, Some(1420));
        assert_eq!(gateway.live, vec![Apply { interface: "tun0".into(), mtu: 1420 }]);
        Ok(())
    }

    #[test]
    fn test_range_containment() -> Result<()> {
        for (min_mtu, max_mtu, step) in [(1420, 1475, 1), (1000, 1500, 7), (1280, 1500, 10),
                                         (1500, 1500, 3), (49, 70, 6)] {
            let transport = ScriptedTransport::new();
            let engine = MtuSearchEngine::new(&transport, config(min_mtu, max_mtu, step));
            let session = engine.session(NetworkInterface::new("eth0"), IpVersion::V6, "::1")?;
            let outcome = engine.run_once(&session)?;

            let probed: Vec<u32> = transport.requests().iter()
                .map(|x| {
                    assert_eq!(x.ip_version, IpVersion::V6);
                    assert_eq!(x.timeout_secs, 1);
                    x.payload_size
                })
                .collect();
            let expected_count = ((max_mtu - min_mtu) / step + 1) as usize;
            assert_eq!(outcome.probes, expected_count);
            assert_eq!(probed.len(), expected_count);

            let candidates: Vec<u32> = session.candidates().collect();
            for mtu in &candidates {
                assert!(*mtu >= min_mtu && *mtu <= max_mtu);
                assert_eq!((max_mtu - mtu) % step, 0);
            }
            assert_eq!(candidates[0], max_mtu);
            assert!(candidates.windows(2).all(|w| w[0] > w[1]));
            assert_eq!(probed, candidates.iter().map(|x| x - 48).collect::<Vec<_>>());
            assert!(probed.iter().all(|x| *x > 0));
        }
        Ok(())
    }

    #[test]
    fn test_early_stop() -> Result<()> {
        for ceiling_mtu in [1500, 1473, 1400, 1003] {
            let transport = ScriptedTransport::with_ceiling(ceiling_mtu - 28);
            let engine = MtuSearchEngine::new(&transport, config(1000, 1500, 3));
            let session = engine.session(NetworkInterface::new("eth0"), IpVersion::V4, "1.1.1.1")?;
            let outcome = engine.run_once(&session)?;

            let raw_mtu = outcome.raw_mtu.unwrap();
            assert!(raw_mtu <= ceiling_mtu && raw_mtu + 3 > ceiling_mtu);
            let probed = probed_mtus(&transport, 28);
            assert_eq!(*probed.last().unwrap(), raw_mtu);
            assert!(probed.iter().all(|x| *x >= raw_mtu));
            assert_eq!(outcome.probes as u32, (1500 - raw_mtu) / 3 + 1);
        }
        Ok(())
    }

    #[test]
    fn test_idempotent() -> Result<()> {
        let transport = ScriptedTransport::with_ceiling(1392);
        let engine = MtuSearchEngine::new(&transport, config(1280, 1500, 2));
        let session = engine.session(NetworkInterface::new("wg0"), IpVersion::V6, "2606:4700:4700::1111")?;

        let first = engine.run_once(&session)?;
        let second = engine.run_once(&session)?;
        assert_eq!(first.raw_mtu, Some(1440));
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn test_invalid_session() {
        let iface = NetworkInterface::new("eth0");
        assert!(matches!(DiscoverySession::new(iface.clone(), IpVersion::V4, "1.1.1.1", 1000, 1500, 0),
                         Err(MtuError::InvalidSession(_))));
        assert!(matches!(DiscoverySession::new(iface.clone(), IpVersion::V4, "1.1.1.1", 1501, 1500, 1),
                         Err(MtuError::InvalidSession(_))));
        assert!(matches!(DiscoverySession::new(iface, IpVersion::V4, " ", 1000, 1500, 1),
                         Err(MtuError::InvalidSession(_))));
    }

    #[test]
    fn test_min_mtu_within_header_overhead() -> Result<()> {
        let transport = ScriptedTransport::with_ceiling(1472);
        let engine = MtuSearchEngine::new(&transport, config(20, 30, 1));
        let eth0 = NetworkInterface::new("eth0");
        assert!(matches!(engine.session(eth0.clone(), IpVersion::V4, "1.1.1.1"),
                         Err(MtuError::InvalidSession(_))));

        // 28 is still all header for IPv4, 48 for IPv6
        let engine = MtuSearchEngine::new(&transport, config(28, 1500, 1));
        assert!(engine.session(eth0.clone(), IpVersion::V4, "1.1.1.1").is_err());
        let engine = MtuSearchEngine::new(&transport, config(29, 1500, 1));
        assert!(engine.session(eth0.clone(), IpVersion::V4, "1.1.1.1").is_ok());
        assert!(engine.session(eth0.clone(), IpVersion::V6, "::1").is_err());

        // a session built by hand is checked too
        let session = DiscoverySession::new(eth0, IpVersion::V4, "1.1.1.1", 20, 30, 1)?;
        assert!(matches!(engine.run_once(&session), Err(MtuError::InvalidSession(_))));

        let mut gateway = RecordingGateway::default();
        let engine = MtuSearchEngine::new(&transport, config(20, 30, 1));
        assert!(engine.run(&enumerator(&["eth0"]), &[], &mut gateway, IpVersion::V4, "1.1.1.1").is_err());
        assert_eq!(transport.probe_count(), 0);
        Ok(())
    }

    #[test]
    fn test_failures_isolated() -> Result<()> {
        let transport = ScriptedTransport::with_ceiling(1472)
            .interface_ceiling("wg0", None)
            .interface_ceiling("tun0", Some(1400 - 28));
        let engine = MtuSearchEngine::new(&transport, DiscoveryConfig {
            persist: true,
            ..config(1300, 1500, 1)
        });
        let mut gateway = RecordingGateway::default();
        gateway.fail_apply.insert("eth0".into());
        gateway.fail_persist.insert("tun0".into());

        let report = engine.run(&enumerator(&["eth0", "wg0", "tun0", "ens3"]), &[], &mut gateway,
                                IpVersion::V4, "1.1.1.1")?;
        let statuses: Vec<(&str, &InterfaceStatus)> = report.interfaces.iter()
            .map(|x| (x.interface.as_str(), &x.status))
            .collect();
        assert!(matches!(statuses[0], ("eth0", InterfaceStatus::ApplyFailed(_))));
        assert_eq!(statuses[1], ("wg0", &InterfaceStatus::NoWorkingMtu));
        assert!(matches!(statuses[2], ("tun0", InterfaceStatus::PersistFailed(_))));
        assert_eq!(statuses[3], ("ens3", &InterfaceStatus::Persisted));

        assert_eq!(gateway.live, vec![
            Apply { interface: "tun0".into(), mtu: 1360 },
            Apply { interface: "ens3".into(), mtu: 1500 },
        ]);
        assert_eq!(gateway.persisted, vec![Apply { interface: "ens3".into(), mtu: 1500 }]);
        assert_eq!(report.applied(), gateway.live);
        Ok(())
    }

    #[test]
    fn test_override_skips_interface() -> Result<()> {
        let transport = ScriptedTransport::with_ceiling(1472);
        let engine = MtuSearchEngine::new(&transport, config(1400, 1500, 10));
        let mut gateway = RecordingGateway::default();
        let overrides = [ManualOverride { interface: "eth0".into(), mtu: 1380 }];

        let report = engine.run(&enumerator(&["eth0", "eth1"]), &overrides, &mut gateway,
                                IpVersion::V4, "1.1.1.1")?;
        assert_eq!(report.get("eth0").unwrap().status, InterfaceStatus::Skipped { override_mtu: 1380 });
        assert!(transport.requests().iter().all(|x| x.interface == "eth1"));
        assert_eq!(gateway.live, vec![Apply { interface: "eth1".into(), mtu: 1500 }]);
        Ok(())
    }

    #[test]
    fn test_raise_before_probe() -> Result<()> {
        let transport = ScriptedTransport::with_ceiling(1400);
        let engine = MtuSearchEngine::new(&transport, DiscoveryConfig {
            raise_before_probe: true,
            ..config(1400, 1500, 10)
        });
        let mut gateway = RecordingGateway::default();

        let report = engine.run(&enumerator(&["eth0"]), &[], &mut gateway, IpVersion::V4, "1.1.1.1")?;
        assert_eq!(gateway.live, vec![
            Apply { interface: "eth0".into(), mtu: 1500 },
            Apply { interface: "eth0".into(), mtu: 1420 },
        ]);
        assert_eq!(report.applied(), vec![Apply { interface: "eth0".into(), mtu: 1420 }]);
        Ok(())
    }

    #[test]
    fn test_fatal_errors() {
        let transport = ScriptedTransport::new();
        let engine = MtuSearchEngine::new(&transport, config(1400, 1500, 10));
        let mut gateway = RecordingGateway::default();

        let err = engine.run(&enumerator(&[]), &[], &mut gateway, IpVersion::V4, "1.1.1.1").unwrap_err();
        assert!(matches!(err, MtuError::NoInterfacesFound));

        let err = engine.run(&FailingEnumerator, &[], &mut gateway, IpVersion::V4, "1.1.1.1").unwrap_err();
        assert!(matches!(err, MtuError::Enumeration(_)));
        assert_eq!(transport.probe_count(), 0);
    }

    #[test]
    fn test_interrupted() -> Result<()> {
        let transport = ScriptedTransport::new();
        let flag = Arc::new(AtomicBool::new(false));
        let engine = MtuSearchEngine::new(&transport, config(1400, 1500, 1))
            .with_interrupt_flag(flag.clone());
        let session = engine.session(NetworkInterface::new("eth0"), IpVersion::V4, "1.1.1.1")?;

        flag.store(true, Ordering::SeqCst);
        assert!(matches!(engine.run_once(&session), Err(MtuError::Interrupted)));
        assert_eq!(transport.probe_count(), 0);
        Ok(())
    }
}
