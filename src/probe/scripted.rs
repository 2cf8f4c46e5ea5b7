use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::{ProbeRequest, ProbeResult, ProbeTransport};

/// Deterministic transport: a probe succeeds iff its payload size is at most
/// the ceiling configured for its interface (or the default ceiling).
/// Every request is recorded.
#[derive(Default)]
pub struct ScriptedTransport {
    default_ceiling: Option<u32>,
    interface_ceilings: HashMap<String, Option<u32>>,
    requests: Mutex<Vec<ProbeRequest>>,
}

impl ScriptedTransport {
    /// Every probe fails
    pub fn new() -> ScriptedTransport {
        Default::default()
    }

    /// Payloads up to `max_payload` bytes get through
    pub fn with_ceiling(max_payload: u32) -> ScriptedTransport {
        ScriptedTransport {
            default_ceiling: Some(max_payload),
            ..Default::default()
        }
    }

    pub fn interface_ceiling<S: Into<String>>(mut self, interface: S, max_payload: Option<u32>) -> Self {
        self.interface_ceilings.insert(interface.into(), max_payload);
        self
    }

    // a panic while holding the lock can't leave the log half-written, so poisoning is ignored
    fn log(&self) -> MutexGuard<'_, Vec<ProbeRequest>> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn requests(&self) -> Vec<ProbeRequest> {
        self.log().clone()
    }

    pub fn probe_count(&self) -> usize {
        self.log().len()
    }
}

impl ProbeTransport for ScriptedTransport {
    fn probe(&self, request: &ProbeRequest) -> ProbeResult {
        self.log().push(request.clone());
        let ceiling = self.interface_ceilings.get(&request.interface)
            .copied()
            .unwrap_or(self.default_ceiling);
        ProbeResult {
            succeeded: ceiling.is_some_and(|c| request.payload_size <= c),
        }
    }
}
