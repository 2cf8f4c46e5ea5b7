use std::process::{Command, Stdio};

use log::{debug, trace};

use crate::config::IpVersion;

use super::{ProbeRequest, ProbeResult, ProbeTransport};

/// Probes with iputils ping(8): `ping -M do -c 1 -s <size> -W <timeout>`.
pub struct PingTransport {
    program: String,
    /// Pass `-I <interface>` so the probe leaves through the interface under test
    bind_interface: bool,
}

impl Default for PingTransport {
    fn default() -> Self {
        Self {
            program: "ping".into(),
            bind_interface: false,
        }
    }
}

impl PingTransport {
    pub fn new(bind_interface: bool) -> PingTransport {
        PingTransport {
            bind_interface,
            ..Default::default()
        }
    }

    fn args(&self, request: &ProbeRequest) -> Vec<String> {
        let mut args: Vec<String> = vec![
            match request.ip_version {
                IpVersion::V4 => "-4".into(),
                IpVersion::V6 => "-6".into(),
            },
            "-M".into(), "do".into(),
            "-c".into(), "1".into(),
            "-s".into(), request.payload_size.to_string(),
            "-W".into(), request.timeout_secs.to_string(),
        ];
        if self.bind_interface {
            args.push("-I".into());
            args.push(request.interface.clone());
        }
        args.push(request.target.clone());
        args
    }
}

impl ProbeTransport for PingTransport {
    fn probe(&self, request: &ProbeRequest) -> ProbeResult {
        let args = self.args(request);
        trace!("Running {} {}", self.program, args.join(" "));
        let status = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match status {
            Ok(status) => ProbeResult { succeeded: status.success() },
            Err(e) => {
                debug!("Failed to run {}: {}", self.program, e);
                ProbeResult { succeeded: false }
            },
        }
    }
}
