use crate::config::IpVersion;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    pub target: String,
    pub ip_version: IpVersion,
    /// ICMP payload bytes, i.e. candidate MTU minus IP and ICMP headers
    pub payload_size: u32,
    pub timeout_secs: u32,
    /// Interface the candidate belongs to. Transports may bind to it or ignore it.
    pub interface: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResult {
    pub succeeded: bool,
}

pub trait ProbeTransport {
    // Send a single "don't fragment" echo request and wait at most request.timeout_secs.
    // Any failure, whatever the cause, is reported as `succeeded: false`. No retries here.
    fn probe(&self, request: &ProbeRequest) -> ProbeResult;
}

impl<T> ProbeTransport for &T where T: ProbeTransport {
    fn probe(&self, request: &ProbeRequest) -> ProbeResult {
        (**self).probe(request)
    }
}


pub mod ping;
pub mod scripted;
