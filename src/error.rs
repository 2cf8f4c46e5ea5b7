use thiserror::Error;

#[derive(Error, Debug)]
pub enum MtuError {
    #[error("Required tool missing: {0}")]
    ToolMissing(String),

    #[error("Failed to enumerate interfaces: {0}")]
    Enumeration(String),

    #[error("No network interfaces found")]
    NoInterfacesFound,

    #[error("Invalid discovery session: {0}")]
    InvalidSession(String),

    /// Per interface, never fatal to the run
    #[error("No working MTU found for {0}")]
    NoWorkingMtuFound(String),

    #[error("Failed to set MTU {mtu} on {interface}: {reason}")]
    ApplyFailure { interface: String, mtu: u32, reason: String },

    /// The live value stays applied, it just won't survive a reboot
    #[error("Failed to persist MTU {mtu} for {interface}: {reason}")]
    PersistenceWriteFailure { interface: String, mtu: u32, reason: String },

    #[error("Failed to load saved configuration: {0}")]
    ConfigLoadFailure(String),

    #[error("Interrupted")]
    Interrupted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type MtuResult<T> = Result<T, MtuError>;
