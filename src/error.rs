//! Error types for ptm-rs

use thiserror::Error;

/// Main error type for ptm-rs operations
#[derive(Error, Debug)]
pub enum PtmError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Requested resources exceed what the host or storage can provide
    #[error("{0}")]
    Resource(String),

    #[error(transparent)]
    Distribution(#[from] DistributionError),

    /// An external command exited unsuccessfully
    #[error("command execution failed: `{command}` exited with {status}, stderr: {stderr}")]
    Execution {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Cleanup failed: {0}")]
    Cleanup(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("Preflight check failed: {0}")]
    Preflight(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    /// An external command could not be spawned at all
    #[error("Command execution failed: {0}")]
    Command(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl PtmError {
    /// Create an execution error from a command line and its captured output
    pub fn execution(
        command: impl Into<String>,
        status: impl std::fmt::Display,
        stderr: impl Into<String>,
    ) -> Self {
        Self::Execution {
            command: command.into(),
            status: status.to_string(),
            stderr: stderr.into(),
        }
    }

    /// Whether this error can be repaired by asking the operator again
    pub fn is_repairable(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Resource(_) | Self::InvalidData(_)
        )
    }
}

impl From<reqwest::Error> for PtmError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}

/// First violated invariant of a machine or cloud-init specification
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing virtual machine identifier")]
    MissingIdentifier,

    #[error("missing virtual machine name")]
    MissingName,

    #[error("invalid number of cores assigned to virtual machine")]
    InvalidCores,

    #[error("invalid amount of memory assigned to virtual machine")]
    InvalidMemory,

    #[error("missing cpu type for virtual machine")]
    MissingCpuType,

    #[error("missing network driver for virtual machine")]
    MissingNetworkDriver,

    #[error("missing network bridge for virtual machine")]
    MissingNetworkBridge,

    #[error("missing storage for virtual machine")]
    MissingStorage,

    #[error("missing image for virtual machine")]
    MissingImage,

    #[error("Core count must be greater than 0")]
    ZeroCores,

    #[error("Memory must be greater than 0")]
    ZeroMemory,

    #[error("cloud-init configuration requires IPv4 gateway when IPv4 address is not DHCP")]
    Ipv4GatewayRequired,

    #[error("cloud-init configuration requires IPv4 address when IPv4 gateway is set")]
    Ipv4AddressRequired,

    #[error("IPv4 gateway is not in the same network as the IPv4 address")]
    Ipv4GatewayOutsideNetwork,

    #[error("cloud-init configuration requires IPv6 gateway when IPv6 address is not auto")]
    Ipv6GatewayRequired,

    #[error("cloud-init configuration requires IPv6 address when IPv6 gateway is set")]
    Ipv6AddressRequired,

    #[error("IPv6 gateway is not in the same network as the IPv6 address")]
    Ipv6GatewayOutsideNetwork,
}

/// Base image selection the distribution registry cannot satisfy
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DistributionError {
    #[error("distribution {0} is not supported")]
    UnsupportedDistribution(String),

    #[error("release or version {0} is not supported")]
    UnsupportedRelease(String),

    #[error("architecture {0} is not supported")]
    UnsupportedArchitecture(String),

    #[error("image format {0} is not supported")]
    UnsupportedImageFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            ValidationError::MissingStorage.to_string(),
            "missing storage for virtual machine"
        );
        assert_eq!(
            PtmError::from(ValidationError::MissingImage).to_string(),
            "missing image for virtual machine"
        );
    }

    #[test]
    fn test_execution_error_carries_stderr() {
        let err = PtmError::execution("qm template 9000", "exit status: 2", "no such vm");
        let message = err.to_string();
        assert!(message.starts_with("command execution failed:"));
        assert!(message.contains("exit status: 2"));
        assert!(message.ends_with("stderr: no such vm"));
        assert!(!err.is_repairable());
    }

    #[test]
    fn test_repairable_errors() {
        assert!(PtmError::Resource("too many cores".to_string()).is_repairable());
        assert!(PtmError::from(ValidationError::ZeroCores).is_repairable());
        assert!(!PtmError::Cleanup("busy".to_string()).is_repairable());
    }
}
