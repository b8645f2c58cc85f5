//! Virtual machine template specification
//!
//! A [`MachineSpec`] is built from exactly one [`ConfigurationSource`] and
//! refined by the resolver until it is complete and fits the host.

pub mod cloud_init;

pub use cloud_init::{CloudInitSpec, IpFamily, IpSettings};

use crate::error::ValidationError;
use crate::validation;
use std::fmt;

/// Where a specification came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigurationSource {
    /// Interactive terminal dialogue
    #[default]
    Prompt,
    /// Command-line flags
    Flags,
    /// The configuration file
    ConfigFile,
}

impl fmt::Display for ConfigurationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prompt => write!(f, "prompt"),
            Self::Flags => write!(f, "flags"),
            Self::ConfigFile => write!(f, "configuration file"),
        }
    }
}

/// Everything needed to create one template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MachineSpec {
    pub identifier: u32,
    pub name: String,
    pub cores: u32,
    pub memory_mb: u64,
    pub cpu_type: String,
    pub network_driver: String,
    pub network_bridge: String,
    /// Storage target name
    pub storage: String,
    /// Free space of the storage target, filled in when it is selected
    pub storage_available_kb: u64,
    /// Full path of the source image
    pub image: String,
    /// Size of the source image, filled in when it is selected
    pub image_size_kb: u64,
    /// Requested disk size as written by the operator, e.g. `8G`
    pub resize: Option<String>,
    /// Requested disk size in kilobytes, filled in once the request is checked
    pub resize_kb: u64,
    pub cloud_init: Option<CloudInitSpec>,
    pub source: ConfigurationSource,
}

impl MachineSpec {
    /// Empty specification tagged with its source
    pub fn new(source: ConfigurationSource) -> Self {
        Self {
            source,
            ..Default::default()
        }
    }

    /// Check the completeness invariant, reporting the first violation
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_machine(self)
    }

    /// Same as [`validate`](Self::validate) but ignoring cloud-init
    pub fn validate_hardware(&self) -> Result<(), ValidationError> {
        validation::validate_hardware(self)
    }

    /// Whether the disk has to be grown after import
    pub fn requires_resize(&self) -> bool {
        self.resize_kb != 0 && self.resize_kb > self.image_size_kb
    }
}
