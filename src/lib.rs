//! ptm-rs library
//!
//! Builds Proxmox VE virtual machine templates from cloud images.
//!
//! A template request comes from command-line flags, the configuration file
//! or an interactive dialogue. The [`resolver`] turns it into one complete
//! [`machine::MachineSpec`] checked against what the host offers, the
//! [`pipeline`] builders translate it into `qm` (or `virt-customize`)
//! invocations, and the executor runs them in order and cleans up after.
//!
//! # Design Principles
//!
//! - **Safety First**: No unsafe code (`unsafe_code = "forbid"`)
//! - **One source wins**: flags beat the configuration file, which beats the dialogue
//! - **Fail early**: specifications are validated before any command runs

pub mod config;
pub mod distributions;
pub mod downloader;
pub mod machine;
pub mod pipeline;
pub mod probe;
pub mod prompt;
pub mod resolver;
pub mod tasks;
pub mod template;
pub mod units;
pub mod validation;

mod error;

pub use error::{DistributionError, PtmError, ValidationError};
