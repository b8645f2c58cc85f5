//! Host inspection
//!
//! Read-only snapshots of what the Proxmox host can offer a new template:
//! cores and memory, storage targets, downloaded images and the operator's
//! public keys. Everything is collected once per run.

pub mod images;
pub mod keys;
pub mod storage;

pub use images::DiskImage;
pub use keys::ShellKey;
pub use storage::StorageTarget;

use crate::PtmError;
use std::path::Path;
use sysinfo::System;
use tracing::debug;

/// Directory public keys are offered from
pub const KEYS_DIR: &str = "/root/.ssh";

/// Host capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostResources {
    pub cores: u32,
    pub memory_mb: u64,
}

impl HostResources {
    /// Read core count and total memory from the running system
    pub fn detect() -> Self {
        let mut system = System::new();
        system.refresh_all();

        let resources = Self {
            cores: system.cpus().len() as u32,
            memory_mb: system.total_memory() / 1024 / 1024,
        };
        debug!(
            "Host has {} cores and {} MB of memory",
            resources.cores, resources.memory_mb
        );
        resources
    }
}

/// Everything the resolver may pick from
#[derive(Debug, Clone)]
pub struct Inventory {
    pub host: HostResources,
    pub storage: Vec<StorageTarget>,
    pub images: Vec<DiskImage>,
    pub keys: Vec<ShellKey>,
}

impl Inventory {
    /// Probe the host, `pvesm`, the image directory and the key directory
    pub async fn collect(images_dir: impl AsRef<Path>) -> Result<Self, PtmError> {
        Ok(Self {
            host: HostResources::detect(),
            storage: storage::list_targets().await?,
            images: images::list_images(images_dir).await?,
            keys: keys::list_keys(KEYS_DIR).await?,
        })
    }

    pub fn find_storage(&self, name: &str) -> Option<&StorageTarget> {
        self.storage.iter().find(|t| t.name == name)
    }

    pub fn find_image(&self, full_path: &str) -> Option<&DiskImage> {
        self.images.iter().find(|i| i.full_path == full_path)
    }

    pub fn find_key(&self, name: &str) -> Option<&ShellKey> {
        self.keys.iter().find(|k| k.name == name)
    }
}

/// Run a read-only helper command and return its stdout
pub(crate) async fn capture(program: &str, args: &[&str]) -> Result<String, PtmError> {
    let output = tokio::process::Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|e| PtmError::Command(format!("{}: {}", program, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PtmError::execution(
            format!("{} {}", program, args.join(" ")),
            output.status,
            stderr.trim(),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
