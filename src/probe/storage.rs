//! Proxmox storage targets, as reported by `pvesm status`

use super::capture;
use crate::PtmError;
use tracing::debug;

/// One row of `pvesm status`; sizes are in kilobytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageTarget {
    pub name: String,
    pub storage_type: String,
    pub status: String,
    pub total_kb: u64,
    pub used_kb: u64,
    pub available_kb: u64,
    pub percent_used: String,
}

impl StorageTarget {
    /// Parse a whitespace-separated status line
    pub fn parse_line(line: &str) -> Result<Self, PtmError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 7 {
            return Err(PtmError::InvalidData(format!(
                "malformed storage status line: {}",
                line
            )));
        }

        let number = |value: &str| {
            value.parse::<u64>().map_err(|_| {
                PtmError::InvalidData(format!("malformed storage size `{}` in: {}", value, line))
            })
        };

        Ok(Self {
            name: fields[0].to_string(),
            storage_type: fields[1].to_string(),
            status: fields[2].to_string(),
            total_kb: number(fields[3])?,
            used_kb: number(fields[4])?,
            available_kb: number(fields[5])?,
            percent_used: fields[6].to_string(),
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == "active"
    }

    /// Only active, non-directory storage can hold VM disks
    pub fn is_valid_target(&self) -> bool {
        self.is_active() && self.storage_type != "dir"
    }

    pub fn has_enough_space(&self, required_kb: u64) -> bool {
        self.available_kb >= required_kb
    }

    pub fn available_mb(&self) -> u64 {
        self.available_kb / 1024
    }
}

/// Parse `pvesm status` output, keeping only usable targets
///
/// The first line is the column header.
pub fn parse_status(output: &str) -> Result<Vec<StorageTarget>, PtmError> {
    let mut targets = Vec::new();

    for line in output.lines().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let target = StorageTarget::parse_line(line)?;
        if target.is_valid_target() {
            targets.push(target);
        } else {
            debug!("Skipping storage {} ({}, {})", target.name, target.storage_type, target.status);
        }
    }

    Ok(targets)
}

/// Query the host's storage targets
pub async fn list_targets() -> Result<Vec<StorageTarget>, PtmError> {
    let output = capture("pvesm", &["status"]).await?;
    parse_status(&output)
}
