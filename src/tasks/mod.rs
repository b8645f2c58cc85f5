//! Subcommand entry points
//!
//! Each task checks the host, gathers what it needs and runs one pipeline.

pub mod customize;
pub mod make;

pub use customize::customize;
pub use make::make;

use crate::probe::capture;
use crate::PtmError;
use tracing::debug;

/// Package that marks a Proxmox VE host
pub const PROXMOX_PACKAGE: &str = "proxmox-ve";

/// Package providing `virt-customize`
pub const LIBGUESTFS_PACKAGE: &str = "libguestfs-tools";

/// Fail unless running as root with `package` installed
pub async fn preflight(package: &str) -> Result<(), PtmError> {
    ensure_root().await?;

    if !is_package_installed(package).await? {
        return Err(PtmError::Preflight(match package {
            PROXMOX_PACKAGE => "this application is only supported on Proxmox VE".to_string(),
            other => format!("{} is not installed. Please install it and try again.", other),
        }));
    }

    debug!("Preflight checks passed for {}", package);
    Ok(())
}

async fn ensure_root() -> Result<(), PtmError> {
    let uid = capture("id", &["-u"]).await?;
    if uid.trim() != "0" {
        return Err(PtmError::Preflight(
            "this application must be run as root".to_string(),
        ));
    }
    Ok(())
}

async fn is_package_installed(package: &str) -> Result<bool, PtmError> {
    let listing = capture("dpkg", &["-l"]).await?;
    Ok(is_listed(&listing, package))
}

/// Whether `dpkg -l` output shows `package` as installed
fn is_listed(listing: &str, package: &str) -> bool {
    listing.lines().any(|line| {
        let mut fields = line.split_whitespace();
        matches!(
            (fields.next(), fields.next()),
            (Some("ii"), Some(name)) if name == package || name.split(':').next() == Some(package)
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
Desired=Unknown/Install/Remove/Purge/Hold
||/ Name                Version      Architecture Description
+++-===================-============-============-==========================
ii  libguestfs-tools    1:1.48.6-2   amd64        guest disk image management
ii  proxmox-ve          8.1.0        all          Proxmox Virtual Environment
rc  qemu-guest-agent    1:7.2+dfsg   amd64        Guest-side qemu-system agent
ii  libc6:amd64         2.36-9       amd64        GNU C Library
";

    #[test]
    fn test_is_listed() {
        assert!(is_listed(LISTING, PROXMOX_PACKAGE));
        assert!(is_listed(LISTING, LIBGUESTFS_PACKAGE));
        assert!(is_listed(LISTING, "libc6"));
        // removed packages do not count
        assert!(!is_listed(LISTING, "qemu-guest-agent"));
        assert!(!is_listed(LISTING, "proxmox"));
    }
}
