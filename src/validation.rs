//! Specification validation
//!
//! Pure checks over [`MachineSpec`] and [`CloudInitSpec`]. Checks run in a
//! fixed order and stop at the first violation; nothing is mutated.

use crate::error::ValidationError;
use crate::machine::{CloudInitSpec, IpFamily, MachineSpec};
use crate::PtmError;
use std::net::IpAddr;

/// Check that a machine specification is complete, cloud-init included
pub fn validate_machine(spec: &MachineSpec) -> Result<(), ValidationError> {
    validate_hardware(spec)?;
    if let Some(cloud_init) = &spec.cloud_init {
        validate_cloud_init(cloud_init)?;
    }
    Ok(())
}

/// Check every machine field except the attached cloud-init settings
pub fn validate_hardware(spec: &MachineSpec) -> Result<(), ValidationError> {
    if spec.identifier == 0 {
        return Err(ValidationError::MissingIdentifier);
    }
    if spec.name.is_empty() {
        return Err(ValidationError::MissingName);
    }
    if spec.cores == 0 {
        return Err(ValidationError::InvalidCores);
    }
    if spec.memory_mb == 0 {
        return Err(ValidationError::InvalidMemory);
    }
    if spec.cpu_type.is_empty() {
        return Err(ValidationError::MissingCpuType);
    }
    if spec.network_driver.is_empty() {
        return Err(ValidationError::MissingNetworkDriver);
    }
    if spec.network_bridge.is_empty() {
        return Err(ValidationError::MissingNetworkBridge);
    }
    if spec.storage.is_empty() {
        return Err(ValidationError::MissingStorage);
    }
    if spec.image.is_empty() {
        return Err(ValidationError::MissingImage);
    }
    Ok(())
}

/// Check the address/gateway pairing of both IP families
pub fn validate_cloud_init(spec: &CloudInitSpec) -> Result<(), ValidationError> {
    validate_ip_settings(spec, IpFamily::V4)?;
    validate_ip_settings(spec, IpFamily::V6)
}

fn validate_ip_settings(spec: &CloudInitSpec, family: IpFamily) -> Result<(), ValidationError> {
    let settings = spec.settings(family);

    if settings.is_auto(family) {
        return Ok(());
    }

    if settings.gateway.is_empty() {
        return Err(match family {
            IpFamily::V4 => ValidationError::Ipv4GatewayRequired,
            IpFamily::V6 => ValidationError::Ipv6GatewayRequired,
        });
    }

    if settings.address.is_empty() {
        return Err(match family {
            IpFamily::V4 => ValidationError::Ipv4AddressRequired,
            IpFamily::V6 => ValidationError::Ipv6AddressRequired,
        });
    }

    if !in_same_network(&settings.gateway, &settings.address) {
        return Err(match family {
            IpFamily::V4 => ValidationError::Ipv4GatewayOutsideNetwork,
            IpFamily::V6 => ValidationError::Ipv6GatewayOutsideNetwork,
        });
    }

    Ok(())
}

/// Requested cores must be between 1 and what the host has
pub fn check_cores(requested: u32, available: u32) -> Result<(), PtmError> {
    if requested > available {
        return Err(PtmError::Resource(format!(
            "Not enough cores available. Requested: {}, Available: {}",
            requested, available
        )));
    }
    if requested == 0 {
        return Err(ValidationError::ZeroCores.into());
    }
    Ok(())
}

/// Requested memory must be between 1 MB and what the host has
pub fn check_memory(requested_mb: u64, available_mb: u64) -> Result<(), PtmError> {
    if requested_mb > available_mb {
        return Err(PtmError::Resource(format!(
            "Not enough memory available. Requested: {} MB, Available: {} MB",
            requested_mb, available_mb
        )));
    }
    if requested_mb == 0 {
        return Err(ValidationError::ZeroMemory.into());
    }
    Ok(())
}

/// Parse `address/prefix` notation
pub fn parse_cidr(value: &str) -> Option<(IpAddr, u8)> {
    let (address, prefix) = value.trim().split_once('/')?;
    let address: IpAddr = address.parse().ok()?;
    let prefix: u8 = prefix.parse().ok()?;

    let max = match address {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    };
    (prefix <= max).then_some((address, prefix))
}

pub fn is_valid_cidr(value: &str) -> bool {
    parse_cidr(value).is_some()
}

pub fn is_valid_ip(value: &str) -> bool {
    value.trim().parse::<IpAddr>().is_ok()
}

/// Whether `ip` lies inside the network of the CIDR address `network`
pub fn in_same_network(ip: &str, network: &str) -> bool {
    let Ok(ip) = ip.trim().parse::<IpAddr>() else {
        return false;
    };
    let Some((base, prefix)) = parse_cidr(network) else {
        return false;
    };

    match (ip, base) {
        (IpAddr::V4(ip), IpAddr::V4(base)) => {
            let mask = u32::MAX.checked_shl(32 - u32::from(prefix)).unwrap_or(0);
            u32::from(ip) & mask == u32::from(base) & mask
        }
        (IpAddr::V6(ip), IpAddr::V6(base)) => {
            let mask = u128::MAX.checked_shl(128 - u32::from(prefix)).unwrap_or(0);
            u128::from(ip) & mask == u128::from(base) & mask
        }
        _ => false,
    }
}
