//! Building candidate specifications from flags and the configuration file

use crate::config::{Configuration, IpConfig};
use crate::machine::{CloudInitSpec, ConfigurationSource, IpFamily, IpSettings, MachineSpec};
use crate::units;
use crate::PtmError;
use clap::{ArgAction, Args};

/// Machine and cloud-init settings given on the command line
#[derive(Args, Debug, Clone, Default)]
pub struct MakeFlags {
    /// Identifier of the template
    #[arg(long, default_value_t = 0)]
    pub identifier: u32,

    /// Name of the template
    #[arg(long, default_value = "")]
    pub name: String,

    /// Number of cpu cores
    #[arg(long, default_value_t = 0)]
    pub cores: u32,

    /// Desired cpu type (host / kvm64 / etc)
    #[arg(long, default_value = "")]
    pub cpu_type: String,

    /// Amount of memory (example: 1024 / 1024M / 1G)
    #[arg(long, default_value = "")]
    pub memory: String,

    /// Disk storage (local-lvm / local / etc)
    #[arg(long, default_value = "")]
    pub storage: String,

    /// Path to the image (/etc/ptm/images/image.qcow2)
    #[arg(long, default_value = "")]
    pub image: String,

    /// Size to which the image should be resized (example: 4G)
    #[arg(long, default_value = "")]
    pub image_new_size: String,

    /// Network driver (virtio / e1000 / etc)
    #[arg(long, default_value = "")]
    pub network_driver: String,

    /// Network bridge (vmbr0 / vmbr1 / etc)
    #[arg(long, default_value = "")]
    pub network_bridge: String,

    /// Username for cloud-init
    #[arg(long, default_value = "")]
    pub ci_username: String,

    /// Password for cloud-init
    #[arg(long, default_value = "")]
    pub ci_password: String,

    /// SSH public key, or path to a `.pub` file, for cloud-init (repeatable)
    #[arg(long)]
    pub ci_ssh_keys: Vec<String>,

    /// Automatically configure IPv4 for cloud-init
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub ci_ipv4_auto: bool,

    /// Automatically configure IPv6 for cloud-init
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub ci_ipv6_auto: bool,

    /// IPv4 address for cloud-init (example: 10.10.10.10/24)
    #[arg(long, default_value = "")]
    pub ci_ipv4_address: String,

    /// IPv6 address for cloud-init (example: 2001:db8::1/64)
    #[arg(long, default_value = "")]
    pub ci_ipv6_address: String,

    /// IPv4 gateway for cloud-init (example: 10.10.10.1)
    #[arg(long, default_value = "")]
    pub ci_ipv4_gateway: String,

    /// IPv6 gateway for cloud-init (example: 2001:db8::1)
    #[arg(long, default_value = "")]
    pub ci_ipv6_gateway: String,
}

impl MakeFlags {
    /// Whether any machine setting was given on the command line
    pub fn has_machine_flags(&self) -> bool {
        self.identifier != 0
            || self.cores != 0
            || [
                &self.name,
                &self.cpu_type,
                &self.memory,
                &self.storage,
                &self.image,
                &self.image_new_size,
                &self.network_driver,
                &self.network_bridge,
            ]
            .iter()
            .any(|value| !value.is_empty())
    }
}

/// Candidate specification from command-line flags
///
/// The cloud-init settings are always attached. An enabled `--ci-*-auto`
/// flag wins over an explicit address.
pub async fn from_flags(flags: &MakeFlags) -> Result<MachineSpec, PtmError> {
    let mut spec = MachineSpec::new(ConfigurationSource::Flags);
    spec.identifier = flags.identifier;
    spec.name = flags.name.clone();
    spec.cores = flags.cores;
    if !flags.memory.is_empty() {
        spec.memory_mb = units::parse_memory_mb(&flags.memory)?;
    }
    spec.cpu_type = flags.cpu_type.clone();
    spec.network_driver = flags.network_driver.clone();
    spec.network_bridge = flags.network_bridge.clone();
    spec.storage = flags.storage.clone();
    spec.image = flags.image.clone();
    spec.resize = non_empty(&flags.image_new_size);

    let mut cloud_init = CloudInitSpec::new(ConfigurationSource::Flags);
    cloud_init.username = non_empty(&flags.ci_username);
    cloud_init.password = non_empty(&flags.ci_password);
    cloud_init.set_keys(&flags.ci_ssh_keys).await;

    cloud_init.ipv4 = IpSettings::manual(&flags.ci_ipv4_address, &flags.ci_ipv4_gateway);
    if flags.ci_ipv4_auto {
        cloud_init.auto_configure(IpFamily::V4);
    }
    cloud_init.ipv6 = IpSettings::manual(&flags.ci_ipv6_address, &flags.ci_ipv6_gateway);
    if flags.ci_ipv6_auto {
        cloud_init.auto_configure(IpFamily::V6);
    }

    spec.cloud_init = Some(cloud_init);
    Ok(spec)
}

/// Candidate specification from the `qemu` and `cloud_init` sections
///
/// Cloud-init settings are attached only when the section is enabled.
pub async fn from_config_file(config: &Configuration) -> Result<MachineSpec, PtmError> {
    let qemu = &config.qemu;

    let mut spec = MachineSpec::new(ConfigurationSource::ConfigFile);
    spec.identifier = qemu.identifier;
    spec.name = qemu.name.clone();
    spec.cores = qemu.resources.cores;
    if !qemu.resources.memory.is_empty() {
        spec.memory_mb = qemu.resources.memory_mb()?;
    }
    spec.cpu_type = qemu.resources.cpu_type.clone();
    spec.network_driver = qemu.network.driver.clone();
    spec.network_bridge = qemu.network.bridge.clone();
    spec.storage = qemu.storage.name.clone();
    spec.image = qemu.image.clone().unwrap_or_default();
    spec.resize = qemu.storage.resize.as_deref().and_then(non_empty);

    let section = &config.cloud_init;
    if section.enabled {
        let mut cloud_init = CloudInitSpec::new(ConfigurationSource::ConfigFile);
        cloud_init.username = section.username.as_deref().and_then(non_empty);
        cloud_init.password = section.password.as_deref().and_then(non_empty);
        cloud_init.set_keys(&section.ssh_authorized_keys).await;
        cloud_init.ipv4 = ip_settings(&section.network.ipv4, IpFamily::V4);
        cloud_init.ipv6 = ip_settings(&section.network.ipv6, IpFamily::V6);
        spec.cloud_init = Some(cloud_init);
    }

    Ok(spec)
}

fn ip_settings(config: &IpConfig, family: IpFamily) -> IpSettings {
    if config.auto_configure {
        IpSettings::auto(family)
    } else {
        IpSettings::manual(
            config.ip.clone().unwrap_or_default(),
            config.gateway.clone().unwrap_or_default(),
        )
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
