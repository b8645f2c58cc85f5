//! Configuration file model
//!
//! Mirrors the sections of `/etc/ptm/config.yaml`. Every section has
//! defaults so a partial file (or no file at all) still yields a usable
//! configuration.

pub mod loader;

pub use loader::ConfigLoader;

use crate::units;
use crate::PtmError;
use serde::{Deserialize, Serialize};

/// Default directory downloaded images are saved to
pub const DEFAULT_SAVE_TO: &str = "/etc/ptm/images";

/// Packages installed into every customized image unless overridden
pub const DEFAULT_BASE_PACKAGES: &[&str] = &[
    "apt-transport-https",
    "aptitude",
    "ca-certificates",
    "curl",
    "htop",
    "jq",
    "mc",
    "software-properties-common",
    "qemu-guest-agent",
    "wget",
];

/// Complete ptm configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub base_image: BaseImageConfig,
    pub cloud_init: CloudInitConfig,
    pub downloader: DownloaderConfig,
    pub qemu: QemuConfig,
    pub repositories: Vec<RepositoryConfig>,
    pub unattended_upgrades: UnattendedUpgradesConfig,
    pub base_packages: Vec<String>,
    pub extra_packages: Vec<String>,
    pub log_level: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            base_image: BaseImageConfig::default(),
            cloud_init: CloudInitConfig::default(),
            downloader: DownloaderConfig::default(),
            qemu: QemuConfig::default(),
            repositories: Vec::new(),
            unattended_upgrades: UnattendedUpgradesConfig::default(),
            base_packages: Vec::new(),
            extra_packages: Vec::new(),
            log_level: "i".to_string(),
        }
    }
}

impl Configuration {
    /// Parse configuration from YAML
    pub fn from_yaml(content: &str) -> Result<Self, PtmError> {
        let mut config: Self = serde_yaml::from_str(content)?;
        config.apply_package_defaults();
        Ok(config)
    }

    /// Parse configuration from JSON
    pub fn from_json(content: &str) -> Result<Self, PtmError> {
        let mut config: Self = serde_json::from_str(content)?;
        config.apply_package_defaults();
        Ok(config)
    }

    /// An empty `base_packages` list means "use the default set"
    pub fn apply_package_defaults(&mut self) {
        if self.base_packages.is_empty() {
            self.base_packages = DEFAULT_BASE_PACKAGES.iter().map(|p| p.to_string()).collect();
        }
    }

    /// Base and extra packages in install order, without duplicates
    pub fn packages(&self) -> Vec<String> {
        let mut packages: Vec<String> = Vec::new();
        for package in self.base_packages.iter().chain(&self.extra_packages) {
            if !packages.contains(package) {
                packages.push(package.clone());
            }
        }
        packages
    }
}

/// Which cloud image to download and customize
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseImageConfig {
    pub distribution: String,
    /// Release codename or version number
    pub release: String,
    pub minimal: bool,
    pub architecture: String,
    pub format: String,
}

impl Default for BaseImageConfig {
    fn default() -> Self {
        Self {
            distribution: "ubuntu".to_string(),
            release: "jammy".to_string(),
            minimal: true,
            architecture: "amd64".to_string(),
            format: "img".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudInitConfig {
    pub enabled: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ssh_authorized_keys: Vec<String>,
    pub network: CloudInitNetworkConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudInitNetworkConfig {
    pub ipv4: IpConfig,
    pub ipv6: IpConfig,
}

/// Address assignment for one IP family
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IpConfig {
    pub auto_configure: bool,
    /// Address in CIDR notation
    pub ip: Option<String>,
    pub gateway: Option<String>,
}

impl Default for IpConfig {
    fn default() -> Self {
        Self {
            auto_configure: true,
            ip: None,
            gateway: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloaderConfig {
    pub save_to: String,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            save_to: DEFAULT_SAVE_TO.to_string(),
        }
    }
}

/// Virtual machine template settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QemuConfig {
    pub identifier: u32,
    pub name: String,
    pub image: Option<String>,
    pub network: QemuNetworkConfig,
    pub resources: QemuResourcesConfig,
    pub storage: QemuStorageConfig,
}

impl QemuConfig {
    /// Whether enough of the section is filled in to be worth resolving
    pub fn is_configured(&self) -> bool {
        self.identifier != 0
            && !self.name.is_empty()
            && !self.network.driver.is_empty()
            && !self.network.bridge.is_empty()
            && self.resources.cores > 0
            && !self.resources.memory.is_empty()
            && !self.resources.cpu_type.is_empty()
            && !self.storage.name.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QemuNetworkConfig {
    pub driver: String,
    pub bridge: String,
}

impl Default for QemuNetworkConfig {
    fn default() -> Self {
        Self {
            driver: "virtio".to_string(),
            bridge: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QemuResourcesConfig {
    pub cores: u32,
    /// Memory as `1024`, `512M`, `2G` or `1T`
    pub memory: String,
    pub cpu_type: String,
}

impl QemuResourcesConfig {
    /// Memory in megabytes
    pub fn memory_mb(&self) -> Result<u64, PtmError> {
        units::parse_memory_mb(&self.memory)
    }
}

impl Default for QemuResourcesConfig {
    fn default() -> Self {
        Self {
            cores: 0,
            memory: String::new(),
            cpu_type: "host".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QemuStorageConfig {
    pub name: String,
    /// Target disk size such as `8G`
    pub resize: Option<String>,
}

/// Third-party apt repository added during customization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    pub name: String,
    pub gpg: String,
    pub url: String,
    pub release: String,
    pub component: String,
    pub key_name: String,
}

impl RepositoryConfig {
    /// Keyring path the repository's signing key is written to
    pub fn keyring_path(&self) -> String {
        format!("/usr/share/keyrings/{}.gpg", self.key_name)
    }
}

/// Settings rendered into `50unattended-upgrades`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UnattendedUpgradesConfig {
    pub enabled: bool,
    pub whitelist: Vec<String>,
    pub blacklist: Vec<String>,
    pub dev_release: String,
    pub fix_interrupted: bool,
    pub minimal_steps: bool,
    pub install_on_shutdown: bool,
    pub remove_unused_kernel: bool,
    pub remove_unused_dependencies: bool,
    pub remove_unused_auto_depend: bool,
    pub automatic_reboot: bool,
    pub automatic_reboot_with_users: bool,
    pub automatic_reboot_time: String,
}

impl Default for UnattendedUpgradesConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            whitelist: vec![
                "${distro_id}:${distro_codename}".to_string(),
                "${distro_id}:${distro_codename}-security".to_string(),
                "${distro_id}ESMApps:${distro_codename}-apps-security".to_string(),
                "${distro_id}ESM:${distro_codename}-infra-security".to_string(),
                "${distro_id}:${distro_codename}-updates".to_string(),
            ],
            blacklist: Vec::new(),
            dev_release: "auto".to_string(),
            fix_interrupted: true,
            minimal_steps: true,
            install_on_shutdown: false,
            remove_unused_kernel: true,
            remove_unused_dependencies: true,
            remove_unused_auto_depend: true,
            automatic_reboot: false,
            automatic_reboot_with_users: false,
            automatic_reboot_time: "04:00".to_string(),
        }
    }
}
