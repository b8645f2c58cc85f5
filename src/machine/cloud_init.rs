//! Cloud-init settings attached to a template

use super::ConfigurationSource;
use crate::error::ValidationError;
use crate::validation;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Address value meaning "let DHCP assign IPv4"
pub const IPV4_AUTO: &str = "dhcp";

/// Address value meaning "let SLAAC assign IPv6"
pub const IPV6_AUTO: &str = "auto";

/// Where authorized keys are staged for `qm set --sshkey`
pub const DEFAULT_KEYS_PATH: &str = "/tmp/ptm-ssh-keys";

/// Accepted key types and the minimum length of their base64 body
const SSH_KEY_TYPES: &[(&str, usize)] = &[
    ("ssh-rsa", 100),
    ("ssh-dss", 100),
    ("ecdsa-sha2-nistp256", 60),
    ("ecdsa-sha2-nistp384", 80),
    ("ecdsa-sha2-nistp521", 100),
    ("ssh-ed25519", 30),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpFamily {
    V4,
    V6,
}

impl IpFamily {
    pub fn auto_sentinel(self) -> &'static str {
        match self {
            Self::V4 => IPV4_AUTO,
            Self::V6 => IPV6_AUTO,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::V4 => "IPv4",
            Self::V6 => "IPv6",
        }
    }
}

/// Address and gateway of one IP family; empty strings mean "not set"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpSettings {
    pub address: String,
    pub gateway: String,
}

impl IpSettings {
    pub fn auto(family: IpFamily) -> Self {
        Self {
            address: family.auto_sentinel().to_string(),
            gateway: String::new(),
        }
    }

    pub fn manual(address: impl Into<String>, gateway: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            gateway: gateway.into(),
        }
    }

    pub fn is_auto(&self, family: IpFamily) -> bool {
        self.address == family.auto_sentinel()
    }
}

/// Cloud-init drive contents for a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudInitSpec {
    pub username: Option<String>,
    pub password: Option<String>,
    /// Validated public keys, one per entry
    pub keys: Vec<String>,
    pub ipv4: IpSettings,
    pub ipv6: IpSettings,
    /// Temporary file the keys are written to before import
    pub keys_path: PathBuf,
    pub source: ConfigurationSource,
}

impl Default for CloudInitSpec {
    fn default() -> Self {
        Self::new(ConfigurationSource::Prompt)
    }
}

impl CloudInitSpec {
    /// Auto-configured networking, no user, no keys
    pub fn new(source: ConfigurationSource) -> Self {
        Self {
            username: None,
            password: None,
            keys: Vec::new(),
            ipv4: IpSettings::auto(IpFamily::V4),
            ipv6: IpSettings::auto(IpFamily::V6),
            keys_path: PathBuf::from(DEFAULT_KEYS_PATH),
            source,
        }
    }

    pub fn settings(&self, family: IpFamily) -> &IpSettings {
        match family {
            IpFamily::V4 => &self.ipv4,
            IpFamily::V6 => &self.ipv6,
        }
    }

    pub fn settings_mut(&mut self, family: IpFamily) -> &mut IpSettings {
        match family {
            IpFamily::V4 => &mut self.ipv4,
            IpFamily::V6 => &mut self.ipv6,
        }
    }

    pub fn auto_configure(&mut self, family: IpFamily) {
        *self.settings_mut(family) = IpSettings::auto(family);
    }

    pub fn has_keys(&self) -> bool {
        !self.keys.is_empty()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_cloud_init(self)
    }

    /// Replace the key list
    ///
    /// Entries ending in `.pub` are read from disk (`~/` is expanded).
    /// Unreadable files and malformed keys are skipped with a warning.
    pub async fn set_keys(&mut self, entries: &[String]) {
        let mut keys = Vec::new();

        for entry in entries {
            let key = if entry.ends_with(".pub") {
                let path = expand_home(entry);
                match fs::read_to_string(&path).await {
                    Ok(content) => {
                        debug!("Read SSH key from {}", path.display());
                        content.trim().to_string()
                    }
                    Err(e) => {
                        warn!("Failed to read SSH key file {}: {}", path.display(), e);
                        continue;
                    }
                }
            } else {
                entry.trim().to_string()
            };

            if !is_valid_ssh_key(&key) {
                warn!("Invalid SSH key: {}, ignoring", key);
                continue;
            }

            keys.push(key);
        }

        self.keys = keys;
    }

    /// Value for `qm set --ipconfig0`
    pub fn ipconfig(&self) -> String {
        let ipv6 = if self.ipv6.is_auto(IpFamily::V6) {
            format!("ip6={}", IPV6_AUTO)
        } else {
            format!("gw6={},ip6={}", self.ipv6.gateway, self.ipv6.address)
        };

        let ipv4 = if self.ipv4.is_auto(IpFamily::V4) {
            format!("ip={}", IPV4_AUTO)
        } else {
            format!("gw4={},ip={}", self.ipv4.gateway, self.ipv4.address)
        };

        format!("{},{}", ipv6, ipv4)
    }
}

/// Check a public key line: `<type> <base64>[ <comment>]`
pub fn is_valid_ssh_key(key: &str) -> bool {
    let Some((kind, rest)) = key.trim().split_once(' ') else {
        return false;
    };

    let Some(min_len) = SSH_KEY_TYPES
        .iter()
        .find(|(name, _)| *name == kind)
        .map(|(_, len)| *len)
    else {
        return false;
    };

    let body = rest.split_once(' ').map_or(rest, |(body, _comment)| body);
    let data = body.trim_end_matches('=');

    body.len() - data.len() <= 2
        && data.len() >= min_len
        && data
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/')
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => Path::new(&home).join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ed25519_key() -> String {
        format!("ssh-ed25519 {} user@host", "A".repeat(68))
    }

    #[test]
    fn test_valid_ssh_keys() {
        assert!(is_valid_ssh_key(&ed25519_key()));
        assert!(is_valid_ssh_key(&format!("ssh-rsa {}==", "B".repeat(372))));
        assert!(is_valid_ssh_key(&format!("ecdsa-sha2-nistp256 {}=", "c".repeat(139))));
    }

    #[test]
    fn test_invalid_ssh_keys() {
        assert!(!is_valid_ssh_key(""));
        assert!(!is_valid_ssh_key("ssh-ed25519"));
        assert!(!is_valid_ssh_key(&format!("ssh-foo {}", "A".repeat(68))));
        // body too short for rsa
        assert!(!is_valid_ssh_key(&format!("ssh-rsa {}", "A".repeat(50))));
        // too much padding
        assert!(!is_valid_ssh_key(&format!("ssh-ed25519 {}===", "A".repeat(40))));
        // illegal characters
        assert!(!is_valid_ssh_key(&format!("ssh-ed25519 {}$$", "A".repeat(40))));
    }

    #[test]
    fn test_default_is_auto() {
        let spec = CloudInitSpec::default();
        assert!(spec.ipv4.is_auto(IpFamily::V4));
        assert!(spec.ipv6.is_auto(IpFamily::V6));
        assert_eq!(spec.keys_path, PathBuf::from("/tmp/ptm-ssh-keys"));
        assert_eq!(spec.ipconfig(), "ip6=auto,ip=dhcp");
    }

    #[test]
    fn test_ipconfig_manual() {
        let mut spec = CloudInitSpec::default();
        spec.ipv4 = IpSettings::manual("10.0.0.5/24", "10.0.0.1");
        assert_eq!(spec.ipconfig(), "ip6=auto,gw4=10.0.0.1,ip=10.0.0.5/24");

        spec.ipv6 = IpSettings::manual("2001:db8::5/64", "2001:db8::1");
        assert_eq!(
            spec.ipconfig(),
            "gw6=2001:db8::1,ip6=2001:db8::5/64,gw4=10.0.0.1,ip=10.0.0.5/24"
        );

        spec.auto_configure(IpFamily::V4);
        assert_eq!(spec.ipconfig(), "gw6=2001:db8::1,ip6=2001:db8::5/64,ip=dhcp");
    }

    #[tokio::test]
    async fn test_set_keys_reads_files_and_skips_invalid() {
        let temp = TempDir::new().unwrap();
        let key_file = temp.path().join("id_ed25519.pub");
        fs::write(&key_file, format!("{}\n", ed25519_key()))
            .await
            .unwrap();

        let mut spec = CloudInitSpec::default();
        spec.set_keys(&[
            key_file.display().to_string(),
            "not a key".to_string(),
            temp.path().join("missing.pub").display().to_string(),
            ed25519_key(),
        ])
        .await;

        assert_eq!(spec.keys, vec![ed25519_key(), ed25519_key()]);
        assert!(spec.has_keys());
    }
}
