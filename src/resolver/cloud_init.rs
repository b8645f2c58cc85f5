//! Cloud-init settings dialogue

use super::{gave_up, Resolver, MAX_ATTEMPTS};
use crate::machine::{CloudInitSpec, ConfigurationSource, IpFamily, IpSettings};
use crate::probe::KEYS_DIR;
use crate::validation::{in_same_network, parse_cidr};
use crate::PtmError;
use std::net::IpAddr;
use tracing::{debug, warn};

/// Whether the family's settings are asked fresh or only revisited
#[derive(Clone, Copy)]
enum Pass {
    Configure,
    Reconfigure,
}

impl Resolver<'_> {
    /// Settle the cloud-init settings attached to the template
    ///
    /// Settings from flags are kept as they are; settings from the
    /// configuration file are reviewed; missing or invalid settings are
    /// replaced by the dialogue.
    pub(super) async fn resolve_cloud_init(
        &mut self,
        candidate: Option<CloudInitSpec>,
    ) -> Result<CloudInitSpec, PtmError> {
        let candidate = candidate.filter(|cloud_init| match cloud_init.validate() {
            Ok(()) => true,
            Err(e) => {
                warn!("Ignoring cloud-init settings from {}: {}", cloud_init.source, e);
                false
            }
        });

        match candidate {
            Some(cloud_init) if cloud_init.source == ConfigurationSource::Flags => Ok(cloud_init),
            Some(mut cloud_init) if cloud_init.source == ConfigurationSource::ConfigFile => {
                self.review_cloud_init(&mut cloud_init).await?;
                Ok(cloud_init)
            }
            _ => self.prompt_cloud_init().await,
        }
    }

    async fn prompt_cloud_init(&mut self) -> Result<CloudInitSpec, PtmError> {
        let mut cloud_init = CloudInitSpec::new(ConfigurationSource::Prompt);

        if !self
            .prompter
            .confirm("Would you like to configure the cloud-init?")?
        {
            cloud_init.auto_configure(IpFamily::V4);
            cloud_init.auto_configure(IpFamily::V6);
            return Ok(cloud_init);
        }

        self.ask_username(&mut cloud_init)?;
        self.ask_password(&mut cloud_init)?;
        self.ask_keys(&mut cloud_init).await?;
        self.ask_network(&mut cloud_init, IpFamily::V4, Pass::Configure)?;
        self.ask_network(&mut cloud_init, IpFamily::V6, Pass::Configure)?;

        Ok(cloud_init)
    }

    /// Fill the gaps left by the configuration file
    async fn review_cloud_init(&mut self, cloud_init: &mut CloudInitSpec) -> Result<(), PtmError> {
        if cloud_init.username.is_none() {
            self.ask_username(cloud_init)?;
        }
        if cloud_init.password.is_none() {
            self.ask_password(cloud_init)?;
        }
        if !cloud_init.has_keys() {
            self.ask_keys(cloud_init).await?;
        }
        self.ask_network(cloud_init, IpFamily::V4, Pass::Reconfigure)?;
        self.ask_network(cloud_init, IpFamily::V6, Pass::Reconfigure)
    }

    fn ask_username(&mut self, cloud_init: &mut CloudInitSpec) -> Result<(), PtmError> {
        if self
            .prompter
            .confirm("Would you like to set the cloud-init username?")?
        {
            let username = self
                .prompter
                .input("Please enter the username for the cloud-init configuration", "")?;
            cloud_init.username = Some(username).filter(|u| !u.is_empty());
        }
        Ok(())
    }

    fn ask_password(&mut self, cloud_init: &mut CloudInitSpec) -> Result<(), PtmError> {
        if self
            .prompter
            .confirm("Would you like to set the cloud-init password?")?
        {
            let password = self
                .prompter
                .password("Please enter the password for the cloud-init configuration")?;
            cloud_init.password = Some(password).filter(|p| !p.is_empty());
        }
        Ok(())
    }

    async fn ask_keys(&mut self, cloud_init: &mut CloudInitSpec) -> Result<(), PtmError> {
        if !self
            .prompter
            .confirm("Would you like to set the cloud-init SSH keys?")?
        {
            return Ok(());
        }

        let names: Vec<String> = self.inventory.keys.iter().map(|k| k.name.clone()).collect();
        if names.is_empty() {
            self.prompter
                .message(&format!("No public keys were found in {}.", KEYS_DIR));
            return Ok(());
        }

        let selected = self.prompter.multi_select(
            "Please select the shell keys for the virtual machine template:",
            &names,
        )?;

        let paths: Vec<String> = selected
            .iter()
            .filter_map(|name| self.inventory.find_key(name))
            .map(|key| key.full_path.clone())
            .collect();

        cloud_init.set_keys(&paths).await;
        debug!("Selected {} SSH keys", cloud_init.keys.len());
        Ok(())
    }

    fn ask_network(
        &mut self,
        cloud_init: &mut CloudInitSpec,
        family: IpFamily,
        pass: Pass,
    ) -> Result<(), PtmError> {
        let label = family.label();
        let question = match pass {
            Pass::Configure => format!("Would you like to configure the cloud-init {}?", label),
            Pass::Reconfigure => format!("Would you like to reconfigure the cloud-init {}?", label),
        };

        if !self.prompter.confirm(&question)? {
            if let Pass::Configure = pass {
                cloud_init.auto_configure(family);
            }
            return Ok(());
        }

        // a gateway outside the address's network starts over at the address
        for _ in 0..MAX_ATTEMPTS {
            let address = self.ask_address(family)?;
            if let Some(gateway) = self.ask_gateway(family, &address)? {
                *cloud_init.settings_mut(family) = IpSettings::manual(address, gateway);
                return Ok(());
            }
        }

        Err(gave_up(&question))
    }

    fn ask_address(&mut self, family: IpFamily) -> Result<String, PtmError> {
        let label = family.label();
        let question = format!(
            "Please enter the {} address for the cloud-init configuration",
            label
        );

        for _ in 0..MAX_ATTEMPTS {
            let answer = self.prompter.input(&question, "")?;
            let answer = answer.trim();
            if parse_cidr(answer).is_some_and(|(ip, _)| matches_family(ip, family)) {
                return Ok(answer.to_string());
            }
            self.prompter
                .message(&format!("The specified {} address is invalid.", label));
        }

        Err(gave_up(&question))
    }

    /// `None` when the gateway lies outside the address's network
    fn ask_gateway(&mut self, family: IpFamily, address: &str) -> Result<Option<String>, PtmError> {
        let label = family.label();
        let question = format!(
            "Please enter the {} gateway for the cloud-init configuration",
            label
        );

        for _ in 0..MAX_ATTEMPTS {
            let answer = self.prompter.input(&question, "")?;
            let answer = answer.trim();

            match answer.parse::<IpAddr>() {
                Ok(ip) if matches_family(ip, family) => {}
                _ => {
                    self.prompter
                        .message(&format!("The specified {} gateway is invalid.", label));
                    continue;
                }
            }

            if !in_same_network(answer, address) {
                self.prompter.message(&format!(
                    "The specified {} gateway is not in the same network as the {} address.",
                    label, label
                ));
                return Ok(None);
            }

            return Ok(Some(answer.to_string()));
        }

        Err(gave_up(&question))
    }
}

fn matches_family(ip: IpAddr, family: IpFamily) -> bool {
    match family {
        IpFamily::V4 => ip.is_ipv4(),
        IpFamily::V6 => ip.is_ipv6(),
    }
}
