//! apt configuration files rendered into customized images
//!
//! `50unattended-upgrades` is rendered from [`UnattendedUpgradesConfig`] with
//! minijinja; `20auto-upgrades` is static.

use crate::config::UnattendedUpgradesConfig;
use crate::PtmError;
use minijinja::Environment;
use tracing::debug;

/// Location of the unattended-upgrades configuration inside the image
pub const UNATTENDED_UPGRADES_PATH: &str = "/etc/apt/apt.conf.d/50unattended-upgrades";

/// File name the rendered unattended-upgrades file is staged under on the host
pub const UNATTENDED_UPGRADES_STAGED_NAME: &str = "ptm-50unattended-upgrades";

/// Location of the periodic apt configuration inside the image
pub const AUTO_UPGRADES_PATH: &str = "/etc/apt/apt.conf.d/20auto-upgrades";

pub const AUTO_UPGRADES_STAGED_NAME: &str = "ptm-20auto-upgrades";

const UNATTENDED_UPGRADES_TEMPLATE: &str = r#"
Unattended-Upgrade::Allowed-Origins {
	{%- for origin in whitelist %}
	"{{ origin }}";
	{%- endfor %}
};

Unattended-Upgrade::Package-Blacklist {
	{%- for package in blacklist %}
	"{{ package }}";
	{%- endfor %}
};

Unattended-Upgrade::DevRelease "{{ dev_release }}";
Unattended-Upgrade::AutoFixInterruptedDpkg "{{ fix_interrupted }}";
Unattended-Upgrade::MinimalSteps "{{ minimal_steps }}";
Unattended-Upgrade::InstallOnShutdown "{{ install_on_shutdown }}";
Unattended-Upgrade::Remove-Unused-Kernel-Packages "{{ remove_unused_kernel }}";
Unattended-Upgrade::Remove-New-Unused-Dependencies "{{ remove_unused_auto_depend }}";
Unattended-Upgrade::Remove-Unused-Dependencies "{{ remove_unused_dependencies }}";
Unattended-Upgrade::Automatic-Reboot "{{ automatic_reboot }}";
Unattended-Upgrade::Automatic-Reboot-WithUsers "{{ automatic_reboot_with_users }}";
Unattended-Upgrade::Automatic-Reboot-Time "{{ automatic_reboot_time }}";
"#;

const AUTO_UPGRADES: &str = r#"
APT::Periodic::Update-Package-Lists "1";
APT::Periodic::Download-Upgradeable-Packages "1";
APT::Periodic::AutocleanInterval "7";
APT::Periodic::Unattended-Upgrade "1";
"#;

/// Render `50unattended-upgrades`
pub fn render_unattended_upgrades(config: &UnattendedUpgradesConfig) -> Result<String, PtmError> {
    debug!("Rendering unattended-upgrades configuration");

    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);

    env.add_template("50unattended-upgrades", UNATTENDED_UPGRADES_TEMPLATE)
        .map_err(|e| PtmError::Template(format!("Template parse error: {}", e)))?;

    let tmpl = env
        .get_template("50unattended-upgrades")
        .map_err(|e| PtmError::Template(format!("Template error: {}", e)))?;

    tmpl.render(config)
        .map_err(|e| PtmError::Template(format!("Template render error: {}", e)))
}

/// Contents of `20auto-upgrades`
pub fn auto_upgrades() -> &'static str {
    AUTO_UPGRADES
}
