//! Tests for the configuration resolver

use ptm_rs::config::Configuration;
use ptm_rs::machine::{ConfigurationSource, IpFamily, IpSettings, MachineSpec};
use ptm_rs::probe::images::QemuImageInfo;
use ptm_rs::probe::storage::parse_status;
use ptm_rs::probe::{DiskImage, HostResources, Inventory, ShellKey};
use ptm_rs::prompt::mock::ScriptedPrompter;
use ptm_rs::resolver::{from_config_file, from_flags, MakeFlags, Resolver, MAX_ATTEMPTS};
use ptm_rs::tasks::make::candidate;
use ptm_rs::{PtmError, ValidationError};
use tempfile::TempDir;

const STATUS: &str = "\
Name             Type     Status           Total            Used       Available        %
local             dir     active        98497780        12345678        81068540   12.53%
local-lvm     lvmthin     active       832888832       123456789       709432043   14.82%
";

const IMAGE: &str = "/etc/ptm/images/ubuntu-22.04-minimal-cloudimg-amd64.img";

fn inventory() -> Inventory {
    let info = QemuImageInfo::from_json(&format!(
        r#"{{"virtual-size": 2361393152, "filename": "{}", "format": "qcow2", "actual-size": 681574400}}"#,
        IMAGE
    ))
    .unwrap();

    Inventory {
        host: HostResources {
            cores: 4,
            memory_mb: 8192,
        },
        storage: parse_status(STATUS).unwrap(),
        images: vec![DiskImage::new(
            "ubuntu-22.04-minimal-cloudimg-amd64.img",
            IMAGE,
            681574400,
            &info,
        )],
        keys: Vec::new(),
    }
}

fn flags() -> MakeFlags {
    MakeFlags {
        identifier: 9000,
        name: "ubuntu-template".to_string(),
        cores: 2,
        memory: "2G".to_string(),
        cpu_type: "host".to_string(),
        network_driver: "virtio".to_string(),
        network_bridge: "vmbr0".to_string(),
        storage: "local-lvm".to_string(),
        image: IMAGE.to_string(),
        ci_ipv4_auto: true,
        ci_ipv6_auto: true,
        ..Default::default()
    }
}

async fn resolve(
    inventory: &Inventory,
    prompter: &mut ScriptedPrompter,
    candidate: Option<MachineSpec>,
) -> Result<MachineSpec, PtmError> {
    Resolver::new(inventory, prompter).resolve(candidate).await
}

// ==================== Flags Tests ====================

/// Flags missing storage fail without any dialogue
#[tokio::test]
async fn test_flags_missing_storage_is_fatal() {
    let mut flags = flags();
    flags.storage.clear();
    let candidate = from_flags(&flags).await.unwrap();

    let inventory = inventory();
    let mut prompter = ScriptedPrompter::new();
    let err = resolve(&inventory, &mut prompter, Some(candidate))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "missing storage for virtual machine");
    assert!(matches!(
        err,
        PtmError::Validation(ValidationError::MissingStorage)
    ));
    assert!(prompter.questions().is_empty());
}

#[tokio::test]
async fn test_complete_flags_resolve_silently() {
    let candidate = from_flags(&flags()).await.unwrap();
    let inventory = inventory();
    let mut prompter = ScriptedPrompter::new();

    let spec = resolve(&inventory, &mut prompter, Some(candidate))
        .await
        .unwrap();

    assert!(prompter.questions().is_empty());
    assert_eq!(spec.source, ConfigurationSource::Flags);
    assert_eq!(spec.memory_mb, 2048);
    assert_eq!(spec.storage_available_kb, 709432043);
    assert_eq!(spec.image_size_kb, 2306048);
    assert!(!spec.requires_resize());

    let cloud_init = spec.cloud_init.unwrap();
    assert_eq!(cloud_init.source, ConfigurationSource::Flags);
    assert_eq!(cloud_init.ipconfig(), "ip6=auto,ip=dhcp");
}

/// Requesting every core is fine, one more is not, none is invalid
#[tokio::test]
async fn test_flags_core_boundary() {
    let inventory = inventory();

    for (cores, expected) in [(4, Ok(())), (5, Err("resource")), (0, Err("validation"))] {
        let mut flags = flags();
        flags.cores = cores;
        let candidate = from_flags(&flags).await.unwrap();
        let mut prompter = ScriptedPrompter::new();

        let result = resolve(&inventory, &mut prompter, Some(candidate)).await;
        match (result, expected) {
            (Ok(spec), Ok(())) => assert_eq!(spec.cores, 4),
            (Err(PtmError::Resource(message)), Err("resource")) => assert_eq!(
                message,
                "Not enough cores available. Requested: 5, Available: 4"
            ),
            (Err(PtmError::Validation(ValidationError::InvalidCores)), Err("validation")) => {}
            (other, expected) => panic!("cores {}: got {:?}, expected {:?}", cores, other, expected),
        }
        assert!(prompter.questions().is_empty());
    }
}

#[tokio::test]
async fn test_flags_unknown_storage_and_image() {
    let inventory = inventory();

    let mut flags = flags();
    flags.storage = "ceph".to_string();
    let candidate = from_flags(&flags).await.unwrap();
    let err = resolve(&inventory, &mut ScriptedPrompter::new(), Some(candidate))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "storage `ceph` could not be found");

    let mut flags = self::flags();
    flags.image = "/etc/ptm/images/missing.img".to_string();
    let candidate = from_flags(&flags).await.unwrap();
    let err = resolve(&inventory, &mut ScriptedPrompter::new(), Some(candidate))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "image `/etc/ptm/images/missing.img` could not be found"
    );
}

#[tokio::test]
async fn test_flags_resize() {
    let inventory = inventory();

    let mut flags = flags();
    flags.image_new_size = "8G".to_string();
    let candidate = from_flags(&flags).await.unwrap();
    let spec = resolve(&inventory, &mut ScriptedPrompter::new(), Some(candidate))
        .await
        .unwrap();
    assert_eq!(spec.resize_kb, 8 * 1024 * 1024);
    assert!(spec.requires_resize());

    flags.image_new_size = "1T".to_string();
    let candidate = from_flags(&flags).await.unwrap();
    let err = resolve(&inventory, &mut ScriptedPrompter::new(), Some(candidate))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Not enough space on the storage. Requested: 1048576 MB, Available: 692804 MB"
    );
}

#[tokio::test]
async fn test_invalid_flag_cloud_init_goes_to_dialogue() {
    let mut flags = flags();
    flags.ci_ipv4_auto = false;
    flags.ci_ipv4_address = "10.0.0.5/24".to_string();
    let candidate = from_flags(&flags).await.unwrap();

    let inventory = inventory();
    let mut prompter = ScriptedPrompter::new().confirm(false);
    let spec = resolve(&inventory, &mut prompter, Some(candidate))
        .await
        .unwrap();

    assert_eq!(
        prompter.questions(),
        ["Would you like to configure the cloud-init?"]
    );
    let cloud_init = spec.cloud_init.unwrap();
    assert_eq!(cloud_init.source, ConfigurationSource::Prompt);
    assert!(cloud_init.ipv4.is_auto(IpFamily::V4));
}

// ==================== Configuration File Tests ====================

const CONFIG: &str = r#"
qemu:
  identifier: 9100
  name: from-file
  network:
    bridge: vmbr0
  resources:
    cores: 2
    memory: 1G
  storage:
    name: local-lvm
cloud_init:
  enabled: true
  username: admin
"#;

/// A missing image is picked interactively; gaps in cloud-init are offered
#[tokio::test]
async fn test_config_file_repairs_image_and_reviews_cloud_init() {
    let temp = TempDir::new().unwrap();
    let key_path = temp.path().join("id_ed25519.pub");
    let key = format!("ssh-ed25519 {} root@pve", "C".repeat(68));
    std::fs::write(&key_path, &key).unwrap();

    let mut inventory = inventory();
    inventory.keys.push(ShellKey {
        name: "id_ed25519.pub".to_string(),
        full_path: key_path.display().to_string(),
        content: key.clone(),
    });

    let config = Configuration::from_yaml(CONFIG).unwrap();
    let candidate = from_config_file(&config).await.unwrap();

    let mut prompter = ScriptedPrompter::new()
        .select(IMAGE)
        .confirm(false)
        .confirm(true)
        .multi_select(&["id_ed25519.pub"])
        .confirm(false)
        .confirm(false);

    let spec = resolve(&inventory, &mut prompter, Some(candidate))
        .await
        .unwrap();

    assert_eq!(
        prompter.questions(),
        [
            "Please select the target image for the virtual machine template",
            "Would you like to set the cloud-init password?",
            "Would you like to set the cloud-init SSH keys?",
            "Please select the shell keys for the virtual machine template:",
            "Would you like to reconfigure the cloud-init IPv4?",
            "Would you like to reconfigure the cloud-init IPv6?",
        ]
    );
    assert_eq!(spec.source, ConfigurationSource::ConfigFile);
    assert_eq!(spec.image, IMAGE);

    let cloud_init = spec.cloud_init.unwrap();
    assert_eq!(cloud_init.username.as_deref(), Some("admin"));
    assert_eq!(cloud_init.password, None);
    assert_eq!(cloud_init.keys, vec![key]);
}

/// Gaps other than the image send the configuration file to the dialogue
#[tokio::test]
async fn test_incomplete_config_file_falls_back_to_dialogue() {
    let mut config = Configuration::from_yaml(CONFIG).unwrap();
    config.qemu.network.bridge.clear();
    let candidate = from_config_file(&config).await.unwrap();

    let inventory = inventory();
    let mut prompter = ScriptedPrompter::new();
    let err = resolve(&inventory, &mut prompter, Some(candidate))
        .await
        .unwrap_err();

    // the empty script ends the dialogue at its first question
    assert!(matches!(err, PtmError::Prompt(_)));
    assert_eq!(
        prompter.questions(),
        ["Please enter the identifier for the virtual machine template"]
    );
}

/// A partial set of flags does not hide a complete configuration file
#[tokio::test]
async fn test_partial_flags_resolve_from_config_file() {
    let mut config = Configuration::from_yaml(CONFIG).unwrap();
    config.qemu.image = Some(IMAGE.to_string());
    config.cloud_init.enabled = false;

    let flags = MakeFlags {
        cores: 2,
        ..Default::default()
    };
    let candidate = candidate(&config, &flags).await.unwrap();

    let inventory = inventory();
    let mut prompter = ScriptedPrompter::new().confirm(false);
    let spec = resolve(&inventory, &mut prompter, candidate).await.unwrap();

    assert_eq!(spec.source, ConfigurationSource::ConfigFile);
    assert_eq!(spec.identifier, 9100);
    assert_eq!(spec.name, "from-file");
    assert_eq!(spec.image, IMAGE);
    assert_eq!(
        prompter.questions(),
        ["Would you like to configure the cloud-init?"]
    );
}

/// Partial flags with nothing to fall back on still fail without a dialogue
#[tokio::test]
async fn test_partial_flags_without_config_file_are_fatal() {
    let mut flags = flags();
    flags.storage.clear();
    let candidate = candidate(&Configuration::default(), &flags).await.unwrap();

    let inventory = inventory();
    let mut prompter = ScriptedPrompter::new();
    let err = resolve(&inventory, &mut prompter, candidate)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "missing storage for virtual machine");
    assert!(prompter.questions().is_empty());
}

// ==================== Dialogue Tests ====================

#[tokio::test]
async fn test_full_dialogue() {
    let inventory = inventory();
    let mut prompter = ScriptedPrompter::new()
        .default_answer() // identifier
        .default_answer() // name
        .text("9")
        .text("2")
        .default_answer() // memory
        .default_answer() // cpu type
        .default_answer() // network driver
        .default_answer() // network bridge
        .select("local-lvm")
        .select(IMAGE)
        .confirm(true)
        .text("8G")
        .confirm(true) // cloud-init
        .confirm(true)
        .text("admin")
        .confirm(false) // password
        .confirm(false) // keys
        .confirm(true) // IPv4
        .text("10.0.0.5")
        .text("192.168.1.10/24")
        .text("192.168.2.1")
        .text("192.168.1.10/24")
        .text("192.168.1.1")
        .confirm(false); // IPv6

    let spec = resolve(&inventory, &mut prompter, None).await.unwrap();

    assert_eq!(prompter.remaining(), 0);
    assert_eq!(
        prompter.messages(),
        [
            "Not enough cores available. Requested: 9, Available: 4",
            "The specified IPv4 address is invalid.",
            "The specified IPv4 gateway is not in the same network as the IPv4 address.",
        ]
    );
    assert_eq!(
        prompter.questions()[2],
        "Please enter the core count for the virtual machine template [1-4]"
    );

    assert_eq!(spec.source, ConfigurationSource::Prompt);
    assert_eq!(spec.identifier, 9000);
    assert_eq!(spec.name, "ptm-template");
    assert_eq!(spec.cores, 2);
    assert_eq!(spec.memory_mb, 512);
    assert_eq!(spec.network_bridge, "vmbr0");
    assert_eq!(spec.resize.as_deref(), Some("8G"));
    assert!(spec.requires_resize());

    let cloud_init = spec.cloud_init.unwrap();
    assert_eq!(cloud_init.username.as_deref(), Some("admin"));
    assert_eq!(
        cloud_init.ipv4,
        IpSettings::manual("192.168.1.10/24", "192.168.1.1")
    );
    assert!(cloud_init.ipv6.is_auto(IpFamily::V6));
}

/// Declining cloud-init still attaches auto-configured networking
#[tokio::test]
async fn test_declined_cloud_init_is_auto() {
    let inventory = inventory();
    let mut prompter = ScriptedPrompter::new()
        .text("9001")
        .text("debian")
        .text("1")
        .text("1G")
        .text("kvm64")
        .text("e1000")
        .text("vmbr1")
        .select("local-lvm")
        .select(IMAGE)
        .confirm(false)
        .confirm(false);

    let spec = resolve(&inventory, &mut prompter, None).await.unwrap();
    assert_eq!(spec.identifier, 9001);
    assert_eq!(spec.memory_mb, 1024);
    assert_eq!(spec.cpu_type, "kvm64");
    assert_eq!(spec.resize, None);
    assert_eq!(spec.cloud_init.unwrap().ipconfig(), "ip6=auto,ip=dhcp");
}

/// Only active, non-directory storage is offered
#[tokio::test]
async fn test_directory_storage_not_offered() {
    let inventory = inventory();
    let mut prompter = ScriptedPrompter::new()
        .default_answer()
        .default_answer()
        .default_answer()
        .default_answer()
        .default_answer()
        .default_answer()
        .default_answer()
        .select("local");

    let err = resolve(&inventory, &mut prompter, None).await.unwrap_err();
    assert!(matches!(err, PtmError::Prompt(_)));
}

/// Re-asking stops after a bounded number of invalid answers
#[tokio::test]
async fn test_retries_are_bounded() {
    let inventory = inventory();
    let mut prompter = ScriptedPrompter::new().default_answer().default_answer();
    for _ in 0..MAX_ATTEMPTS {
        prompter = prompter.text("0");
    }

    let err = resolve(&inventory, &mut prompter, None).await.unwrap_err();
    assert!(matches!(err, PtmError::Prompt(_)));
    assert_eq!(prompter.messages().len(), MAX_ATTEMPTS);
    assert!(prompter
        .messages()
        .iter()
        .all(|m| m == "Core count must be greater than 0"));
}
