//! Tests for base image resolution

use ptm_rs::config::{BaseImageConfig, Configuration};
use ptm_rs::distributions::{self, Distribution};
use ptm_rs::DistributionError;

fn selector(distribution: &str, release: &str, minimal: bool, arch: &str, format: &str) -> BaseImageConfig {
    BaseImageConfig {
        distribution: distribution.to_string(),
        release: release.to_string(),
        minimal,
        architecture: arch.to_string(),
        format: format.to_string(),
    }
}

// ==================== Resolution Tests ====================

#[test]
fn test_debian_minimal_by_version() {
    let image = distributions::resolve(&selector("debian", "12", true, "amd64", "qcow2")).unwrap();

    assert_eq!(image.distribution, Distribution::Debian);
    assert_eq!(image.release, "bookworm");
    assert_eq!(image.version, "12");
    assert_eq!(image.filename, "debian-12-genericcloud-amd64.qcow2");
    assert_eq!(
        image.url,
        "https://cloud.debian.org/images/cloud/bookworm/latest/debian-12-genericcloud-amd64.qcow2"
    );
}

#[test]
fn test_ubuntu_complete_by_release() {
    let image = distributions::resolve(&selector("ubuntu", "jammy", false, "amd64", "img")).unwrap();

    assert_eq!(image.version, "22.04");
    assert_eq!(image.filename, "ubuntu-22.04-cloudimg-amd64.img");
    assert_eq!(
        image.url,
        "https://cloud-images.ubuntu.com/releases/jammy/release/ubuntu-22.04-cloudimg-amd64.img"
    );
}

/// Either alias of a release resolves to the same image
#[test]
fn test_release_aliases_agree() {
    for distribution in Distribution::ALL {
        for (release, version) in distribution
            .supported_releases()
            .into_iter()
            .zip(distribution.supported_versions())
        {
            assert_eq!(distribution.version_from_release(release), Some(version));
            assert_eq!(distribution.release_from_version(version), Some(release));
            assert_eq!(
                distribution.release_from_release_or_version(version).unwrap(),
                release
            );
            assert_eq!(
                distribution.version_from_release_or_version(release).unwrap(),
                version
            );
        }
    }
}

#[test]
fn test_minimal_flavour_is_narrower() {
    // arm64 is published, but not as a minimal image
    assert!(distributions::resolve(&selector("debian", "bookworm", false, "arm64", "raw")).is_ok());
    assert_eq!(
        distributions::resolve(&selector("debian", "bookworm", true, "arm64", "raw")),
        Err(DistributionError::UnsupportedArchitecture("arm64".to_string()))
    );
}

#[test]
fn test_unknown_values_are_reported() {
    let err = distributions::resolve(&selector("ubuntu", "noble", true, "amd64", "img")).unwrap_err();
    assert_eq!(err, DistributionError::UnsupportedRelease("noble".to_string()));

    let err = distributions::resolve(&selector("fedora", "39", true, "amd64", "img")).unwrap_err();
    assert_eq!(err, DistributionError::UnsupportedDistribution("fedora".to_string()));
}

// ==================== Configuration Tests ====================

#[test]
fn test_base_image_from_configuration() {
    let config = Configuration::from_yaml(
        r#"
base_image:
  distribution: debian
  release: bullseye
  minimal: false
  format: raw
"#,
    )
    .unwrap();

    // architecture keeps its default
    let image = distributions::resolve(&config.base_image).unwrap();
    assert_eq!(image.filename, "debian-11-generic-amd64.raw");
    assert_eq!(
        image.url,
        "https://cloud.debian.org/images/cloud/bullseye/latest/debian-11-generic-amd64.raw"
    );
}
