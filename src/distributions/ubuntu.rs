//! Ubuntu cloud images

use super::{Catalogue, Variant};

pub(super) static CATALOGUE: Catalogue = Catalogue {
    releases: &[
        ("mantic", "23.10"),
        ("lunar", "23.04"),
        ("kinetic", "22.10"),
        ("jammy", "22.04"),
        ("impish", "21.10"),
        ("hirsute", "21.04"),
        ("groovy", "20.10"),
        ("focal", "20.04"),
        ("bionic", "18.04"),
        ("xenial", "16.04"),
        ("trusty", "14.04"),
    ],
    complete: Variant {
        base_url: "https://cloud-images.ubuntu.com/releases",
        architectures: &["amd64", "arm64", "armhf"],
        formats: &["img", "vmdk"],
    },
    minimal: Variant {
        base_url: "https://cloud-images.ubuntu.com/minimal/releases",
        architectures: &["amd64"],
        formats: &["img"],
    },
};

pub(super) fn image_name(version: &str, architecture: &str, format: &str, minimal: bool) -> String {
    if minimal {
        format!("ubuntu-{}-minimal-cloudimg-{}.{}", version, architecture, format)
    } else {
        format!("ubuntu-{}-cloudimg-{}.{}", version, architecture, format)
    }
}

/// `{base}/{release}/release/{image}`
pub(super) fn image_url(base_url: &str, release: &str, image_name: &str) -> String {
    format!("{}/{}/release/{}", base_url, release, image_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_names() {
        assert_eq!(
            image_name("22.04", "amd64", "img", true),
            "ubuntu-22.04-minimal-cloudimg-amd64.img"
        );
        assert_eq!(
            image_name("20.04", "arm64", "vmdk", false),
            "ubuntu-20.04-cloudimg-arm64.vmdk"
        );
    }

    #[test]
    fn test_image_url() {
        assert_eq!(
            image_url(CATALOGUE.complete.base_url, "focal", "x.img"),
            "https://cloud-images.ubuntu.com/releases/focal/release/x.img"
        );
    }
}
