//! Debian cloud images

use super::{Catalogue, Variant};

const BASE_URL: &str = "https://cloud.debian.org/images/cloud";

pub(super) static CATALOGUE: Catalogue = Catalogue {
    releases: &[
        ("bookworm", "12"),
        ("bullseye", "11"),
        ("buster", "10"),
        ("stretch", "9"),
    ],
    complete: Variant {
        base_url: BASE_URL,
        architectures: &["amd64", "arm64"],
        formats: &["qcow2", "raw"],
    },
    minimal: Variant {
        base_url: BASE_URL,
        architectures: &["amd64"],
        formats: &["qcow2", "raw"],
    },
};

/// Debian calls its minimal flavour `genericcloud`
pub(super) fn image_name(version: &str, architecture: &str, format: &str, minimal: bool) -> String {
    if minimal {
        format!("debian-{}-genericcloud-{}.{}", version, architecture, format)
    } else {
        format!("debian-{}-generic-{}.{}", version, architecture, format)
    }
}

pub(super) fn image_url(base_url: &str, release: &str, image_name: &str) -> String {
    format!("{}/{}/latest/{}", base_url, release, image_name)
}
