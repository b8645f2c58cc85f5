//! Cloud image catalogue
//!
//! Each supported distribution is a variant of [`Distribution`] backed by an
//! immutable [`Catalogue`]: release/version aliases plus the architectures and
//! formats published for the complete and minimal image flavours. Resolving a
//! [`BaseImageConfig`] yields the download URL and file name of the image.

mod debian;
mod ubuntu;

use crate::config::BaseImageConfig;
use crate::error::DistributionError;
use std::fmt;

/// One image flavour (complete or minimal) of a distribution
#[derive(Debug)]
pub struct Variant {
    pub base_url: &'static str,
    pub architectures: &'static [&'static str],
    pub formats: &'static [&'static str],
}

/// Static description of a distribution's published cloud images
#[derive(Debug)]
pub struct Catalogue {
    /// `(release codename, version)` pairs, newest first
    pub releases: &'static [(&'static str, &'static str)],
    pub complete: Variant,
    pub minimal: Variant,
}

/// Supported distributions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distribution {
    Ubuntu,
    Debian,
}

impl Distribution {
    pub const ALL: [Distribution; 2] = [Distribution::Ubuntu, Distribution::Debian];

    /// Look up a distribution by name (case-insensitive)
    pub fn from_name(name: &str) -> Result<Self, DistributionError> {
        Self::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| DistributionError::UnsupportedDistribution(name.to_string()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ubuntu => "ubuntu",
            Self::Debian => "debian",
        }
    }

    pub fn catalogue(&self) -> &'static Catalogue {
        match self {
            Self::Ubuntu => &ubuntu::CATALOGUE,
            Self::Debian => &debian::CATALOGUE,
        }
    }

    /// Flavour selected by the `minimal` flag
    pub fn variant(&self, minimal: bool) -> &'static Variant {
        let catalogue = self.catalogue();
        if minimal {
            &catalogue.minimal
        } else {
            &catalogue.complete
        }
    }

    pub fn supported_releases(&self) -> Vec<&'static str> {
        self.catalogue().releases.iter().map(|(r, _)| *r).collect()
    }

    pub fn supported_versions(&self) -> Vec<&'static str> {
        self.catalogue().releases.iter().map(|(_, v)| *v).collect()
    }

    pub fn version_from_release(&self, release: &str) -> Option<&'static str> {
        self.catalogue()
            .releases
            .iter()
            .find(|(r, _)| *r == release)
            .map(|(_, v)| *v)
    }

    pub fn release_from_version(&self, version: &str) -> Option<&'static str> {
        self.catalogue()
            .releases
            .iter()
            .find(|(_, v)| *v == version)
            .map(|(r, _)| *r)
    }

    /// Accepts either alias and returns the release codename
    pub fn release_from_release_or_version(
        &self,
        value: &str,
    ) -> Result<&'static str, DistributionError> {
        self.version_from_release(value)
            .and_then(|v| self.release_from_version(v))
            .or_else(|| self.release_from_version(value))
            .ok_or_else(|| DistributionError::UnsupportedRelease(value.to_string()))
    }

    /// Accepts either alias and returns the version number
    pub fn version_from_release_or_version(
        &self,
        value: &str,
    ) -> Result<&'static str, DistributionError> {
        self.version_from_release(value)
            .or_else(|| self.release_from_version(value).and_then(|r| self.version_from_release(r)))
            .ok_or_else(|| DistributionError::UnsupportedRelease(value.to_string()))
    }

    pub fn image_name(&self, version: &str, architecture: &str, format: &str, minimal: bool) -> String {
        match self {
            Self::Ubuntu => ubuntu::image_name(version, architecture, format, minimal),
            Self::Debian => debian::image_name(version, architecture, format, minimal),
        }
    }

    pub fn image_url(&self, release: &str, image_name: &str, minimal: bool) -> String {
        let base_url = self.variant(minimal).base_url;
        match self {
            Self::Ubuntu => ubuntu::image_url(base_url, release, image_name),
            Self::Debian => debian::image_url(base_url, release, image_name),
        }
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Fully resolved base image download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub distribution: Distribution,
    pub release: &'static str,
    pub version: &'static str,
    pub filename: String,
    pub url: String,
}

/// Resolve a base image selection to its download URL and file name
///
/// Checks run in a fixed order (distribution, release, architecture,
/// format) and the first failure is returned.
pub fn resolve(selector: &BaseImageConfig) -> Result<ResolvedImage, DistributionError> {
    let distribution = Distribution::from_name(&selector.distribution)?;
    let release = distribution.release_from_release_or_version(&selector.release)?;
    let version = distribution.version_from_release_or_version(&selector.release)?;

    let variant = distribution.variant(selector.minimal);
    if !variant.architectures.contains(&selector.architecture.as_str()) {
        return Err(DistributionError::UnsupportedArchitecture(
            selector.architecture.clone(),
        ));
    }
    if !variant.formats.contains(&selector.format.as_str()) {
        return Err(DistributionError::UnsupportedImageFormat(selector.format.clone()));
    }

    let filename = distribution.image_name(
        version,
        &selector.architecture,
        &selector.format,
        selector.minimal,
    );
    let url = distribution.image_url(release, &filename, selector.minimal);

    Ok(ResolvedImage {
        distribution,
        release,
        version,
        filename,
        url,
    })
}
