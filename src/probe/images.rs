//! Downloaded cloud images and their `qemu-img info`

use super::capture;
use crate::downloader::is_partial_download;
use crate::PtmError;
use serde::Deserialize;
use std::path::Path;
use tokio::fs;
use tracing::{debug, warn};

/// Subset of `qemu-img info --output=json`
#[derive(Debug, Clone, Deserialize)]
pub struct QemuImageInfo {
    #[serde(rename = "virtual-size")]
    pub virtual_size: u64,
    pub format: String,
}

impl QemuImageInfo {
    pub fn from_json(content: &str) -> Result<Self, PtmError> {
        Ok(serde_json::from_str(content)?)
    }
}

/// An image file the template can be imported from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskImage {
    pub name: String,
    pub full_path: String,
    /// Size of the file on disk
    pub size_kb: u64,
    /// Size of the disk the image describes
    pub virtual_size_kb: u64,
    pub format: String,
}

impl DiskImage {
    pub fn new(name: impl Into<String>, full_path: impl Into<String>, file_size: u64, info: &QemuImageInfo) -> Self {
        Self {
            name: name.into(),
            full_path: full_path.into(),
            size_kb: file_size / 1024,
            virtual_size_kb: info.virtual_size / 1024,
            format: info.format.clone(),
        }
    }

    /// Size a resize request is compared against
    pub fn effective_size_kb(&self) -> u64 {
        self.size_kb.max(self.virtual_size_kb)
    }

    pub fn virtual_size_mb(&self) -> u64 {
        self.virtual_size_kb / 1024
    }
}

/// Inspect every regular file in `dir`
///
/// Unfinished downloads and files `qemu-img` cannot read are skipped.
pub async fn list_images(dir: impl AsRef<Path>) -> Result<Vec<DiskImage>, PtmError> {
    let dir = dir.as_ref();

    if !dir.exists() {
        debug!("Image directory {} does not exist", dir.display());
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    let mut read_dir = fs::read_dir(dir).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        let path = entry.path();
        if is_partial_download(&path) {
            debug!("Skipping unfinished download {}", path.display());
            continue;
        }
        if entry.file_type().await?.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut images = Vec::new();
    for path in paths {
        let full_path = path.display().to_string();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| full_path.clone());
        let file_size = fs::metadata(&path).await?.len();

        let info = match capture("qemu-img", &["info", "--output=json", &full_path]).await {
            Ok(output) => QemuImageInfo::from_json(&output)?,
            Err(e) => {
                warn!("Skipping {}: {}", full_path, e);
                continue;
            }
        };

        images.push(DiskImage::new(name, full_path, file_size, &info));
    }

    debug!("Found {} images in {}", images.len(), dir.display());
    Ok(images)
}
