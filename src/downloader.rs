//! Base image downloader
//!
//! Streams a resolved cloud image into the download directory. An image that
//! is already present is never fetched again.

use crate::distributions::ResolvedImage;
use crate::PtmError;
use reqwest::{Client, Response};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Outcome of [`Downloader::fetch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Download {
    /// The file already existed and was left untouched
    Cached(PathBuf),
    /// The file was fetched; carries the number of bytes written
    Fetched(PathBuf, u64),
}

impl Download {
    pub fn path(&self) -> &Path {
        match self {
            Self::Cached(path) | Self::Fetched(path, _) => path,
        }
    }
}

pub struct Downloader {
    client: Client,
    save_to: PathBuf,
}

impl Downloader {
    pub fn new(save_to: impl AsRef<Path>) -> Result<Self, PtmError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            save_to: save_to.as_ref().to_path_buf(),
        })
    }

    /// Path the image with this file name is saved to
    pub fn destination(&self, filename: &str) -> PathBuf {
        self.save_to.join(filename)
    }

    /// Download a resolved distribution image
    pub async fn fetch_image(&self, image: &ResolvedImage) -> Result<Download, PtmError> {
        self.fetch(&image.url, &image.filename).await
    }

    /// Download `url` to `<save_to>/<filename>` unless it already exists
    pub async fn fetch(&self, url: &str, filename: &str) -> Result<Download, PtmError> {
        let destination = self.destination(filename);

        if fs::try_exists(&destination).await? {
            info!("Image already downloaded at {}", destination.display());
            return Ok(Download::Cached(destination));
        }

        fs::create_dir_all(&self.save_to).await?;

        info!("Downloading {}", url);
        let mut response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(PtmError::Http(format!(
                "Failed to download {}: {}",
                url,
                response.status()
            )));
        }

        // the partial file never outlives a failed download
        let partial = partial_path(&destination);
        let written = match stream_to(&mut response, &partial, &destination).await {
            Ok(written) => written,
            Err(e) => {
                if let Err(remove_error) = fs::remove_file(&partial).await {
                    debug!("Could not remove {}: {}", partial.display(), remove_error);
                }
                return Err(e);
            }
        };
        debug!("Wrote {} bytes to {}", written, destination.display());

        Ok(Download::Fetched(destination, written))
    }
}

/// Extension appended to a file while it is being downloaded
pub const PARTIAL_EXTENSION: &str = "part";

/// Whether `path` is a download that has not completed
pub fn is_partial_download(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == PARTIAL_EXTENSION)
}

fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_owned();
    name.push(".");
    name.push(PARTIAL_EXTENSION);
    PathBuf::from(name)
}

async fn stream_to(
    response: &mut Response,
    partial: &Path,
    destination: &Path,
) -> Result<u64, PtmError> {
    let mut file = fs::File::create(partial).await?;
    let mut written: u64 = 0;

    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    drop(file);

    fs::rename(partial, destination).await?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_existing_file_is_not_fetched() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("image.img"), b"cached").await.unwrap();

        let downloader = Downloader::new(temp.path()).unwrap();
        // nothing listens on this port; a request would fail
        let result = downloader
            .fetch("http://127.0.0.1:9/image.img", "image.img")
            .await
            .unwrap();

        assert_eq!(result, Download::Cached(temp.path().join("image.img")));
    }

    #[test]
    fn test_partial_path() {
        let partial = partial_path(Path::new("/etc/ptm/images/debian-12-generic-amd64.qcow2"));
        assert_eq!(
            partial,
            PathBuf::from("/etc/ptm/images/debian-12-generic-amd64.qcow2.part")
        );
        assert!(is_partial_download(&partial));
        assert!(!is_partial_download(Path::new("/etc/ptm/images/ubuntu.img")));
    }

    #[test]
    fn test_destination() {
        let downloader = Downloader::new("/etc/ptm/images").unwrap();
        assert_eq!(
            downloader.destination("debian-12-genericcloud-amd64.qcow2"),
            PathBuf::from("/etc/ptm/images/debian-12-genericcloud-amd64.qcow2")
        );
    }
}
