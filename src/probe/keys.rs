//! Public keys offered for cloud-init

use crate::PtmError;
use std::path::Path;
use tokio::fs;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellKey {
    /// File name, e.g. `id_ed25519.pub`
    pub name: String,
    pub full_path: String,
    pub content: String,
}

/// Read every `*.pub` file in `dir`; a missing directory yields no keys
pub async fn list_keys(dir: impl AsRef<Path>) -> Result<Vec<ShellKey>, PtmError> {
    let dir = dir.as_ref();

    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut keys = Vec::new();
    let mut read_dir = fs::read_dir(dir).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        let path = entry.path();
        if !entry.file_type().await?.is_file() || path.extension().is_none_or(|e| e != "pub") {
            continue;
        }

        let content = fs::read_to_string(&path).await?;
        keys.push(ShellKey {
            name: entry.file_name().to_string_lossy().into_owned(),
            full_path: path.display().to_string(),
            content: content.trim().to_string(),
        });
    }

    keys.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_list_keys() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("id_rsa.pub"), "ssh-rsa AAAA root@pve\n")
            .await
            .unwrap();
        fs::write(temp.path().join("id_ed25519.pub"), "ssh-ed25519 AAAA root@pve")
            .await
            .unwrap();
        fs::write(temp.path().join("id_rsa"), "private").await.unwrap();
        fs::write(temp.path().join("authorized_keys"), "").await.unwrap();

        let keys = list_keys(temp.path()).await.unwrap();
        let names: Vec<_> = keys.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, vec!["id_ed25519.pub", "id_rsa.pub"]);
        assert_eq!(keys[1].content, "ssh-rsa AAAA root@pve");
    }

    #[tokio::test]
    async fn test_list_keys_missing_dir() {
        let keys = list_keys("/nonexistent/ssh").await.unwrap();
        assert!(keys.is_empty());
    }
}
