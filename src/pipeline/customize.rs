//! `virt-customize` command sequence for a downloaded image

use super::{Pipeline, Tool};
use crate::config::{Configuration, RepositoryConfig};
use crate::template;
use crate::PtmError;
use std::path::Path;
use tracing::debug;

/// Host directory rendered apt configuration files are staged in
pub const STAGING_DIR: &str = "/tmp";

/// Build the customization pipeline for `image`
///
/// Package lists are refreshed, packages installed, third-party repositories
/// added and, when enabled, unattended upgrades configured. Rendered apt
/// configuration files are staged in [`STAGING_DIR`] while building.
pub async fn build(config: &Configuration, image: &str) -> Result<Pipeline, PtmError> {
    build_staged(config, image, Path::new(STAGING_DIR)).await
}

/// Same as [`build`], staging files in `staging_dir`
pub async fn build_staged(
    config: &Configuration,
    image: &str,
    staging_dir: &Path,
) -> Result<Pipeline, PtmError> {
    let mut pipeline = Pipeline::new();

    pipeline.push(Tool::VirtCustomize, customize(image, "--update", &[]));

    let packages = config.packages();
    if !packages.is_empty() {
        pipeline.push(
            Tool::VirtCustomize,
            customize(image, "--install", &[&packages.join(",")]),
        );
    }

    for repository in &config.repositories {
        push_repository(&mut pipeline, image, repository);
    }

    if config.unattended_upgrades.enabled {
        if let Err(e) = push_unattended_upgrades(&mut pipeline, config, image, staging_dir).await {
            pipeline.abandon().await;
            return Err(e);
        }
    }

    pipeline.push(Tool::VirtCustomize, customize(image, "--update", &[]));

    debug!("Built {} virt-customize commands for {}", pipeline.len(), image);
    Ok(pipeline)
}

fn push_repository(pipeline: &mut Pipeline, image: &str, repository: &RepositoryConfig) {
    let keyring = repository.keyring_path();

    let add_key = format!("curl -fsSL {} | gpg --dearmor -o {}", repository.gpg, keyring);
    pipeline.push(
        Tool::VirtCustomize,
        customize(image, "--run-command", &[&add_key]),
    );

    let source = format!(
        "deb [signed-by={}] {} {} {}",
        keyring, repository.url, repository.release, repository.component
    );
    let add_source = format!(
        "echo \"{}\" > /etc/apt/sources.list.d/{}.list",
        source, repository.name
    );
    pipeline.push(
        Tool::VirtCustomize,
        customize(image, "--run-command", &[&add_source]),
    );
}

async fn push_unattended_upgrades(
    pipeline: &mut Pipeline,
    config: &Configuration,
    image: &str,
    staging_dir: &Path,
) -> Result<(), PtmError> {
    let rendered = template::render_unattended_upgrades(&config.unattended_upgrades)?;
    upload(
        pipeline,
        image,
        &staging_dir.join(template::UNATTENDED_UPGRADES_STAGED_NAME),
        template::UNATTENDED_UPGRADES_PATH,
        &rendered,
    )
    .await?;

    upload(
        pipeline,
        image,
        &staging_dir.join(template::AUTO_UPGRADES_STAGED_NAME),
        template::AUTO_UPGRADES_PATH,
        template::auto_upgrades(),
    )
    .await
}

async fn upload(
    pipeline: &mut Pipeline,
    image: &str,
    source: &Path,
    target: &str,
    content: &str,
) -> Result<(), PtmError> {
    pipeline.stage_file(source, content).await?;
    pipeline.push(
        Tool::VirtCustomize,
        customize(image, "--upload", &[&format!("{}:{}", source.display(), target)]),
    );
    Ok(())
}

/// `-a <image> <verb> args...`
fn customize(image: &str, verb: &str, args: &[&str]) -> Vec<String> {
    ["-a", image, verb]
        .iter()
        .chain(args)
        .map(|arg| arg.to_string())
        .collect()
}
