//! `ptm customize`: download a base image and bake packages into it

use crate::config::Configuration;
use crate::distributions;
use crate::downloader::Downloader;
use crate::pipeline::{customize as virt_customize, CommandRunner};
use crate::probe::{images, DiskImage};
use crate::prompt::{Choice, Prompter};
use crate::PtmError;
use tracing::info;

/// Download the configured base image, then customize an image the operator picks
///
/// Returns the full path of the customized image.
pub async fn customize(
    config: &Configuration,
    prompter: &mut dyn Prompter,
    runner: &dyn CommandRunner,
) -> Result<String, PtmError> {
    let image = distributions::resolve(&config.base_image)?;
    info!(
        "Base image is {} {} ({})",
        image.distribution, image.version, image.filename
    );

    Downloader::new(&config.downloader.save_to)?
        .fetch_image(&image)
        .await?;

    let available = images::list_images(&config.downloader.save_to).await?;
    let target = select_image(&available, prompter)?;

    customize_image(config, &target, runner).await?;
    Ok(target)
}

/// Run the `virt-customize` pipeline against one image
pub async fn customize_image(
    config: &Configuration,
    image: &str,
    runner: &dyn CommandRunner,
) -> Result<(), PtmError> {
    let pipeline = virt_customize::build(config, image).await?;
    info!("Customizing {} with {} commands", image, pipeline.len());
    pipeline.execute(runner).await?;
    info!("Image {} customized", image);
    Ok(())
}

fn select_image(available: &[DiskImage], prompter: &mut dyn Prompter) -> Result<String, PtmError> {
    let choices: Vec<Choice> = available
        .iter()
        .map(|image| {
            Choice::new(&image.full_path).with_note(format!(
                "Size: {} MB | Format: {}",
                image.virtual_size_mb(),
                image.format
            ))
        })
        .collect();

    if choices.is_empty() {
        return Err(PtmError::Resource("no images available to customize".to_string()));
    }

    prompter.select(
        "Please select the target image for the virtual machine template:",
        &choices,
    )
}
