//! `ptm make`: create a template from a cloud image

use crate::config::Configuration;
use crate::machine::MachineSpec;
use crate::pipeline::{qemu, CommandRunner};
use crate::probe::Inventory;
use crate::prompt::Prompter;
use crate::resolver::{from_config_file, from_flags, MakeFlags, Resolver};
use crate::PtmError;
use tracing::{debug, info, warn};

/// Resolve a specification for the host and create the template
pub async fn make(
    config: &Configuration,
    flags: &MakeFlags,
    prompter: &mut dyn Prompter,
    runner: &dyn CommandRunner,
) -> Result<MachineSpec, PtmError> {
    let inventory = Inventory::collect(&config.downloader.save_to).await?;
    debug!(
        "Found {} storage targets, {} images and {} keys",
        inventory.storage.len(),
        inventory.images.len(),
        inventory.keys.len()
    );

    let candidate = candidate(config, flags).await?;
    create_template(&inventory, candidate, prompter, runner).await
}

/// Pick the candidate specification: flags beat the configuration file
///
/// Flags only win when they describe a complete machine on their own;
/// otherwise a configured `qemu` section is used instead. Incomplete flags
/// without such a section are returned as they are so the resolver reports
/// what is missing. `None` means nothing usable was given and the dialogue
/// builds everything.
pub async fn candidate(
    config: &Configuration,
    flags: &MakeFlags,
) -> Result<Option<MachineSpec>, PtmError> {
    let from_file = file_candidate(config).await;

    if !flags.has_machine_flags() {
        return Ok(from_file);
    }

    match (from_flags(flags).await, from_file) {
        (Ok(spec), from_file) => match (spec.validate_hardware(), from_file) {
            (Ok(()), _) | (Err(_), None) => Ok(Some(spec)),
            (Err(e), Some(file)) => {
                warn!("Flags are incomplete ({}), using the configuration file", e);
                Ok(Some(file))
            }
        },
        (Err(e), Some(file)) => {
            warn!("Ignoring flags ({}), using the configuration file", e);
            Ok(Some(file))
        }
        (Err(e), None) => Err(e),
    }
}

/// Candidate from the `qemu` section, if it is filled in and readable
async fn file_candidate(config: &Configuration) -> Option<MachineSpec> {
    if !config.qemu.is_configured() {
        return None;
    }

    match from_config_file(config).await {
        Ok(spec) => Some(spec),
        Err(e) => {
            warn!("Ignoring qemu section of the configuration file: {}", e);
            None
        }
    }
}

/// Resolve `candidate` against `inventory` and run the `qm` pipeline
pub async fn create_template(
    inventory: &Inventory,
    candidate: Option<MachineSpec>,
    prompter: &mut dyn Prompter,
    runner: &dyn CommandRunner,
) -> Result<MachineSpec, PtmError> {
    let spec = Resolver::new(inventory, prompter).resolve(candidate).await?;

    let pipeline = qemu::build(&spec).await?;
    info!(
        "Creating template {} with {} commands",
        spec.identifier,
        pipeline.len()
    );
    pipeline.execute(runner).await?;

    info!("Template {} ({}) created", spec.identifier, spec.name);
    Ok(spec)
}
