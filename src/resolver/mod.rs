//! Configuration resolver
//!
//! Turns a candidate [`MachineSpec`] (from flags or the configuration file)
//! into a complete specification that fits the host, asking the operator for
//! whatever is missing. Flags are never repaired interactively: the first
//! problem with them is returned. A configuration file may leave the image
//! out, in which case it is selected interactively; any other gap in the file
//! falls back to the full dialogue. Without a candidate the whole
//! specification is built from the dialogue.
//!
//! Every re-asked question is bounded by [`MAX_ATTEMPTS`].

mod cloud_init;
mod machine;
pub mod sources;

pub use sources::{from_config_file, from_flags, MakeFlags};

use crate::error::ValidationError;
use crate::machine::{ConfigurationSource, MachineSpec};
use crate::probe::Inventory;
use crate::prompt::Prompter;
use crate::PtmError;
use tracing::{debug, info, warn};

/// How many invalid answers a single question tolerates
pub const MAX_ATTEMPTS: usize = 5;

/// Completes machine specifications against an [`Inventory`]
pub struct Resolver<'a> {
    inventory: &'a Inventory,
    prompter: &'a mut dyn Prompter,
}

impl<'a> Resolver<'a> {
    pub fn new(inventory: &'a Inventory, prompter: &'a mut dyn Prompter) -> Self {
        Self {
            inventory,
            prompter,
        }
    }

    /// Produce exactly one complete, valid specification
    pub async fn resolve(&mut self, candidate: Option<MachineSpec>) -> Result<MachineSpec, PtmError> {
        let (mut spec, cloud_init) = match candidate {
            Some(mut spec) => {
                let cloud_init = spec.cloud_init.take();
                (self.resolve_machine(spec)?, cloud_init)
            }
            None => {
                debug!("No candidate specification, starting the dialogue");
                (self.prompt_machine()?, None)
            }
        };

        spec.cloud_init = Some(self.resolve_cloud_init(cloud_init).await?);
        spec.validate()?;

        info!(
            "Resolved template {} ({}) from {}",
            spec.identifier, spec.name, spec.source
        );
        Ok(spec)
    }

    fn resolve_machine(&mut self, spec: MachineSpec) -> Result<MachineSpec, PtmError> {
        match (spec.source, spec.validate_hardware()) {
            (ConfigurationSource::Prompt, _) => self.prompt_machine(),
            (_, Ok(())) => self.complete(spec),
            (ConfigurationSource::ConfigFile, Err(ValidationError::MissingImage)) => {
                self.complete(spec)
            }
            (ConfigurationSource::ConfigFile, Err(e)) => {
                warn!("Configuration file settings are incomplete: {}", e);
                self.prompt_machine()
            }
            (ConfigurationSource::Flags, Err(e)) => Err(e.into()),
        }
    }

    /// Run `attempt` until it succeeds, showing each repairable error
    fn ask_until<T>(
        &mut self,
        question: &str,
        mut attempt: impl FnMut(&mut Self) -> Result<T, PtmError>,
    ) -> Result<T, PtmError> {
        for _ in 0..MAX_ATTEMPTS {
            match attempt(self) {
                Ok(value) => return Ok(value),
                Err(e) if e.is_repairable() => self.prompter.message(&e.to_string()),
                Err(e) => return Err(e),
            }
        }
        Err(gave_up(question))
    }
}

fn gave_up(question: &str) -> PtmError {
    PtmError::Prompt(format!(
        "no acceptable answer after {} attempts: {}",
        MAX_ATTEMPTS, question
    ))
}
