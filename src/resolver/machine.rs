//! Machine settings: completing a candidate and the interactive dialogue

use super::Resolver;
use crate::machine::{ConfigurationSource, MachineSpec};
use crate::prompt::Choice;
use crate::units;
use crate::validation::{check_cores, check_memory};
use crate::PtmError;
use tracing::debug;

impl Resolver<'_> {
    /// Check a flags or configuration file candidate against the host
    pub(super) fn complete(&mut self, mut spec: MachineSpec) -> Result<MachineSpec, PtmError> {
        let host = self.inventory.host;
        check_cores(spec.cores, host.cores)?;
        check_memory(spec.memory_mb, host.memory_mb)?;

        let storage = spec.storage.clone();
        self.apply_storage(&mut spec, &storage)?;

        if spec.image.is_empty() && spec.source == ConfigurationSource::ConfigFile {
            spec.image = self.ask_image()?;
        }
        let image = spec.image.clone();
        self.apply_image(&mut spec, &image)?;

        if let Some(size) = spec.resize.clone() {
            self.apply_resize(&mut spec, &size)?;
        }

        Ok(spec)
    }

    /// Build the machine settings entirely from the dialogue
    pub(super) fn prompt_machine(&mut self) -> Result<MachineSpec, PtmError> {
        let mut spec = MachineSpec::new(ConfigurationSource::Prompt);
        let host = self.inventory.host;

        let question = "Please enter the identifier for the virtual machine template";
        spec.identifier = self.ask_until(question, |r| {
            let answer = r.prompter.input(question, "9000")?;
            parse_number::<u32>(&answer).and_then(|id| {
                if id == 0 {
                    Err(PtmError::InvalidData("identifier must be greater than 0".to_string()))
                } else {
                    Ok(id)
                }
            })
        })?;

        spec.name = self.prompter.input(
            "Please enter the name for the virtual machine template",
            "ptm-template",
        )?;

        let question = format!(
            "Please enter the core count for the virtual machine template [1-{}]",
            host.cores
        );
        spec.cores = self.ask_until(&question, |r| {
            let cores = parse_number::<u32>(&r.prompter.input(&question, "1")?)?;
            check_cores(cores, host.cores)?;
            Ok(cores)
        })?;

        let question = format!(
            "Please enter the memory for the virtual machine template [1-{} MB]",
            host.memory_mb
        );
        spec.memory_mb = self.ask_until(&question, |r| {
            let memory = units::parse_memory_mb(&r.prompter.input(&question, "512M")?)?;
            check_memory(memory, host.memory_mb)?;
            Ok(memory)
        })?;

        spec.cpu_type = self.prompter.input(
            "Please enter the CPU type for the virtual machine template",
            "host",
        )?;
        spec.network_driver = self.prompter.input(
            "Please enter the network driver for the virtual machine template",
            "virtio",
        )?;
        spec.network_bridge = self.prompter.input(
            "Please enter the network bridge for the virtual machine template",
            "vmbr0",
        )?;

        let storage = self.ask_storage()?;
        self.apply_storage(&mut spec, &storage)?;

        let image = self.ask_image()?;
        self.apply_image(&mut spec, &image)?;

        if self.prompter.confirm("Would you like to resize the image?")? {
            let question = "Please enter the new size for the image";
            self.ask_until(question, |r| {
                let size = r.prompter.input(question, "4G")?;
                r.apply_resize(&mut spec, &size)
            })?;
        }

        Ok(spec)
    }

    fn ask_storage(&mut self) -> Result<String, PtmError> {
        let choices: Vec<Choice> = self
            .inventory
            .storage
            .iter()
            .filter(|target| target.is_valid_target())
            .map(|target| {
                Choice::new(&target.name).with_note(format!(
                    "Available: {} MB | Used: {}",
                    target.available_mb(),
                    target.percent_used
                ))
            })
            .collect();

        if choices.is_empty() {
            return Err(PtmError::Resource(
                "no active storage target can hold virtual machine disks".to_string(),
            ));
        }

        self.prompter.select(
            "Please select the storage for the virtual machine template",
            &choices,
        )
    }

    fn ask_image(&mut self) -> Result<String, PtmError> {
        let choices: Vec<Choice> = self
            .inventory
            .images
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
            return Err(PtmError::Resource(
                "no images available, run `ptm customize` to download one".to_string(),
            ));
        }

        self.prompter.select(
            "Please select the target image for the virtual machine template",
            &choices,
        )
    }

    fn apply_storage(&self, spec: &mut MachineSpec, name: &str) -> Result<(), PtmError> {
        let target = self
            .inventory
            .find_storage(name)
            .ok_or_else(|| PtmError::Resource(format!("storage `{}` could not be found", name)))?;

        spec.storage = target.name.clone();
        spec.storage_available_kb = target.available_kb;
        Ok(())
    }

    fn apply_image(&self, spec: &mut MachineSpec, full_path: &str) -> Result<(), PtmError> {
        let image = self
            .inventory
            .find_image(full_path)
            .ok_or_else(|| PtmError::Resource(format!("image `{}` could not be found", full_path)))?;

        spec.image = image.full_path.clone();
        spec.image_size_kb = image.effective_size_kb();
        Ok(())
    }

    /// Accept a new disk size if the selected storage can hold it
    fn apply_resize(&mut self, spec: &mut MachineSpec, size: &str) -> Result<(), PtmError> {
        let kilobytes = units::to_kilobytes(size)?;

        if spec.image_size_kb > kilobytes {
            self.prompter
                .message("The image is already larger than the specified size.");
        }

        let target = self.inventory.find_storage(&spec.storage).ok_or_else(|| {
            PtmError::Resource(format!("storage `{}` could not be found", spec.storage))
        })?;

        if !target.has_enough_space(kilobytes) {
            return Err(PtmError::Resource(format!(
                "Not enough space on the storage. Requested: {} MB, Available: {} MB",
                kilobytes / 1024,
                target.available_kb / 1024
            )));
        }

        debug!("Disk of {} will be resized to {}", spec.name, size);
        spec.resize = Some(size.to_string());
        spec.resize_kb = kilobytes;
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(answer: &str) -> Result<T, PtmError> {
    answer
        .trim()
        .parse()
        .map_err(|_| PtmError::InvalidData(format!("`{}` is not a valid number", answer)))
}
