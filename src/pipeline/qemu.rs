//! `qm` command sequence for a template

use super::{Pipeline, Tool};
use crate::machine::{CloudInitSpec, MachineSpec};
use crate::PtmError;
use tracing::debug;

/// Disk the image is imported to
const MAIN_DISK: &str = "scsi0";

/// Translate a resolved specification into `qm` commands
///
/// The SSH key file is written while building, so the returned pipeline must
/// be executed (or abandoned) for it to be removed again.
pub async fn build(spec: &MachineSpec) -> Result<Pipeline, PtmError> {
    spec.validate()?;

    let mut pipeline = Pipeline::new();
    let id = spec.identifier.to_string();

    pipeline.push(Tool::Qm, qm("create", &id, &["--name", &spec.name]));
    pipeline.push(
        Tool::Qm,
        qm(
            "set",
            &id,
            &[
                "--cores",
                &spec.cores.to_string(),
                "--memory",
                &spec.memory_mb.to_string(),
                "--cpu",
                &spec.cpu_type,
            ],
        ),
    );
    pipeline.push(
        Tool::Qm,
        qm("set", &id, &["--serial0", "socket", "--vga", "serial0"]),
    );
    pipeline.push(
        Tool::Qm,
        qm(
            "set",
            &id,
            &[
                "--net0",
                &format!("{},bridge={}", spec.network_driver, spec.network_bridge),
            ],
        ),
    );
    pipeline.push(
        Tool::Qm,
        qm(
            "set",
            &id,
            &[
                "--scsi0",
                &format!("{}:0,import-from={},discard=on", spec.storage, spec.image),
            ],
        ),
    );
    pipeline.push(
        Tool::Qm,
        qm(
            "set",
            &id,
            &["--boot", "order=scsi0", "--scsihw", "virtio-scsi-single"],
        ),
    );
    pipeline.push(
        Tool::Qm,
        qm("set", &id, &["--agent", "enabled=1,fstrim_cloned_disks=1"]),
    );

    if let Some(cloud_init) = &spec.cloud_init {
        if let Err(e) = push_cloud_init(&mut pipeline, &id, &spec.storage, cloud_init).await {
            pipeline.abandon().await;
            return Err(e);
        }
    }

    if spec.requires_resize()
        && let Some(size) = &spec.resize
    {
        pipeline.push(Tool::Qm, qm("disk", "resize", &[&id, MAIN_DISK, size]));
    }

    pipeline.push(Tool::Qm, qm("template", &id, &[]));

    debug!("Built {} qm commands for {}", pipeline.len(), spec.name);
    Ok(pipeline)
}

async fn push_cloud_init(
    pipeline: &mut Pipeline,
    id: &str,
    storage: &str,
    cloud_init: &CloudInitSpec,
) -> Result<(), PtmError> {
    pipeline.push(
        Tool::Qm,
        qm("set", id, &["--ide2", &format!("{}:cloudinit", storage)]),
    );

    if let Some(username) = cloud_init.username.as_deref().filter(|u| !u.is_empty()) {
        pipeline.push(Tool::Qm, qm("set", id, &["--ciuser", username]));
    }

    if let Some(password) = cloud_init.password.as_deref().filter(|p| !p.is_empty()) {
        pipeline.push(Tool::Qm, qm("set", id, &["--cipassword", password]));
    }

    if cloud_init.has_keys() {
        pipeline
            .stage_file(&cloud_init.keys_path, &cloud_init.keys.join("\n"))
            .await?;
        let keys_path = cloud_init.keys_path.display().to_string();
        pipeline.push(Tool::Qm, qm("set", id, &["--sshkey", &keys_path]));
    }

    pipeline.push(
        Tool::Qm,
        qm("set", id, &["--ipconfig0", &cloud_init.ipconfig()]),
    );

    Ok(())
}

/// `<verb> <target> args...`
fn qm(verb: &str, target: &str, args: &[&str]) -> Vec<String> {
    [verb, target]
        .iter()
        .chain(args)
        .map(|arg| arg.to_string())
        .collect()
}
