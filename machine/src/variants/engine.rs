use crate::{
    SpecificationIssue,
    definition::{Disk, MachineDraft},
    properties::Properties,
    variant::{MachineVariant, VariantDefaults},
};

pub const ENGINE_PASSWORD_KEY: &str = "ovirt-engine-password";

const DEFAULT_ENGINE_PASSWORD: &str = "123";
const STORAGE_DISK_SIZE: &str = "101G";

/// The management node. Always exports NFS storage; `iscsi` adds an iSCSI
/// target on a second disk.
#[derive(Debug, Clone, Copy)]
pub struct Engine;

impl MachineVariant for Engine {
    fn kind(&self) -> &'static str {
        "engine"
    }

    fn defaults(&self) -> VariantDefaults {
        VariantDefaults {
            memory_mb: 4096,
            ..VariantDefaults::default()
        }
    }

    fn apply(
        &self,
        machine: &mut MachineDraft<'_>,
        properties: &mut Properties,
    ) -> Result<(), SpecificationIssue> {
        let iscsi = properties.take_flag("iscsi")?;
        let engine_password = properties
            .take_text("engine_password")?
            .unwrap_or_else(|| DEFAULT_ENGINE_PASSWORD.to_owned());

        machine.add_disk(Disk::empty("nfs", "sda", STORAGE_DISK_SIZE));
        machine.add_deploy_script("setup_nfs.sh");

        if iscsi {
            machine.add_disk(Disk::empty("iscsi", "sdc", STORAGE_DISK_SIZE));
            machine.add_deploy_script("setup_iscsi.sh");
        }

        machine.set_metadata(ENGINE_PASSWORD_KEY, engine_password);
        machine.add_deploy_script("setup_engine.sh");

        Ok(())
    }
}
