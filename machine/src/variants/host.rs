use crate::{
    SpecificationIssue, definition::MachineDraft, properties::Properties, variant::MachineVariant,
};

/// A hypervisor node.
#[derive(Debug, Clone, Copy)]
pub struct Host;

impl MachineVariant for Host {
    fn kind(&self) -> &'static str {
        "host"
    }

    fn apply(
        &self,
        machine: &mut MachineDraft<'_>,
        _properties: &mut Properties,
    ) -> Result<(), SpecificationIssue> {
        machine.add_deploy_script("setup_host.sh");
        Ok(())
    }
}
