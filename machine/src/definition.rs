use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Every machine is attached to this network.
pub const NETWORK_NAME: &str = "ovirt-patch-verifier";

/// Directory under the scripts base path that holds deploy scripts.
pub const DEPLOY_SCRIPTS_DIR: &str = "deploy-scripts";

/// Runs first on every machine.
pub const BOOTSTRAP_SCRIPT: &str = "add_local_repo.sh";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkInterface {
    pub net: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DiskSource {
    Template { template_name: String },
    Empty { size: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Disk {
    #[serde(flatten)]
    pub source: DiskSource,
    pub name: String,
    #[serde(rename = "dev")]
    pub device: String,
    pub format: String,
}

impl Disk {
    /// The root disk, cloned from the `<distro>-base` template.
    pub fn root(distro: &str) -> Self {
        Self {
            source: DiskSource::Template {
                template_name: format!("{distro}-base"),
            },
            name: "root".to_owned(),
            device: "vda".to_owned(),
            format: "qcow2".to_owned(),
        }
    }

    /// A blank raw disk.
    pub fn empty(name: &str, device: &str, size: &str) -> Self {
        Self {
            source: DiskSource::Empty {
                size: size.to_owned(),
            },
            name: name.to_owned(),
            device: device.to_owned(),
            format: "raw".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    #[serde(rename = "deploy-scripts")]
    deploy_scripts: Vec<PathBuf>,
    #[serde(flatten)]
    extra: BTreeMap<String, String>,
}

/// A fully resolved virtual machine, in the shape the provisioning runtime
/// expects for one domain. The name is the domain key and is not part of the
/// serialized record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MachineDefinition {
    #[serde(skip)]
    name: String,
    #[serde(skip)]
    kind: String,
    #[serde(rename = "vm-type")]
    vm_type: String,
    #[serde(rename = "memory")]
    memory_mb: u32,
    #[serde(skip)]
    distro: String,
    #[serde(rename = "service-provider")]
    service_provider: String,
    root_password: String,
    nics: Vec<NetworkInterface>,
    disks: Vec<Disk>,
    metadata: Metadata,
}

impl MachineDefinition {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn vm_type(&self) -> &str {
        &self.vm_type
    }

    pub fn memory_mb(&self) -> u32 {
        self.memory_mb
    }

    pub fn distro(&self) -> &str {
        &self.distro
    }

    /// The leading letters of the distro, e.g. `el` for `el7`.
    pub fn distro_family(&self) -> &str {
        let end = self
            .distro
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(self.distro.len());
        &self.distro[..end]
    }

    pub fn root_password(&self) -> &str {
        &self.root_password
    }

    pub fn service_provider(&self) -> &str {
        &self.service_provider
    }

    pub fn network_interfaces(&self) -> &[NetworkInterface] {
        &self.nics
    }

    pub fn disks(&self) -> &[Disk] {
        &self.disks
    }

    pub fn deploy_scripts(&self) -> &[PathBuf] {
        &self.metadata.deploy_scripts
    }

    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.extra.get(key).map(String::as_str)
    }
}

/// A machine under construction, handed to a variant so it can add its own
/// disks, scripts and metadata. Identity fields are fixed before the variant
/// sees it.
#[derive(Debug)]
pub struct MachineDraft<'a> {
    scripts_base: &'a Path,
    machine: MachineDefinition,
}

pub(crate) struct DraftFields {
    pub name: String,
    pub kind: String,
    pub memory_mb: u32,
    pub distro: String,
    pub root_password: String,
    pub service_provider: String,
}

impl<'a> MachineDraft<'a> {
    pub(crate) fn new(scripts_base: &'a Path, fields: DraftFields) -> Self {
        let DraftFields {
            name,
            kind,
            memory_mb,
            distro,
            root_password,
            service_provider,
        } = fields;

        let mut draft = Self {
            scripts_base,
            machine: MachineDefinition {
                vm_type: format!("ovirt-{kind}"),
                name,
                kind,
                memory_mb,
                service_provider,
                root_password,
                // TODO: bonding and a storage-dedicated network need more than one nic here
                nics: vec![NetworkInterface {
                    net: NETWORK_NAME.to_owned(),
                }],
                disks: vec![Disk::root(&distro)],
                distro,
                metadata: Metadata::default(),
            },
        };
        draft.add_deploy_script(BOOTSTRAP_SCRIPT);
        draft
    }

    pub fn distro(&self) -> &str {
        &self.machine.distro
    }

    pub fn add_disk(&mut self, disk: Disk) {
        self.machine.disks.push(disk);
    }

    /// Append a bundled script, by file name, to the deploy order.
    pub fn add_deploy_script(&mut self, script: &str) {
        let path = self.scripts_base.join(DEPLOY_SCRIPTS_DIR).join(script);
        self.machine.metadata.deploy_scripts.push(path);
    }

    /// Append a script given by its own path, outside the bundled set.
    pub(crate) fn add_external_script(&mut self, path: PathBuf) {
        self.machine.metadata.deploy_scripts.push(path);
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.machine.metadata.extra.insert(key.into(), value.into());
    }

    pub(crate) fn finish(self) -> MachineDefinition {
        self.machine
    }
}
