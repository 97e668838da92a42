use std::path::PathBuf;

use tracing::debug;

use crate::{
    MachineError, SpecificationIssue,
    definition::{DraftFields, MachineDefinition, MachineDraft},
    spec::{self, ParsedSpec},
    variant::VariantRegistry,
};

/// Turns `kind,key=value,...` strings into [`MachineDefinition`]s.
///
/// Holds no mutable state; one resolver can serve any number of calls.
#[derive(Debug)]
pub struct MachineResolver {
    registry: VariantRegistry,
    scripts_base: PathBuf,
    release_script: Option<PathBuf>,
}

impl MachineResolver {
    /// A resolver over the built-in variants. Bundled deploy scripts are
    /// referenced under `<scripts_base>/deploy-scripts/`.
    pub fn new(scripts_base: impl Into<PathBuf>) -> Self {
        Self::with_registry(VariantRegistry::default(), scripts_base)
    }

    pub fn with_registry(registry: VariantRegistry, scripts_base: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            scripts_base: scripts_base.into(),
            release_script: None,
        }
    }

    /// Run `script` on every machine right after the bootstrap script and
    /// before any variant script.
    pub fn release_script(mut self, script: impl Into<PathBuf>) -> Self {
        self.release_script = Some(script.into());
        self
    }

    pub fn registry(&self) -> &VariantRegistry {
        &self.registry
    }

    pub fn resolve(&self, spec: &str) -> Result<MachineDefinition, MachineError> {
        self.build(spec)
            .map_err(|issue| MachineError::InvalidSpecification {
                spec: spec.to_owned(),
                issue,
            })
    }

    fn build(&self, spec: &str) -> Result<MachineDefinition, SpecificationIssue> {
        let ParsedSpec {
            kind,
            mut properties,
        } = spec::parse(spec);

        let variant = self
            .registry
            .get(kind)
            .ok_or_else(|| SpecificationIssue::UnknownKind {
                kind: kind.to_owned(),
                known: self.registry.kinds().map(str::to_owned).collect(),
            })?;

        let name = properties
            .take_text("name")?
            .filter(|name| !name.is_empty())
            .ok_or(SpecificationIssue::MissingName)?;

        let defaults = variant.defaults();
        let fields = DraftFields {
            name,
            kind: variant.kind().to_owned(),
            memory_mb: properties
                .take_megabytes("memory")?
                .unwrap_or(defaults.memory_mb),
            distro: properties.take_text("distro")?.unwrap_or(defaults.distro),
            root_password: properties
                .take_text("root_password")?
                .unwrap_or(defaults.root_password),
            service_provider: properties
                .take_text("service_provider")?
                .unwrap_or(defaults.service_provider),
        };

        let mut draft = MachineDraft::new(&self.scripts_base, fields);
        if let Some(script) = &self.release_script {
            draft.add_external_script(script.clone());
        }

        variant.apply(&mut draft, &mut properties)?;

        if !properties.is_empty() {
            return Err(SpecificationIssue::UnknownKeys {
                kind: variant.kind().to_owned(),
                keys: properties.keys().map(str::to_owned).collect(),
            });
        }

        let machine = draft.finish();
        debug!(
            name = machine.name(),
            kind = machine.kind(),
            scripts = machine.deploy_scripts().len(),
            "resolved machine definition"
        );
        Ok(machine)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use serde_json::json;

    use super::*;
    use crate::{
        definition::{Disk, DiskSource},
        properties::Properties,
        variant::{MachineVariant, VariantDefaults},
        variants::ENGINE_PASSWORD_KEY,
    };

    fn resolver() -> MachineResolver {
        MachineResolver::new("/opt/opv")
    }

    fn script(name: &str) -> PathBuf {
        Path::new("/opt/opv/deploy-scripts").join(name)
    }

    fn scripts(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|name| script(name)).collect()
    }

    #[test]
    fn host_defaults() {
        let machine = resolver().resolve("host,name=host-0").unwrap();

        assert_eq!(machine.name(), "host-0");
        assert_eq!(machine.kind(), "host");
        assert_eq!(machine.vm_type(), "ovirt-host");
        assert_eq!(machine.memory_mb(), 2048);
        assert_eq!(machine.distro(), "el7");
        assert_eq!(machine.distro_family(), "el");
        assert_eq!(machine.root_password(), "123456");
        assert_eq!(machine.service_provider(), "systemd");
        assert_eq!(machine.network_interfaces().len(), 1);
        assert_eq!(machine.network_interfaces()[0].net, "ovirt-patch-verifier");
        assert_eq!(machine.disks(), &[Disk::root("el7")]);
        assert_eq!(
            machine.deploy_scripts(),
            scripts(&["add_local_repo.sh", "setup_host.sh"])
        );
    }

    #[test]
    fn engine_defaults() {
        let machine = resolver().resolve("engine,name=engine").unwrap();

        assert_eq!(machine.memory_mb(), 4096);
        assert_eq!(machine.metadata(ENGINE_PASSWORD_KEY), Some("123"));
        let names: Vec<_> = machine.disks().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["root", "nfs"]);
        assert_eq!(
            machine.deploy_scripts(),
            scripts(&["add_local_repo.sh", "setup_nfs.sh", "setup_engine.sh"])
        );
    }

    #[test]
    fn engine_with_iscsi_and_password() {
        let machine = resolver()
            .resolve("engine, name=engine, iscsi, engine_password=secret")
            .unwrap();

        assert_eq!(machine.metadata(ENGINE_PASSWORD_KEY), Some("secret"));
        let iscsi = &machine.disks()[2];
        assert_eq!(iscsi.name, "iscsi");
        assert_eq!(iscsi.device, "sdc");
        assert_eq!(
            iscsi.source,
            DiskSource::Empty {
                size: "101G".into()
            }
        );
        assert_eq!(
            machine.deploy_scripts(),
            scripts(&[
                "add_local_repo.sh",
                "setup_nfs.sh",
                "setup_iscsi.sh",
                "setup_engine.sh"
            ])
        );
    }

    #[test]
    fn shared_keys_override_defaults() {
        let machine = resolver()
            .resolve(
                "host,name=h,memory=3072,distro=fc28,root_password=pw,service_provider=sysvinit",
            )
            .unwrap();

        assert_eq!(machine.memory_mb(), 3072);
        assert_eq!(machine.distro(), "fc28");
        assert_eq!(machine.distro_family(), "fc");
        assert_eq!(machine.root_password(), "pw");
        assert_eq!(machine.service_provider(), "sysvinit");
        assert_eq!(machine.disks(), &[Disk::root("fc28")]);
    }

    #[test]
    fn release_script_runs_after_bootstrap() {
        let machine = resolver()
            .release_script("/tmp/install_release.sh")
            .resolve("engine,name=engine")
            .unwrap();

        let mut expected = vec![
            script("add_local_repo.sh"),
            PathBuf::from("/tmp/install_release.sh"),
        ];
        expected.extend(scripts(&["setup_nfs.sh", "setup_engine.sh"]));
        assert_eq!(machine.deploy_scripts(), expected);
    }

    #[test]
    fn missing_name() {
        for spec in ["host", "host,memory=1024", "engine,name=", "host,name"] {
            let err = resolver().resolve(spec).unwrap_err();
            assert!(
                matches!(
                    err.issue(),
                    SpecificationIssue::MissingName | SpecificationIssue::InvalidValue { .. }
                ),
                "{spec}: {err}"
            );
        }
        assert_eq!(
            resolver().resolve("host,memory=1024").unwrap_err().issue(),
            &SpecificationIssue::MissingName
        );
    }

    #[test]
    fn unknown_kind() {
        for spec in ["", "storage,name=s", "Engine,name=e", "ovirt-engine,name=e"] {
            let err = resolver().resolve(spec).unwrap_err();
            let SpecificationIssue::UnknownKind { known, .. } = err.issue() else {
                panic!("{spec}: {err}");
            };
            assert_eq!(known, &vec!["engine".to_owned(), "host".to_owned()]);
        }
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = resolver().resolve("host,name=h,iscsi,cpus=4").unwrap_err();
        assert_eq!(
            err,
            MachineError::InvalidSpecification {
                spec: "host,name=h,iscsi,cpus=4".into(),
                issue: SpecificationIssue::UnknownKeys {
                    kind: "host".into(),
                    keys: vec!["iscsi".into(), "cpus".into()],
                },
            }
        );
        assert!(err.to_string().contains("host,name=h,iscsi,cpus=4"));
    }

    #[test]
    fn invalid_memory() {
        let err = resolver().resolve("host,name=h,memory=lots").unwrap_err();
        assert!(matches!(
            err.issue(),
            SpecificationIssue::InvalidValue { key, .. } if key == "memory"
        ));
    }

    #[test]
    fn resolving_twice_is_structurally_equal() {
        let resolver = resolver();
        let spec = "engine,name=engine,iscsi";
        assert_eq!(resolver.resolve(spec).unwrap(), resolver.resolve(spec).unwrap());
    }

    #[test]
    fn serializes_as_domain() {
        let machine = resolver().resolve("engine,name=engine").unwrap();
        let value = serde_json::to_value(&machine).unwrap();
        assert_eq!(
            value,
            json!({
                "vm-type": "ovirt-engine",
                "memory": 4096,
                "service-provider": "systemd",
                "root_password": "123456",
                "nics": [{ "net": "ovirt-patch-verifier" }],
                "disks": [
                    {
                        "type": "template",
                        "template_name": "el7-base",
                        "name": "root",
                        "dev": "vda",
                        "format": "qcow2",
                    },
                    {
                        "type": "empty",
                        "size": "101G",
                        "name": "nfs",
                        "dev": "sda",
                        "format": "raw",
                    },
                ],
                "metadata": {
                    "deploy-scripts": [
                        "/opt/opv/deploy-scripts/add_local_repo.sh",
                        "/opt/opv/deploy-scripts/setup_nfs.sh",
                        "/opt/opv/deploy-scripts/setup_engine.sh",
                    ],
                    "ovirt-engine-password": "123",
                },
            })
        );
    }

    struct Storage;

    impl MachineVariant for Storage {
        fn kind(&self) -> &'static str {
            "storage"
        }

        fn defaults(&self) -> VariantDefaults {
            VariantDefaults {
                memory_mb: 1024,
                ..VariantDefaults::default()
            }
        }

        fn apply(
            &self,
            machine: &mut MachineDraft<'_>,
            properties: &mut Properties,
        ) -> Result<(), SpecificationIssue> {
            let size = properties
                .take_text("size")?
                .unwrap_or_else(|| "50G".to_owned());
            machine.add_disk(Disk::empty("export", "sdb", &size));
            machine.add_deploy_script("setup_nfs.sh");
            Ok(())
        }
    }

    #[test]
    fn registered_variants_are_discovered() {
        let mut registry = VariantRegistry::default();
        registry.register(Storage);
        let resolver = MachineResolver::with_registry(registry, "/opt/opv");

        let machine = resolver.resolve("storage,name=nas,size=200G").unwrap();
        assert_eq!(machine.vm_type(), "ovirt-storage");
        assert_eq!(machine.memory_mb(), 1024);
        assert_eq!(machine.disks()[1], Disk::empty("export", "sdb", "200G"));
        assert_eq!(
            machine.deploy_scripts(),
            scripts(&["add_local_repo.sh", "setup_nfs.sh"])
        );

        assert!(resolver.resolve("host,name=h").is_ok());
    }
}
