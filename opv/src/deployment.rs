use std::collections::BTreeMap;

use opv_machine::{MachineDefinition, MachineError, MachineResolver, NETWORK_NAME};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Error, Debug)]
pub enum DeploymentError {
    #[error("no machines requested")]
    Empty,

    #[error(transparent)]
    Machine(#[from] MachineError),

    #[error("machine name '{0}' is used more than once")]
    DuplicateName(String),

    #[error("machine '{name}' runs {family} but the deployment runs {expected}")]
    MixedFamilies {
        name: String,
        family: String,
        expected: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dhcp {
    pub start: u8,
    pub end: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Network {
    #[serde(rename = "type")]
    pub kind: String,
    pub dhcp: Dhcp,
    pub management: bool,
}

impl Network {
    pub fn nat() -> Self {
        Self {
            kind: "nat".to_owned(),
            dhcp: Dhcp {
                start: 100,
                end: 254,
            },
            management: true,
        }
    }
}

/// Every machine of one verification run plus the network they share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deployment {
    domains: BTreeMap<String, MachineDefinition>,
    nets: BTreeMap<String, Network>,
}

impl Deployment {
    /// Resolve each specification and collect the results. All machines must
    /// have distinct names and share one distribution family, since a single
    /// repository file is installed on all of them.
    #[instrument(skip_all)]
    pub fn resolve<I, S>(resolver: &MachineResolver, specs: I) -> Result<Self, DeploymentError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut domains = BTreeMap::new();
        let mut family: Option<String> = None;

        for spec in specs {
            let machine = resolver.resolve(spec.as_ref())?;

            let expected = family.get_or_insert_with(|| machine.distro_family().to_owned());
            if expected.as_str() != machine.distro_family() {
                return Err(DeploymentError::MixedFamilies {
                    name: machine.name().to_owned(),
                    family: machine.distro_family().to_owned(),
                    expected: expected.clone(),
                });
            }

            if domains.contains_key(machine.name()) {
                return Err(DeploymentError::DuplicateName(machine.name().to_owned()));
            }
            domains.insert(machine.name().to_owned(), machine);
        }

        if domains.is_empty() {
            return Err(DeploymentError::Empty);
        }

        debug!(machines = domains.len(), "resolved deployment");

        let nets = BTreeMap::from([(NETWORK_NAME.to_owned(), Network::nat())]);
        Ok(Self { domains, nets })
    }

    pub fn machines(&self) -> impl Iterator<Item = &MachineDefinition> {
        self.domains.values()
    }

    pub fn machine(&self, name: &str) -> Option<&MachineDefinition> {
        self.domains.get(name)
    }

    /// The distribution of the machines, used to pick the repository file.
    pub fn distro(&self) -> Option<&str> {
        self.machines().next().map(MachineDefinition::distro)
    }
}
