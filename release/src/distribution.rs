use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static FEDORA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^fc([0-9]{2})$").expect("fedora version pattern"));
static ENTERPRISE_LINUX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^el[0-9]+$").expect("enterprise linux version pattern"));

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported distribution '{0}' (expected el<N> or fc<NN>)")]
pub struct UnsupportedDistribution(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistFamily {
    Fedora,
    EnterpriseLinux,
}

impl DistFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistFamily::Fedora => "fc",
            DistFamily::EnterpriseLinux => "el",
        }
    }
}

impl Display for DistFamily {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A target distribution such as `el7` or `fc28`, with the name of the
/// dependency repo file the release package ships for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    version: String,
    family: DistFamily,
    dependency_fragment: String,
}

impl Distribution {
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn family(&self) -> DistFamily {
        self.family
    }

    pub fn dependency_fragment(&self) -> &str {
        &self.dependency_fragment
    }
}

impl FromStr for Distribution {
    type Err = UnsupportedDistribution;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (family, dependency_fragment) = if let Some(captures) = FEDORA.captures(s) {
            (DistFamily::Fedora, format!("ovirt-f{}-deps.repo", &captures[1]))
        } else if ENTERPRISE_LINUX.is_match(s) {
            (DistFamily::EnterpriseLinux, format!("ovirt-{s}-deps.repo"))
        } else {
            return Err(UnsupportedDistribution(s.to_owned()));
        };

        Ok(Self {
            version: s.to_owned(),
            family,
            dependency_fragment,
        })
    }
}

impl Display for Distribution {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.version)
    }
}
