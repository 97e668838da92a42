use std::fmt;

use indexmap::IndexMap;

use crate::{
    SpecificationIssue,
    definition::MachineDraft,
    properties::Properties,
    variants::{Engine, Host},
};

/// Defaults a variant starts from before the shared keys are overlaid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantDefaults {
    pub memory_mb: u32,
    pub distro: String,
    pub root_password: String,
    pub service_provider: String,
}

impl Default for VariantDefaults {
    fn default() -> Self {
        Self {
            memory_mb: 2048,
            distro: "el7".to_owned(),
            root_password: "123456".to_owned(),
            service_provider: "systemd".to_owned(),
        }
    }
}

/// A kind of machine:
/// - the tag that selects it (first token of a specification)
/// - its defaults
/// - how it validates and applies its own keys
pub trait MachineVariant: Send + Sync {
    fn kind(&self) -> &'static str;

    fn defaults(&self) -> VariantDefaults {
        VariantDefaults::default()
    }

    /// Take the keys this variant understands out of `properties` and apply
    /// them to `machine`. Keys left behind are rejected by the caller.
    fn apply(
        &self,
        machine: &mut MachineDraft<'_>,
        properties: &mut Properties,
    ) -> Result<(), SpecificationIssue>;
}

/// The set of known variants, keyed by kind tag in registration order.
pub struct VariantRegistry {
    variants: IndexMap<&'static str, Box<dyn MachineVariant>>,
}

impl VariantRegistry {
    pub fn empty() -> Self {
        Self {
            variants: IndexMap::new(),
        }
    }

    /// Register a variant. A later registration for the same kind replaces
    /// the earlier one.
    pub fn register<V: MachineVariant + 'static>(&mut self, variant: V) -> &mut Self {
        self.variants.insert(variant.kind(), Box::new(variant));
        self
    }

    pub fn get(&self, kind: &str) -> Option<&dyn MachineVariant> {
        self.variants.get(kind).map(|variant| variant.as_ref())
    }

    pub fn kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.variants.keys().copied()
    }
}

impl Default for VariantRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Engine).register(Host);
        registry
    }
}

impl fmt::Debug for VariantRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.kinds()).finish()
    }
}
