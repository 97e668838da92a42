use thiserror::Error;

/// The rule a machine specification string broke.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecificationIssue {
    #[error("unknown machine kind '{kind}' (known kinds: {})", .known.join(", "))]
    UnknownKind { kind: String, known: Vec<String> },

    #[error("machine name not defined")]
    MissingName,

    #[error("unknown keys for {kind} machine: {}", .keys.join(", "))]
    UnknownKeys { kind: String, keys: Vec<String> },

    #[error("invalid value for '{key}': expected {expected}, got '{value}'")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MachineError {
    #[error("invalid machine specification '{spec}': {issue}")]
    InvalidSpecification {
        spec: String,
        #[source]
        issue: SpecificationIssue,
    },
}

impl MachineError {
    pub fn issue(&self) -> &SpecificationIssue {
        match self {
            MachineError::InvalidSpecification { issue, .. } => issue,
        }
    }
}
