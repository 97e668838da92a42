use indexmap::IndexMap;

use crate::SpecificationIssue;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    /// A bare `key` with no `=value`.
    Flag,
    Text(String),
}

impl PropertyValue {
    fn as_str(&self) -> &str {
        match self {
            PropertyValue::Flag => "",
            PropertyValue::Text(text) => text,
        }
    }
}

/// The `key[=value]` pairs of a machine specification, in the order given.
///
/// Consumers `take_*` the keys they understand; whatever is left over once
/// every consumer has run is an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties(IndexMap<String, PropertyValue>);

impl Properties {
    pub fn insert(&mut self, key: impl Into<String>, value: PropertyValue) {
        self.0.insert(key.into(), value);
    }

    pub fn take(&mut self, key: &str) -> Option<PropertyValue> {
        self.0.shift_remove(key)
    }

    pub fn take_text(&mut self, key: &str) -> Result<Option<String>, SpecificationIssue> {
        match self.take(key) {
            None => Ok(None),
            Some(PropertyValue::Text(text)) => Ok(Some(text)),
            Some(PropertyValue::Flag) => Err(invalid(key, &PropertyValue::Flag, "key=value")),
        }
    }

    pub fn take_flag(&mut self, key: &str) -> Result<bool, SpecificationIssue> {
        let Some(value) = self.take(key) else {
            return Ok(false);
        };
        match &value {
            PropertyValue::Flag => Ok(true),
            PropertyValue::Text(text) => match text.as_str() {
                "true" | "yes" | "on" | "1" => Ok(true),
                "false" | "no" | "off" | "0" => Ok(false),
                _ => Err(invalid(key, &value, "a boolean")),
            },
        }
    }

    pub fn take_megabytes(&mut self, key: &str) -> Result<Option<u32>, SpecificationIssue> {
        let Some(value) = self.take(key) else {
            return Ok(None);
        };
        match value.as_str().parse::<u32>() {
            Ok(megabytes) if megabytes > 0 => Ok(Some(megabytes)),
            _ => Err(invalid(key, &value, "a positive number of megabytes")),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn invalid(key: &str, value: &PropertyValue, expected: &'static str) -> SpecificationIssue {
    SpecificationIssue::InvalidValue {
        key: key.to_owned(),
        value: value.as_str().to_owned(),
        expected,
    }
}
