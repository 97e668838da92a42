use crate::properties::{Properties, PropertyValue};

/// A machine specification split into its kind token and its properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedSpec<'a> {
    pub kind: &'a str,
    pub properties: Properties,
}

/// Split `kind,key=value,flag,...` into its parts.
///
/// Tokens are trimmed; empty tokens (such as a trailing comma) are skipped.
/// A repeated key keeps its last value.
pub(crate) fn parse(spec: &str) -> ParsedSpec<'_> {
    let mut tokens = spec.split(',').map(str::trim);
    let kind = tokens.next().unwrap_or_default();

    let mut properties = Properties::default();
    for token in tokens.filter(|token| !token.is_empty()) {
        match token.split_once('=') {
            Some((key, value)) => {
                properties.insert(key.trim(), PropertyValue::Text(value.trim().to_owned()))
            }
            None => properties.insert(token, PropertyValue::Flag),
        }
    }

    ParsedSpec { kind, properties }
}
