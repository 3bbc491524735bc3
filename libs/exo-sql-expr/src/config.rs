// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::env;

use serde::Deserialize;

use crate::expression_error::ExpressionError;

pub const EXO_SQL_PLACEHOLDER_PREFIX: &str = "EXO_SQL_PLACEHOLDER_PREFIX";

const DEFAULT_PLACEHOLDER_PREFIX: &str = "c";

/// Settings shared by every expression built from the same [`ExpressionContext`].
///
/// Embedding applications may deserialize this from their own configuration; missing fields take
/// the default values.
///
/// [`ExpressionContext`]: crate::ExpressionContext
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExpressionConfig {
    /// Prepended to every generated placeholder name (`:c3_0` for the default `c`)
    pub placeholder_prefix: String,
}

impl Default for ExpressionConfig {
    fn default() -> Self {
        Self {
            placeholder_prefix: DEFAULT_PLACEHOLDER_PREFIX.to_string(),
        }
    }
}

impl ExpressionConfig {
    pub fn new(placeholder_prefix: impl Into<String>) -> Result<Self, ExpressionError> {
        let config = Self {
            placeholder_prefix: placeholder_prefix.into(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self, ExpressionError> {
        Self::from_env_helper(|key| env::var(key).ok())
    }

    fn from_env_helper(get: impl Fn(&str) -> Option<String>) -> Result<Self, ExpressionError> {
        match get(EXO_SQL_PLACEHOLDER_PREFIX) {
            Some(prefix) => Self::new(prefix),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ExpressionError> {
        let prefix = &self.placeholder_prefix;

        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ExpressionError::Config(format!(
                "{EXO_SQL_PLACEHOLDER_PREFIX} must be a non-empty sequence of letters, digits or underscores (got '{prefix}')"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| values.get(key).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let config = ExpressionConfig::from_env_helper(env_of(&[])).unwrap();
        assert_eq!(config, ExpressionConfig::default());
        assert_eq!(config.placeholder_prefix, "c");
    }

    #[test]
    fn prefix_from_env() {
        let config =
            ExpressionConfig::from_env_helper(env_of(&[(EXO_SQL_PLACEHOLDER_PREFIX, "p")])).unwrap();
        assert_eq!(config.placeholder_prefix, "p");
    }

    #[test]
    fn invalid_prefix() {
        assert!(matches!(
            ExpressionConfig::from_env_helper(env_of(&[(EXO_SQL_PLACEHOLDER_PREFIX, "a-b")])),
            Err(ExpressionError::Config(_))
        ));
        assert!(ExpressionConfig::new("").is_err());
    }

    #[test]
    fn deserialize_with_defaults() {
        let config: ExpressionConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ExpressionConfig::default());

        let config: ExpressionConfig =
            serde_json::from_str(r#"{"placeholder_prefix": "arg"}"#).unwrap();
        assert_eq!(config.placeholder_prefix, "arg");
    }
}
