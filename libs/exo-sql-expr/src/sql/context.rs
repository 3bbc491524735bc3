// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, LazyLock,
    },
};

use crate::{config::ExpressionConfig, expression_error::ExpressionError};

static GLOBAL_IDENTITIES: LazyLock<IdentitySource> = LazyLock::new(IdentitySource::new);

/// Hands out identity tokens for expression nodes.
///
/// Clones share the same counter. Use one source per statement being assembled (or the global
/// one) so that no two nodes whose SQL ends up in the same statement share a token.
#[derive(Debug, Clone)]
pub struct IdentitySource(Arc<AtomicUsize>);

impl IdentitySource {
    /// A fresh counter starting at zero
    pub fn new() -> Self {
        Self(Arc::new(AtomicUsize::new(0)))
    }

    /// The process-wide counter
    pub fn global() -> Self {
        GLOBAL_IDENTITIES.clone()
    }

    pub fn next_token(&self) -> String {
        let id = self.0.fetch_add(1, Ordering::Relaxed);
        format!("{id}_")
    }
}

impl Default for IdentitySource {
    fn default() -> Self {
        Self::global()
    }
}

/// Declared types for fields, e.g. `id -> integer`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeMap(HashMap<String, String>);

impl TypeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, field: impl Into<String>, declared_type: impl Into<String>) -> Self {
        self.0.insert(field.into(), declared_type.into());
        self
    }

    pub fn type_of(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(|ty| ty.as_str())
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for TypeMap {
    fn from(values: [(K, V); N]) -> Self {
        Self(
            values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Everything a node needs from its surroundings: configuration, where to get identity tokens
/// from and the declared field types. Nested nodes inherit the context of the node that created
/// them.
#[derive(Debug, Clone, Default)]
pub struct ExpressionContext {
    config: Arc<ExpressionConfig>,
    identities: IdentitySource,
    types: Arc<TypeMap>,
}

impl ExpressionContext {
    /// A context drawing identity tokens from the process-wide counter. Use
    /// [`with_identities`](Self::with_identities) for a counter scoped to one statement.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: ExpressionConfig) -> Result<Self, ExpressionError> {
        config.validate()?;
        self.config = Arc::new(config);
        Ok(self)
    }

    pub fn with_identities(mut self, identities: IdentitySource) -> Self {
        self.identities = identities;
        self
    }

    pub fn with_types(mut self, types: TypeMap) -> Self {
        self.types = Arc::new(types);
        self
    }

    pub fn config(&self) -> &ExpressionConfig {
        &self.config
    }

    pub fn types(&self) -> &TypeMap {
        &self.types
    }

    pub(crate) fn next_identity(&self) -> String {
        self.identities.next_token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_counter() {
        let identities = IdentitySource::new();
        let other = identities.clone();

        assert_eq!(identities.next_token(), "0_");
        assert_eq!(other.next_token(), "1_");
        assert_eq!(IdentitySource::new().next_token(), "0_");
    }

    #[test]
    fn global_tokens_are_unique() {
        let a = IdentitySource::global().next_token();
        let b = IdentitySource::default().next_token();
        assert_ne!(a, b);
    }

    #[test]
    fn separate_contexts_never_share_tokens() {
        let first = ExpressionContext::new();
        let second = ExpressionContext::default();

        assert_ne!(first.next_identity(), second.next_identity());
        assert_ne!(first.next_identity(), first.next_identity());
    }

    #[test]
    fn type_lookup() {
        let types = TypeMap::from([("id", "integer")]).with_type("tags", "string[]");
        assert_eq!(types.type_of("id"), Some("integer"));
        assert_eq!(types.type_of("tags"), Some("string[]"));
        assert_eq!(types.type_of("name"), None);
    }

    #[test]
    fn rejects_invalid_config() {
        let config = ExpressionConfig {
            placeholder_prefix: "a b".to_string(),
        };
        assert!(ExpressionContext::new().with_config(config).is_err());
    }
}
