// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The declarative description of conditions consumed by [`ConditionExpression::add`].
//!
//! A description is an ordered list of entries. Keys are either positional (numeric) or named:
//! - `"field"` or `"field operator"` compares a field with the entry's value
//! - `"and"`, `"or"`, `"xor"` and `"not"` group the entry's value
//! - a numeric key holds a trusted SQL fragment or a nested group joined with `AND`
//!
//! [`ConditionExpression::add`]: super::ConditionExpression::add

use std::fmt::Display;

use tracing::instrument;

use crate::expression_error::ExpressionError;

use super::{ConditionExpression, ExpressionBuilder, SQLValue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionKey {
    Index(usize),
    Name(String),
}

impl From<usize> for ConditionKey {
    fn from(index: usize) -> Self {
        ConditionKey::Index(index)
    }
}

impl From<&str> for ConditionKey {
    fn from(key: &str) -> Self {
        match key.parse::<usize>() {
            Ok(index) => ConditionKey::Index(index),
            Err(_) => ConditionKey::Name(key.to_string()),
        }
    }
}

impl From<String> for ConditionKey {
    fn from(key: String) -> Self {
        match key.parse::<usize>() {
            Ok(index) => ConditionKey::Index(index),
            Err(_) => ConditionKey::Name(key),
        }
    }
}

impl Display for ConditionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConditionKey::Index(index) => write!(f, "{index}"),
            ConditionKey::Name(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Debug)]
pub enum ConditionValue {
    /// A scalar or array to bind (a trusted fragment under a numeric key)
    Value(SQLValue),
    Group(Conditions),
    /// A sub-expression (sub-select, function call, ...) taken as is
    Expression(Box<dyn ExpressionBuilder>),
}

impl ConditionValue {
    pub fn is_empty(&self) -> bool {
        match self {
            ConditionValue::Value(value) => value.is_empty(),
            ConditionValue::Group(conditions) => conditions.is_empty(),
            ConditionValue::Expression(expression) => expression.is_empty(),
        }
    }
}

impl From<SQLValue> for ConditionValue {
    fn from(value: SQLValue) -> Self {
        ConditionValue::Value(value)
    }
}

impl From<Conditions> for ConditionValue {
    fn from(conditions: Conditions) -> Self {
        ConditionValue::Group(conditions)
    }
}

impl From<Box<dyn ExpressionBuilder>> for ConditionValue {
    fn from(expression: Box<dyn ExpressionBuilder>) -> Self {
        ConditionValue::Expression(expression)
    }
}

#[derive(Debug, Default)]
pub struct Conditions {
    entries: Vec<(ConditionKey, ConditionValue)>,
    next_index: usize,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(ConditionKey, ConditionValue)> {
        self.entries.iter()
    }

    pub fn push(&mut self, key: impl Into<ConditionKey>, value: impl Into<ConditionValue>) {
        let key = key.into();
        if let ConditionKey::Index(index) = key {
            self.next_index = self.next_index.max(index + 1);
        }
        self.entries.push((key, value.into()));
    }

    pub fn entry(mut self, key: impl Into<ConditionKey>, value: impl Into<ConditionValue>) -> Self {
        self.push(key, value);
        self
    }

    /// `"field"` or `"field operator"` compared with `value`
    pub fn field(self, key: &str, value: impl Into<SQLValue>) -> Self {
        self.entry(key, ConditionValue::Value(value.into()))
    }

    /// A group under `key` (`and`, `or`, `xor`, `not`)
    pub fn group(self, key: &str, conditions: Conditions) -> Self {
        self.entry(key, conditions)
    }

    /// A positional group joined with `AND`
    pub fn nested(self, conditions: Conditions) -> Self {
        let index = self.next_index;
        self.entry(index, conditions)
    }

    /// A trusted SQL fragment, passed through verbatim
    pub fn literal(self, fragment: impl Into<String>) -> Self {
        let index = self.next_index;
        self.entry(index, SQLValue::Text(fragment.into()))
    }

    pub fn expression(self, key: &str, expression: impl ExpressionBuilder + 'static) -> Self {
        self.entry(
            key,
            ConditionValue::Expression(Box::new(expression) as Box<dyn ExpressionBuilder>),
        )
    }

    /// Build conditions from JSON (key order is preserved).
    ///
    /// An object maps keys to values: nested objects become groups, and arrays become groups
    /// under numeric or `and`/`or`/`xor`/`not` keys and bound arrays elsewhere. A top-level array
    /// is a list of positional entries (fragments or groups).
    #[instrument(name = "Conditions::from_json", skip_all)]
    pub fn from_json(json: &serde_json::Value) -> Result<Self, ExpressionError> {
        use serde_json::Value;

        match json {
            Value::Object(entries) => {
                let mut conditions = Conditions::new();
                for (key, value) in entries {
                    let key = ConditionKey::from(key.as_str());
                    let value = Self::json_value(&key, value)?;
                    conditions.push(key, value);
                }
                Ok(conditions)
            }
            Value::Array(elems) => {
                let mut conditions = Conditions::new();
                for (index, elem) in elems.iter().enumerate() {
                    let key = ConditionKey::Index(index);
                    let value = Self::json_value(&key, elem)?;
                    conditions.push(key, value);
                }
                Ok(conditions)
            }
            other => Err(ExpressionError::InvalidJson(format!(
                "expected an object or an array, got {other}"
            ))),
        }
    }

    fn json_value(
        key: &ConditionKey,
        value: &serde_json::Value,
    ) -> Result<ConditionValue, ExpressionError> {
        use serde_json::Value;

        let groups_arrays = match key {
            ConditionKey::Index(_) => true,
            ConditionKey::Name(name) => is_group_keyword(name),
        };

        Ok(match value {
            Value::Object(_) => ConditionValue::Group(Self::from_json(value)?),
            Value::Array(_) if groups_arrays => ConditionValue::Group(Self::from_json(value)?),
            scalar => ConditionValue::Value(scalar.clone().into()),
        })
    }
}

impl IntoIterator for Conditions {
    type Item = (ConditionKey, ConditionValue);
    type IntoIter = std::vec::IntoIter<(ConditionKey, ConditionValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

pub(crate) fn is_group_keyword(key: &str) -> bool {
    ["and", "or", "xor", "not"]
        .iter()
        .any(|keyword| key.eq_ignore_ascii_case(keyword))
}

/// Anything [`ConditionExpression::add`] accepts.
#[derive(Debug)]
pub enum ConditionInput {
    /// A trusted SQL fragment
    Fragment(String),
    Conditions(Conditions),
    /// A node nested as is (when not empty)
    Expression(Box<dyn ExpressionBuilder>),
}

impl From<&str> for ConditionInput {
    fn from(fragment: &str) -> Self {
        ConditionInput::Fragment(fragment.to_string())
    }
}

impl From<String> for ConditionInput {
    fn from(fragment: String) -> Self {
        ConditionInput::Fragment(fragment)
    }
}

impl From<Conditions> for ConditionInput {
    fn from(conditions: Conditions) -> Self {
        ConditionInput::Conditions(conditions)
    }
}

impl From<ConditionExpression> for ConditionInput {
    fn from(expression: ConditionExpression) -> Self {
        ConditionInput::Expression(Box::new(expression))
    }
}

impl From<Box<dyn ExpressionBuilder>> for ConditionInput {
    fn from(expression: Box<dyn ExpressionBuilder>) -> Self {
        ConditionInput::Expression(expression)
    }
}

impl ConditionInput {
    /// The input for the group built from an entry's value (under `and`, `or`, `not`, ...)
    pub(crate) fn from_value(
        key: &ConditionKey,
        value: ConditionValue,
    ) -> Result<Self, ExpressionError> {
        match value {
            ConditionValue::Value(SQLValue::Text(fragment)) => Ok(ConditionInput::Fragment(fragment)),
            ConditionValue::Value(other) => Err(ExpressionError::unexpected(
                key.to_string(),
                format!("expected conditions or an SQL fragment, got {}", other.kind()),
            )),
            ConditionValue::Group(conditions) => Ok(ConditionInput::Conditions(conditions)),
            ConditionValue::Expression(expression) => Ok(ConditionInput::Expression(expression)),
        }
    }
}
