// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::Display;

use crate::expression_error::ExpressionError;

use super::{ConditionKey, ConditionValue, Conditions, ExpressionBuilder, SQLBuilder, SQLValue};

#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub enum Ordering {
    Asc,
    Desc,
}

impl Display for Ordering {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ordering::Asc => write!(f, "ASC"),
            Ordering::Desc => write!(f, "DESC"),
        }
    }
}

/// `ORDER BY <entry>, <entry>, ...`
///
/// Entries are taken as written: no operator parsing and no bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderByExpression {
    entries: Vec<String>,
}

impl OrderByExpression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<K: Into<ConditionKey>, V: AsRef<str>>(
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        let mut order_by = Self::new();
        for (key, value) in entries {
            order_by.add(key, value);
        }
        order_by
    }

    /// Entries of a description: every value must be text (a direction, or a fragment under a
    /// numeric key)
    pub fn from_conditions(conditions: Conditions) -> Result<Self, ExpressionError> {
        let mut order_by = Self::new();
        for (key, value) in conditions {
            match value {
                ConditionValue::Value(SQLValue::Text(text)) => {
                    order_by.add(key, text);
                }
                _ => {
                    return Err(ExpressionError::unexpected(
                        key.to_string(),
                        "order entries must be text",
                    ));
                }
            }
        }
        Ok(order_by)
    }

    /// `"<key> <value>"`, or just `"<value>"` for a numeric key
    pub fn add(&mut self, key: impl Into<ConditionKey>, value: impl AsRef<str>) -> &mut Self {
        let value = value.as_ref();
        let entry = match key.into() {
            ConditionKey::Index(_) => value.to_string(),
            ConditionKey::Name(name) if value.is_empty() => name,
            ConditionKey::Name(name) => format!("{name} {value}"),
        };
        if !entry.is_empty() {
            self.entries.push(entry);
        }
        self
    }

    pub fn order(&mut self, column: &str, ordering: Ordering) -> &mut Self {
        self.add(column, ordering.to_string())
    }

    pub fn asc(&mut self, column: &str) -> &mut Self {
        self.order(column, Ordering::Asc)
    }

    pub fn desc(&mut self, column: &str) -> &mut Self {
        self.order(column, Ordering::Desc)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

impl ExpressionBuilder for OrderByExpression {
    fn build(&self, builder: &mut SQLBuilder) {
        if self.entries.is_empty() {
            return;
        }
        builder.push_str("ORDER BY ");
        builder.push_iter(self.entries.iter(), ", ", |builder, entry| {
            builder.push_str(entry)
        });
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
