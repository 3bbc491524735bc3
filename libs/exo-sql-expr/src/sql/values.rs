// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use indexmap::IndexMap;
use tracing::trace;

use crate::expression_error::ExpressionError;

use super::{Binding, ExpressionBuilder, Placeholder, SQLBuilder, SQLValue, TypeMap};

/// Rows for an `INSERT ... VALUES` list. Renders one `(?, ?, ...)` group per row, with bindings in
/// row-major order.
#[derive(Debug, Clone, Default)]
pub struct ValuesExpression {
    columns: Vec<String>,
    rows: Vec<Vec<SQLValue>>,
    types: TypeMap,
}

impl ValuesExpression {
    /// Fix the columns up front. With no columns, the first row added fixes them.
    pub fn new<T: Into<String>>(columns: impl IntoIterator<Item = T>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Declared types for the columns, carried on the bindings
    pub fn with_types(mut self, types: TypeMap) -> Self {
        self.types = types;
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<SQLValue>] {
        &self.rows
    }

    /// Append a row. The row must have exactly the established columns (in any order).
    pub fn add<K: Into<String>>(
        &mut self,
        row: impl IntoIterator<Item = (K, SQLValue)>,
    ) -> Result<&mut Self, ExpressionError> {
        let mut row: IndexMap<String, SQLValue> =
            row.into_iter().map(|(k, v)| (k.into(), v)).collect();

        if self.columns.is_empty() {
            self.columns = row.keys().cloned().collect();
        }

        let mismatched = row.len() != self.columns.len()
            || self.columns.iter().any(|column| !row.contains_key(column));
        if mismatched {
            return Err(ExpressionError::MismatchedColumns {
                expected: self.columns.clone(),
                found: row.into_keys().collect(),
            });
        }

        let values = self
            .columns
            .iter()
            .filter_map(|column| row.swap_remove(column))
            .collect();
        self.rows.push(values);

        Ok(self)
    }

    /// Append a JSON object as a row (key order preserved)
    pub fn add_json(&mut self, row: &serde_json::Value) -> Result<&mut Self, ExpressionError> {
        match row {
            serde_json::Value::Object(entries) => self.add(
                entries
                    .iter()
                    .map(|(column, value)| (column.as_str(), SQLValue::from(value.clone()))),
            ),
            other => Err(ExpressionError::InvalidJson(format!(
                "a row must be an object, got {other}"
            ))),
        }
    }
}

impl ExpressionBuilder for ValuesExpression {
    fn build(&self, builder: &mut SQLBuilder) {
        let mut ordinal = 0;

        builder.push_iter(self.rows.iter(), ", ", |builder, row| {
            builder.push('(');
            builder.push_iter(self.columns.iter().zip(row), ", ", |builder, (column, value)| {
                builder.push('?');
                builder.push_binding(Binding {
                    placeholder: Placeholder::Positional,
                    value: value.clone(),
                    declared_type: self.types.type_of(column).map(|ty| ty.to_string()),
                    ordinal,
                });
                ordinal += 1;
            });
            builder.push(')');
        });

        trace!(rows = self.rows.len(), bindings = ordinal, "rendered values");
    }

    fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
