// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use super::{Binding, ExpressionBuilder, SQLBuilder};

/// Pre-rendered, trusted SQL along with the bindings for its placeholders (for example, a
/// sub-select assembled elsewhere).
#[derive(Debug, Clone, Default)]
pub struct RawExpression {
    sql: String,
    bindings: Vec<Binding>,
}

impl RawExpression {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            bindings: vec![],
        }
    }

    pub fn with_binding(mut self, binding: Binding) -> Self {
        self.bindings.push(binding);
        self
    }

    pub fn with_bindings(mut self, bindings: impl IntoIterator<Item = Binding>) -> Self {
        self.bindings.extend(bindings);
        self
    }
}

impl ExpressionBuilder for RawExpression {
    fn build(&self, builder: &mut SQLBuilder) {
        builder.push_str(&self.sql);
        builder.push_bindings(&self.bindings);
    }

    fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}
