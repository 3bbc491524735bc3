// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use super::{ConditionExpression, ExpressionBuilder, SQLBuilder};

/// `<field> <operator> <expression>`, produced when a condition entry's value is itself an
/// expression (a sub-select, a function call, ...). Nothing is bound here; the operand's own
/// bindings flow through.
#[derive(Debug)]
pub struct ComparisonExpression {
    field: String,
    operator: String,
    value: Box<dyn ExpressionBuilder>,
}

impl ComparisonExpression {
    pub fn new(
        field: impl Into<String>,
        operator: impl Into<String>,
        value: Box<dyn ExpressionBuilder>,
    ) -> Self {
        Self {
            field: field.into(),
            operator: operator.into(),
            value,
        }
    }
}

impl ExpressionBuilder for ComparisonExpression {
    fn build(&self, builder: &mut SQLBuilder) {
        builder.push_str(&self.field);
        builder.push_space();
        builder.push_str(&self.operator);
        builder.push_space();

        if self.value.is_self_delimited() {
            self.value.build(builder);
        } else {
            builder.push('(');
            self.value.build(builder);
            builder.push(')');
        }
    }

    fn traverse(&self, visitor: &mut dyn FnMut(&ConditionExpression)) {
        self.value.traverse(visitor)
    }

    fn traverse_mut(&mut self, visitor: &mut dyn FnMut(&mut ConditionExpression)) {
        self.value.traverse_mut(visitor)
    }
}
