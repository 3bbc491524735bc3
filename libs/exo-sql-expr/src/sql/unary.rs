// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use super::{ConditionExpression, ExpressionBuilder, SQLBuilder};

/// `<keyword> (<child>)`. Holds exactly one child.
#[derive(Debug)]
pub struct UnaryExpression {
    keyword: String,
    child: Box<dyn ExpressionBuilder>,
}

impl UnaryExpression {
    pub fn new(keyword: impl Into<String>, child: impl ExpressionBuilder + 'static) -> Self {
        Self {
            keyword: keyword.into(),
            child: Box::new(child),
        }
    }

    pub fn not(child: impl ExpressionBuilder + 'static) -> Self {
        Self::new("NOT", child)
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }
}

impl ExpressionBuilder for UnaryExpression {
    fn build(&self, builder: &mut SQLBuilder) {
        builder.push_str(&self.keyword);
        builder.push_str(" (");
        self.child.build(builder);
        builder.push(')');
    }

    fn is_empty(&self) -> bool {
        self.child.is_empty()
    }

    fn traverse(&self, visitor: &mut dyn FnMut(&ConditionExpression)) {
        self.child.traverse(visitor)
    }

    fn traverse_mut(&mut self, visitor: &mut dyn FnMut(&mut ConditionExpression)) {
        self.child.traverse_mut(visitor)
    }
}
