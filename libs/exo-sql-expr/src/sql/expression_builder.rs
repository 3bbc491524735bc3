// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::Debug;

use super::{Binding, ConditionExpression, SQLBuilder};

/// A trait for types that can build themselves into an SQL expression.
///
/// Each constituent of an expression tree (conditions, function calls, order clauses, values, etc.)
/// implements this trait, which can then be used to hierarchically build an SQL string and the
/// list of bindings to be supplied to it.
///
/// Building never mutates the node, so rendering the same node repeatedly gives the same result.
pub trait ExpressionBuilder: Debug {
    /// Build the SQL expression into the given SQL builder
    fn build(&self, builder: &mut SQLBuilder);

    /// Build the SQL expression into a string and its bindings.
    fn to_sql(&self) -> (String, Vec<Binding>) {
        let mut builder = SQLBuilder::new();
        self.build(&mut builder);
        builder.into_sql()
    }

    fn sql(&self) -> String {
        self.to_sql().0
    }

    /// The bindings for the placeholders in [`sql`](ExpressionBuilder::sql), in order of first
    /// appearance. Values bound by hand to placeholders in trusted fragments come after the
    /// bindings of the node's children (see [`ConditionExpression::bind`]).
    fn bindings(&self) -> Vec<Binding> {
        self.to_sql().1
    }

    /// Whether this expression renders to nothing. Empty expressions are skipped when joined
    /// into a parent condition.
    fn is_empty(&self) -> bool {
        false
    }

    /// Whether the rendered form is already delimited (a function call, a parenthesized group),
    /// so it needs no extra parentheses when used as a comparison operand.
    fn is_self_delimited(&self) -> bool {
        false
    }

    /// Visit every [`ConditionExpression`] in this tree, children before parents.
    fn traverse(&self, _visitor: &mut dyn FnMut(&ConditionExpression)) {}

    /// Like [`traverse`](ExpressionBuilder::traverse), but allows rewriting each node.
    fn traverse_mut(&mut self, _visitor: &mut dyn FnMut(&mut ConditionExpression)) {}
}

impl<T> ExpressionBuilder for Box<T>
where
    T: ExpressionBuilder + ?Sized,
{
    fn build(&self, builder: &mut SQLBuilder) {
        self.as_ref().build(builder)
    }

    fn is_empty(&self) -> bool {
        self.as_ref().is_empty()
    }

    fn is_self_delimited(&self) -> bool {
        self.as_ref().is_self_delimited()
    }

    fn traverse(&self, visitor: &mut dyn FnMut(&ConditionExpression)) {
        self.as_ref().traverse(visitor)
    }

    fn traverse_mut(&mut self, visitor: &mut dyn FnMut(&mut ConditionExpression)) {
        self.as_mut().traverse_mut(visitor)
    }
}
