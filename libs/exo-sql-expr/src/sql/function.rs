// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::expression_error::ExpressionError;

use super::{
    condition_expression::Child, ConditionExpression, ConditionKey, ConditionValue, Conditions,
    Conjunction, ExpressionBuilder, ExpressionContext, SQLBuilder, SQLValue,
};

/// The marker values that make a named argument entry pass its key through unbound
const LITERAL_MARKERS: [&str; 2] = ["literal", "identifier"];

/// Placeholder token for bound arguments
const ARGUMENT_TOKEN: &str = "param";

#[derive(Debug)]
pub enum FunctionArg {
    /// Passed through as is (a column name, `*`, a keyword)
    Literal(String),
    Value {
        value: SQLValue,
        declared_type: Option<String>,
    },
    Expression(Box<dyn ExpressionBuilder>),
}

impl FunctionArg {
    pub fn literal(text: impl Into<String>) -> Self {
        FunctionArg::Literal(text.into())
    }

    pub fn value(value: impl Into<SQLValue>) -> Self {
        FunctionArg::Value {
            value: value.into(),
            declared_type: None,
        }
    }

    pub fn typed(value: impl Into<SQLValue>, declared_type: impl Into<String>) -> Self {
        FunctionArg::Value {
            value: value.into(),
            declared_type: Some(declared_type.into()),
        }
    }

    pub fn expression(expression: impl ExpressionBuilder + 'static) -> Self {
        FunctionArg::Expression(Box::new(expression))
    }
}

/// `<name>(<arg>, <arg>, ...)`. Arguments live in a comma-joined [`ConditionExpression`], so they
/// are bound (and array arguments expanded) the same way conditions are.
#[derive(Debug)]
pub struct FunctionExpression {
    name: String,
    args: ConditionExpression,
}

impl FunctionExpression {
    pub fn new(name: impl Into<String>, context: &ExpressionContext) -> Self {
        Self {
            name: name.into(),
            args: ConditionExpression::with_context(context).with_conjunction(Conjunction::Comma),
        }
    }

    pub fn with_args(
        name: impl Into<String>,
        args: impl IntoIterator<Item = FunctionArg>,
        context: &ExpressionContext,
    ) -> Result<Self, ExpressionError> {
        let mut function = Self::new(name, context);
        for arg in args {
            function.add_arg(arg)?;
        }
        Ok(function)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn args(&self) -> &ConditionExpression {
        &self.args
    }

    pub fn add_arg(&mut self, arg: FunctionArg) -> Result<&mut Self, ExpressionError> {
        match arg {
            FunctionArg::Literal(text) => self.args.push_child(Child::Fragment(text)),
            FunctionArg::Value {
                value,
                declared_type,
            } => {
                let placeholder = self.args.placeholder(ARGUMENT_TOKEN);
                let template = placeholder.to_string();
                let ordinal = self
                    .args
                    .bind(placeholder, value, declared_type.as_deref())?;
                self.args.push_child(Child::Condition {
                    template,
                    ordinals: vec![ordinal],
                });
            }
            FunctionArg::Expression(expression) => self.args.push_child(Child::Node(expression)),
        }
        Ok(self)
    }

    /// Add arguments from a description. Positional entries are bound values (or sub-expressions);
    /// a named entry whose value is `"literal"` or `"identifier"` passes its key through.
    pub fn add_entries(&mut self, entries: Conditions) -> Result<&mut Self, ExpressionError> {
        for (key, value) in entries {
            let arg = match (key, value) {
                (ConditionKey::Name(name), ConditionValue::Value(SQLValue::Text(marker)))
                    if LITERAL_MARKERS.contains(&marker.as_str()) =>
                {
                    FunctionArg::Literal(name)
                }
                (ConditionKey::Index(_), ConditionValue::Value(value)) => FunctionArg::value(value),
                (_, ConditionValue::Expression(expression)) => FunctionArg::Expression(expression),
                (key, _) => {
                    return Err(ExpressionError::unexpected(
                        key.to_string(),
                        "function arguments are values, sub-expressions or literal-marked names",
                    ));
                }
            };
            self.add_arg(arg)?;
        }
        Ok(self)
    }
}

impl ExpressionBuilder for FunctionExpression {
    fn build(&self, builder: &mut SQLBuilder) {
        builder.push_str(&self.name);
        builder.push('(');
        self.args
            .build_children(builder, &self.args.conjunction().separator());
        builder.push(')');
    }

    fn is_self_delimited(&self) -> bool {
        true
    }

    fn traverse(&self, visitor: &mut dyn FnMut(&ConditionExpression)) {
        self.args.traverse(visitor)
    }

    fn traverse_mut(&mut self, visitor: &mut dyn FnMut(&mut ConditionExpression)) {
        self.args.traverse_mut(visitor)
    }
}

/// Builders for common SQL functions sharing one context.
#[derive(Debug, Clone)]
pub struct Functions {
    context: ExpressionContext,
}

impl Functions {
    pub fn new(context: &ExpressionContext) -> Self {
        Self {
            context: context.clone(),
        }
    }

    fn call(
        &self,
        name: &str,
        args: impl IntoIterator<Item = FunctionArg>,
    ) -> Result<FunctionExpression, ExpressionError> {
        FunctionExpression::with_args(name, args, &self.context)
    }

    /// `COUNT(*)` for `"*"`, otherwise `COUNT(<column>)`
    pub fn count(&self, column: &str) -> Result<FunctionExpression, ExpressionError> {
        self.call("COUNT", [FunctionArg::literal(column)])
    }

    pub fn sum(&self, column: &str) -> Result<FunctionExpression, ExpressionError> {
        self.call("SUM", [FunctionArg::literal(column)])
    }

    pub fn avg(&self, column: &str) -> Result<FunctionExpression, ExpressionError> {
        self.call("AVG", [FunctionArg::literal(column)])
    }

    pub fn min(&self, column: &str) -> Result<FunctionExpression, ExpressionError> {
        self.call("MIN", [FunctionArg::literal(column)])
    }

    pub fn max(&self, column: &str) -> Result<FunctionExpression, ExpressionError> {
        self.call("MAX", [FunctionArg::literal(column)])
    }

    pub fn concat(
        &self,
        args: impl IntoIterator<Item = FunctionArg>,
    ) -> Result<FunctionExpression, ExpressionError> {
        self.call("CONCAT", args)
    }

    pub fn coalesce(
        &self,
        args: impl IntoIterator<Item = FunctionArg>,
    ) -> Result<FunctionExpression, ExpressionError> {
        self.call("COALESCE", args)
    }

    pub fn now(&self) -> Result<FunctionExpression, ExpressionError> {
        self.call("NOW", std::iter::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::IdentitySource;

    fn context() -> ExpressionContext {
        ExpressionContext::new().with_identities(IdentitySource::new())
    }

    #[test]
    fn literal_and_bound_arguments() {
        let function = FunctionExpression::with_args(
            "CONCAT",
            [
                FunctionArg::literal("first_name"),
                FunctionArg::value(" "),
                FunctionArg::literal("last_name"),
            ],
            &context(),
        )
        .unwrap();

        assert_binding!(
            function.to_sql(),
            "CONCAT(first_name, :c0_0, last_name)",
            " "
        );
    }

    #[test]
    fn no_arguments() {
        let now = Functions::new(&context()).now().unwrap();
        assert_binding!(now.to_sql(), "NOW()");
    }

    #[test]
    fn literal_marker_entries() {
        let mut function = FunctionExpression::new("COALESCE", &context());
        function
            .add_entries(
                Conditions::new()
                    .entry("nickname", SQLValue::from("literal"))
                    .entry(0usize, SQLValue::from("anonymous")),
            )
            .unwrap();

        assert_binding!(
            function.to_sql(),
            "COALESCE(nickname, :c0_0)",
            "anonymous"
        );
    }

    #[test]
    fn unmarked_named_entry_is_rejected() {
        let mut function = FunctionExpression::new("F", &context());
        assert!(function
            .add_entries(Conditions::new().entry("x", SQLValue::from(1)))
            .is_err());
    }

    #[test]
    fn array_argument_is_expanded() {
        let function = FunctionExpression::with_args(
            "GREATEST",
            [FunctionArg::typed(vec![1, 5, 3], "integer[]")],
            &context(),
        )
        .unwrap();

        assert_binding!(function.to_sql(), "GREATEST(:c0_1, :c0_2, :c0_3)", 1, 5, 3);
    }

    #[test]
    fn nested_function_in_condition() {
        let context = context();
        let functions = Functions::new(&context);

        let mut condition = ConditionExpression::with_context(&context);
        condition
            .add(
                Conditions::new()
                    .expression("created_at <", functions.now().unwrap())
                    .expression(
                        "name =",
                        functions
                            .coalesce([FunctionArg::literal("nickname"), FunctionArg::value("x")])
                            .unwrap(),
                    ),
            )
            .unwrap();

        // condition 0_, now 1_, coalesce 2_
        assert_binding!(
            condition.to_sql(),
            "(created_at < NOW() AND name = COALESCE(nickname, :c2_0))",
            "x"
        );

        let mut visited = 0;
        condition.traverse(&mut |_| visited += 1);
        assert_eq!(visited, 3);
    }
}
