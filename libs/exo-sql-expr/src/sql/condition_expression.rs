// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{collections::HashSet, fmt::Display};

use tracing::debug;

use crate::expression_error::ExpressionError;

use super::{
    binding::{to_array_type, Expansion, ValueBinder},
    Binding, ComparisonExpression, ConditionInput, ConditionKey, ConditionValue, Conditions,
    ExpressionBuilder, ExpressionContext, Placeholder, SQLBuilder, SQLValue, UnaryExpression,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conjunction {
    And,
    Or,
    Xor,
    /// Comma-separated, as used for function arguments
    Comma,
    Custom(String),
}

impl Conjunction {
    /// `and`, `or` and `xor` in any case
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "and" => Some(Conjunction::And),
            "or" => Some(Conjunction::Or),
            "xor" => Some(Conjunction::Xor),
            _ => None,
        }
    }

    pub(crate) fn separator(&self) -> String {
        match self {
            Conjunction::Comma => ", ".to_string(),
            other => format!(" {other} "),
        }
    }
}

impl Display for Conjunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Conjunction::And => write!(f, "AND"),
            Conjunction::Or => write!(f, "OR"),
            Conjunction::Xor => write!(f, "XOR"),
            Conjunction::Comma => write!(f, ","),
            Conjunction::Custom(conjunction) => write!(f, "{}", conjunction.to_uppercase()),
        }
    }
}

#[derive(Debug)]
pub(crate) enum Child {
    /// Trusted SQL, passed through verbatim (may mention manually bound placeholders)
    Fragment(String),
    /// A parsed condition; `ordinals` are the bindings its placeholders refer to
    Condition { template: String, ordinals: Vec<usize> },
    Node(Box<dyn ExpressionBuilder>),
}

impl Child {
    fn is_empty(&self) -> bool {
        match self {
            Child::Fragment(fragment) => fragment.is_empty(),
            Child::Condition { template, .. } => template.is_empty(),
            Child::Node(node) => node.is_empty(),
        }
    }
}

/// A node of the condition tree: an ordered list of children joined by a conjunction.
///
/// ```text
/// {"title": "Rust", "or": {"id": 1, "id >": 10}}
///   => (title = :c0_0 AND (id = :c1_0 OR id > :c1_1))
/// ```
///
/// A node with a single (non-empty) child renders without parentheses.
#[derive(Debug)]
pub struct ConditionExpression {
    conjunction: Conjunction,
    children: Vec<Child>,
    binder: ValueBinder,
    context: ExpressionContext,
}

impl Default for ConditionExpression {
    fn default() -> Self {
        Self::new()
    }
}

impl ConditionExpression {
    /// An empty `AND` node drawing identities from the process-wide counter
    pub fn new() -> Self {
        Self::with_context(&ExpressionContext::default())
    }

    pub fn with_context(context: &ExpressionContext) -> Self {
        Self {
            conjunction: Conjunction::And,
            children: vec![],
            binder: ValueBinder::new(
                &context.config().placeholder_prefix,
                context.next_identity(),
            ),
            context: context.clone(),
        }
    }

    /// Build a node from a fragment, a description, or another node
    pub fn from_input(
        input: impl Into<ConditionInput>,
        context: &ExpressionContext,
    ) -> Result<Self, ExpressionError> {
        let mut expression = Self::with_context(context);
        expression.add(input)?;
        Ok(expression)
    }

    pub fn with_conjunction(mut self, conjunction: Conjunction) -> Self {
        self.conjunction = conjunction;
        self
    }

    pub fn set_conjunction(&mut self, conjunction: Conjunction) {
        self.conjunction = conjunction;
    }

    pub fn conjunction(&self) -> &Conjunction {
        &self.conjunction
    }

    pub fn context(&self) -> &ExpressionContext {
        &self.context
    }

    /// The token that namespaces this node's generated placeholders
    pub fn identity(&self) -> &str {
        self.binder.identity()
    }

    /// Number of children (empty ones included)
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// This node's own binding table, as recorded (array bindings not expanded)
    pub fn own_bindings(&self) -> &[Binding] {
        self.binder.bindings()
    }

    /// Mutable access to the own binding table, e.g. to rewrite values from a
    /// [`traverse_mut`](ExpressionBuilder::traverse_mut) visitor.
    ///
    /// Values written here skip the checks [`bind`](Self::bind) makes. An array binding emptied
    /// this way renders `IN ()`, so call [`validate`](Self::validate) after rewriting.
    pub fn own_bindings_mut(&mut self) -> &mut [Binding] {
        self.binder.bindings_mut()
    }

    /// Check the array-typed bindings of this node and every node nested in it.
    pub fn validate(&self) -> Result<(), ExpressionError> {
        let mut result = Ok(());
        self.traverse(&mut |node| {
            if result.is_ok() {
                result = node.binder.validate();
            }
        });
        result
    }

    pub fn is_array_expansion_pending(&self) -> bool {
        self.binder.is_array_expansion_pending()
    }

    /// Append conditions.
    ///
    /// Strings are trusted SQL and appended verbatim. Descriptions are interpreted entry by
    /// entry (see [`Conditions`]). Nodes are nested as is unless they are empty.
    pub fn add(&mut self, input: impl Into<ConditionInput>) -> Result<&mut Self, ExpressionError> {
        match input.into() {
            ConditionInput::Fragment(fragment) => {
                if !fragment.is_empty() {
                    self.children.push(Child::Fragment(fragment));
                }
            }
            ConditionInput::Conditions(conditions) => {
                for (key, value) in conditions {
                    self.add_entry(key, value)?;
                }
            }
            ConditionInput::Expression(expression) => {
                if !expression.is_empty() {
                    self.children.push(Child::Node(expression));
                }
            }
        }
        Ok(self)
    }

    fn add_entry(&mut self, key: ConditionKey, value: ConditionValue) -> Result<(), ExpressionError> {
        match key {
            ConditionKey::Index(_) if value.is_empty() => Ok(()),
            ConditionKey::Index(index) => match value {
                ConditionValue::Value(SQLValue::Text(fragment)) => {
                    self.children.push(Child::Fragment(fragment));
                    Ok(())
                }
                ConditionValue::Value(other) => Err(ExpressionError::unexpected(
                    index.to_string(),
                    format!(
                        "positional entries must be SQL fragments or groups, got {}",
                        other.kind()
                    ),
                )),
                ConditionValue::Group(conditions) => {
                    self.add_group(Conjunction::And, ConditionInput::Conditions(conditions))
                }
                ConditionValue::Expression(expression) => {
                    self.children.push(Child::Node(expression));
                    Ok(())
                }
            },
            ConditionKey::Name(name) => {
                if let Some(conjunction) = Conjunction::from_keyword(&name) {
                    let key = ConditionKey::Name(name);
                    self.add_group(conjunction, ConditionInput::from_value(&key, value)?)
                } else if name.eq_ignore_ascii_case("not") {
                    let key = ConditionKey::Name(name);
                    let inner =
                        Self::from_input(ConditionInput::from_value(&key, value)?, &self.context)?;
                    if !inner.is_empty() {
                        self.children
                            .push(Child::Node(Box::new(UnaryExpression::not(inner))));
                    }
                    Ok(())
                } else {
                    self.add_condition(&name, value)
                }
            }
        }
    }

    fn add_group(
        &mut self,
        conjunction: Conjunction,
        input: ConditionInput,
    ) -> Result<(), ExpressionError> {
        let group = Self::from_input(input, &self.context)?.with_conjunction(conjunction);
        if !group.is_empty() {
            self.children.push(Child::Node(Box::new(group)));
        }
        Ok(())
    }

    /// Parse a `"field [operator]"` entry
    fn add_condition(&mut self, key: &str, value: ConditionValue) -> Result<(), ExpressionError> {
        let (field, operator) = split_condition_key(key);
        let is_list = matches!(operator.to_lowercase().as_str(), "in" | "not in");

        debug!(field, operator, is_list, "parsed condition key");

        match value {
            ConditionValue::Value(value) => {
                let declared_type = self.context.types().type_of(field);
                let declared_type = if is_list {
                    Some(to_array_type(declared_type))
                } else {
                    declared_type.map(|ty| ty.to_string())
                };

                let placeholder = self.binder.placeholder(field);
                let template = if is_list {
                    format!("{field} {operator} ({placeholder})")
                } else {
                    format!("{field} {operator} {placeholder}")
                };
                let ordinal = self.binder.bind(placeholder, value, declared_type)?;

                self.children.push(Child::Condition {
                    template,
                    ordinals: vec![ordinal],
                });
                Ok(())
            }
            ConditionValue::Expression(expression) => {
                self.children.push(Child::Node(Box::new(ComparisonExpression::new(
                    field, operator, expression,
                ))));
                Ok(())
            }
            ConditionValue::Group(_) => Err(ExpressionError::unexpected(
                key,
                "a field cannot be compared with a group of conditions",
            )),
        }
    }

    /// A placeholder for `token` in this node's namespace. Numeric tokens give positional markers.
    pub fn placeholder(&mut self, token: &str) -> Placeholder {
        self.binder.placeholder(token)
    }

    /// Bind a value to a placeholder (typically one mentioned in a trusted fragment) and return
    /// its ordinal. Array-typed values must use a named placeholder.
    ///
    /// Such bindings are not tied to a child, so [`bindings`](ExpressionBuilder::bindings) lists
    /// them after the bindings of all children, even when the fragment sits between parsed
    /// conditions. Hand named placeholders to the executor by name (or through
    /// [`ParameterBinding::into_numbered`](super::ParameterBinding::into_numbered)) rather than
    /// by position.
    pub fn bind(
        &mut self,
        placeholder: Placeholder,
        value: impl Into<SQLValue>,
        declared_type: Option<&str>,
    ) -> Result<usize, ExpressionError> {
        self.binder
            .bind(placeholder, value.into(), declared_type.map(|ty| ty.to_string()))
    }

    fn add_comparison(
        &mut self,
        field: &str,
        operator: &str,
        value: impl Into<SQLValue>,
    ) -> Result<&mut Self, ExpressionError> {
        self.add(Conditions::new().field(&format!("{field} {operator}"), value))
    }

    pub fn eq(
        &mut self,
        field: &str,
        value: impl Into<SQLValue>,
    ) -> Result<&mut Self, ExpressionError> {
        self.add_comparison(field, "=", value)
    }

    pub fn not_eq(
        &mut self,
        field: &str,
        value: impl Into<SQLValue>,
    ) -> Result<&mut Self, ExpressionError> {
        self.add_comparison(field, "!=", value)
    }

    pub fn gt(
        &mut self,
        field: &str,
        value: impl Into<SQLValue>,
    ) -> Result<&mut Self, ExpressionError> {
        self.add_comparison(field, ">", value)
    }

    pub fn gte(
        &mut self,
        field: &str,
        value: impl Into<SQLValue>,
    ) -> Result<&mut Self, ExpressionError> {
        self.add_comparison(field, ">=", value)
    }

    pub fn lt(
        &mut self,
        field: &str,
        value: impl Into<SQLValue>,
    ) -> Result<&mut Self, ExpressionError> {
        self.add_comparison(field, "<", value)
    }

    pub fn lte(
        &mut self,
        field: &str,
        value: impl Into<SQLValue>,
    ) -> Result<&mut Self, ExpressionError> {
        self.add_comparison(field, "<=", value)
    }

    pub fn like(
        &mut self,
        field: &str,
        value: impl Into<SQLValue>,
    ) -> Result<&mut Self, ExpressionError> {
        self.add_comparison(field, "LIKE", value)
    }

    pub fn not_like(
        &mut self,
        field: &str,
        value: impl Into<SQLValue>,
    ) -> Result<&mut Self, ExpressionError> {
        self.add_comparison(field, "NOT LIKE", value)
    }

    pub fn in_list<T: Into<SQLValue>>(
        &mut self,
        field: &str,
        values: impl IntoIterator<Item = T>,
    ) -> Result<&mut Self, ExpressionError> {
        let values: Vec<SQLValue> = values.into_iter().map(Into::into).collect();
        self.add_comparison(field, "IN", values)
    }

    pub fn not_in<T: Into<SQLValue>>(
        &mut self,
        field: &str,
        values: impl IntoIterator<Item = T>,
    ) -> Result<&mut Self, ExpressionError> {
        let values: Vec<SQLValue> = values.into_iter().map(Into::into).collect();
        self.add_comparison(field, "NOT IN", values)
    }

    pub fn is_null(&mut self, field: &str) -> Result<&mut Self, ExpressionError> {
        self.add(format!("{field} IS NULL"))
    }

    pub fn is_not_null(&mut self, field: &str) -> Result<&mut Self, ExpressionError> {
        self.add(format!("{field} IS NOT NULL"))
    }

    /// Render the children joined by `separator`, with this node's bindings resolved. Returns the
    /// number of children rendered.
    pub(crate) fn build_children(&self, builder: &mut SQLBuilder, separator: &str) -> usize {
        let expansion = self.binder.expand();
        let children: Vec<&Child> = self.children.iter().filter(|c| !c.is_empty()).collect();

        let mut emitted = HashSet::new();

        builder.push_iter(children.iter(), separator, |builder, child| match child {
            Child::Fragment(fragment) => builder.push_str(expansion.rewrite(fragment)),
            Child::Condition { template, ordinals } => {
                builder.push_str(expansion.rewrite(template));
                for ordinal in ordinals {
                    builder.push_bindings(expansion.bindings_for(*ordinal));
                }
            }
            Child::Node(node) => node.build(builder),
        });

        for child in &children {
            if let Child::Condition { ordinals, .. } = child {
                emitted.extend(ordinals.iter().copied());
            }
        }
        Self::push_unreferenced(builder, &expansion, &emitted);

        children.len()
    }

    /// Bindings added through [`bind`](Self::bind) aren't tied to a child, so they follow the
    /// children in ordinal order
    fn push_unreferenced(builder: &mut SQLBuilder, expansion: &Expansion, emitted: &HashSet<usize>) {
        for ordinal in (0..expansion.len()).filter(|ordinal| !emitted.contains(ordinal)) {
            builder.push_bindings(expansion.bindings_for(ordinal));
        }
    }

    pub(crate) fn push_child(&mut self, child: Child) {
        if !child.is_empty() {
            self.children.push(child);
        }
    }

    fn rendered_child_count(&self) -> usize {
        self.children.iter().filter(|c| !c.is_empty()).count()
    }
}

/// Split `"field operator"` at the first whitespace. Without an operator, `=` is assumed.
pub(crate) fn split_condition_key(key: &str) -> (&str, &str) {
    let key = key.trim();
    match key.split_once(char::is_whitespace) {
        Some((field, operator)) if !operator.trim().is_empty() => (field, operator.trim()),
        _ => (key, "="),
    }
}

impl ExpressionBuilder for ConditionExpression {
    fn build(&self, builder: &mut SQLBuilder) {
        let wrap = self.rendered_child_count() > 1;
        if wrap {
            builder.push('(');
        }
        self.build_children(builder, &self.conjunction.separator());
        if wrap {
            builder.push(')');
        }
    }

    fn is_empty(&self) -> bool {
        self.rendered_child_count() == 0
    }

    fn is_self_delimited(&self) -> bool {
        self.rendered_child_count() > 1
    }

    fn traverse(&self, visitor: &mut dyn FnMut(&ConditionExpression)) {
        for child in &self.children {
            if let Child::Node(node) = child {
                node.traverse(visitor);
            }
        }
        visitor(self);
    }

    fn traverse_mut(&mut self, visitor: &mut dyn FnMut(&mut ConditionExpression)) {
        for child in &mut self.children {
            if let Child::Node(node) = child {
                node.traverse_mut(visitor);
            }
        }
        visitor(self);
    }
}
