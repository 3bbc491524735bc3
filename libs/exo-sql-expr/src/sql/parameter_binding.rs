// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;

use tokio_postgres::types::ToSql;
use tracing::debug;

use crate::expression_error::ExpressionError;

use super::{binding::is_word_char, Binding, ExpressionBuilder, Placeholder, SQLValue};

/// A rendered statement together with the bindings for its placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterBinding {
    pub stmt: String,
    pub bindings: Vec<Binding>,
}

/// A statement in tokio-postgres form: `$1`, `$2`, ... and the values in parameter order.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberedStatement {
    pub stmt: String,
    pub values: Vec<SQLValue>,
}

impl NumberedStatement {
    pub fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.values
            .iter()
            .map(|value| value as &(dyn ToSql + Sync))
            .collect()
    }
}

impl ParameterBinding {
    pub fn new(stmt: String, bindings: Vec<Binding>) -> Self {
        Self { stmt, bindings }
    }

    pub fn from_expression(expression: &impl ExpressionBuilder) -> Self {
        let (stmt, bindings) = expression.to_sql();
        Self::new(stmt, bindings)
    }

    /// Rewrite placeholders into numbered parameters in the order they appear in the text.
    ///
    /// A name seen again reuses its number. Quoted literals, `::` casts and names without a
    /// binding are left untouched. Each `?` consumes the next positional binding. A name bound to
    /// two different values (nodes from separately scoped identity counters merged into one
    /// statement) is rejected.
    pub fn into_numbered(self) -> Result<NumberedStatement, ExpressionError> {
        let mut named: HashMap<&str, &SQLValue> = HashMap::new();
        let mut positional = vec![];
        for binding in &self.bindings {
            match &binding.placeholder {
                Placeholder::Named(name) => match named.get(name.as_str()) {
                    Some(existing) if **existing != binding.value => {
                        return Err(ExpressionError::ConflictingBinding(name.clone()));
                    }
                    Some(_) => {}
                    None => {
                        named.insert(name.as_str(), &binding.value);
                    }
                },
                Placeholder::Positional => positional.push(&binding.value),
            }
        }
        let mut positional = positional.into_iter();

        let mut stmt = String::with_capacity(self.stmt.len());
        let mut values: Vec<SQLValue> = vec![];
        let mut numbers: HashMap<&str, usize> = HashMap::new();
        let mut in_quote = false;

        let text = self.stmt.as_str();
        let mut chars = text.char_indices().peekable();

        while let Some((index, c)) = chars.next() {
            match c {
                '\'' => {
                    in_quote = !in_quote;
                    stmt.push(c);
                }
                _ if in_quote => stmt.push(c),
                '?' => {
                    let value = positional
                        .next()
                        .ok_or(ExpressionError::MissingPositionalBinding)?;
                    values.push(value.clone());
                    stmt.push_str(&format!("${}", values.len()));
                }
                ':' if chars.peek().is_some_and(|(_, next)| *next == ':') => {
                    stmt.push_str("::");
                    chars.next();
                }
                ':' => {
                    let start = index + 1;
                    let mut end = start;
                    while let Some((next_index, next)) = chars.peek().copied() {
                        if !is_word_char(next) {
                            break;
                        }
                        end = next_index + next.len_utf8();
                        chars.next();
                    }

                    let name = &text[start..end];
                    match named.get(name) {
                        Some(value) => {
                            let number = *numbers.entry(name).or_insert_with(|| {
                                values.push((*value).clone());
                                values.len()
                            });
                            stmt.push_str(&format!("${number}"));
                        }
                        None => {
                            stmt.push(':');
                            stmt.push_str(name);
                        }
                    }
                }
                _ => stmt.push(c),
            }
        }

        debug!(params = values.len(), "numbered statement");

        Ok(NumberedStatement { stmt, values })
    }
}

impl From<(String, Vec<Binding>)> for ParameterBinding {
    fn from((stmt, bindings): (String, Vec<Binding>)) -> Self {
        Self::new(stmt, bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str, value: impl Into<SQLValue>) -> Binding {
        Binding {
            placeholder: Placeholder::Named(name.to_string()),
            value: value.into(),
            declared_type: None,
            ordinal: 0,
        }
    }

    fn positional(value: impl Into<SQLValue>) -> Binding {
        Binding {
            placeholder: Placeholder::Positional,
            value: value.into(),
            declared_type: None,
            ordinal: 0,
        }
    }

    #[test]
    fn named_placeholders_are_numbered() {
        let binding = ParameterBinding::new(
            "a = :c0_0 AND b = :c0_1 OR a2 = :c0_0".to_string(),
            vec![named("c0_0", 1), named("c0_1", "x")],
        );

        let numbered = binding.into_numbered().unwrap();
        assert_eq!(numbered.stmt, "a = $1 AND b = $2 OR a2 = $1");
        assert_eq!(numbered.values, vec![SQLValue::Int(1), SQLValue::from("x")]);
        assert_eq!(numbered.params().len(), 2);
    }

    #[test]
    fn mixed_with_casts_and_quotes() {
        let binding = ParameterBinding::new(
            "x = :c0_0::text AND y = '?:c0_0' AND z IN (?, ?) AND w = :other".to_string(),
            vec![named("c0_0", "v"), positional(1), positional(2)],
        );

        let numbered = binding.into_numbered().unwrap();
        assert_eq!(
            numbered.stmt,
            "x = $1::text AND y = '?:c0_0' AND z IN ($2, $3) AND w = :other"
        );
        assert_eq!(
            numbered.values,
            vec![SQLValue::from("v"), SQLValue::Int(1), SQLValue::Int(2)]
        );
    }

    #[test]
    fn repeated_name_with_same_value() {
        let binding = ParameterBinding::new(
            "a = :c0_0 OR b = :c0_0".to_string(),
            vec![named("c0_0", 1), named("c0_0", 1)],
        );

        let numbered = binding.into_numbered().unwrap();
        assert_eq!(numbered.stmt, "a = $1 OR b = $1");
        assert_eq!(numbered.values, vec![SQLValue::Int(1)]);
    }

    #[test]
    fn repeated_name_with_different_values() {
        let binding = ParameterBinding::new(
            "(id = :c0_0 AND id = :c0_0)".to_string(),
            vec![named("c0_0", 1), named("c0_0", 2)],
        );

        assert!(matches!(
            binding.into_numbered(),
            Err(ExpressionError::ConflictingBinding(name)) if name == "c0_0"
        ));
    }

    #[test]
    fn missing_positional_binding() {
        let binding = ParameterBinding::new("(?, ?)".to_string(), vec![positional(1)]);
        assert!(matches!(
            binding.into_numbered(),
            Err(ExpressionError::MissingPositionalBinding)
        ));
    }
}
