// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExpressionError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// A binding declared with an array type whose value cannot be iterated
    #[error("Value bound to {placeholder} must be an array (declared type {declared_type})")]
    NotAnArray {
        placeholder: String,
        declared_type: String,
    },

    #[error("Array bound to {0} must have at least one element")]
    EmptyArray(String),

    /// Positional markers cannot be located textually, so they cannot be expanded
    #[error("Array-typed values must be bound to a named placeholder")]
    PositionalArrayBinding,

    #[error("Invalid placeholder '{0}'")]
    InvalidPlaceholder(String),

    #[error("Unexpected value for '{key}': {message}")]
    UnexpectedValue { key: String, message: String },

    #[error("Row columns {found:?} do not match the expected columns {expected:?}")]
    MismatchedColumns {
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// Two nodes whose SQL was merged handed out the same placeholder name
    #[error("Placeholder :{0} is bound to conflicting values")]
    ConflictingBinding(String),

    #[error("Cannot send {value} as a parameter of type {ty}")]
    TypeMismatch { value: String, ty: String },

    #[error("Statement has more positional markers than positional bindings")]
    MissingPositionalBinding,

    #[error("Invalid condition JSON: {0}")]
    InvalidJson(String),

    #[error("{0} {1}")]
    WithContext(String, #[source] Box<ExpressionError>),
}

impl ExpressionError {
    pub fn with_context(self, context: String) -> ExpressionError {
        ExpressionError::WithContext(context, Box::new(self))
    }

    pub(crate) fn unexpected(key: impl Into<String>, message: impl Into<String>) -> Self {
        ExpressionError::UnexpectedValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

pub trait WithContext {
    fn with_context(self, context: String) -> Self;
}

impl<T> WithContext for Result<T, ExpressionError> {
    fn with_context(self, context: String) -> Result<T, ExpressionError> {
        self.map_err(|e| e.with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_is_prepended() {
        let result: Result<(), ExpressionError> = Err(ExpressionError::EmptyArray(":c0_0".into()));
        let err = result
            .with_context("While adding 'id IN':".to_string())
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "While adding 'id IN': Array bound to :c0_0 must have at least one element"
        );
    }
}
