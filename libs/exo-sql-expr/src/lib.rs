// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Compiles declarative descriptions of conditions, function calls, orderings and insertion rows
//! into parameterized SQL plus the values bound to its placeholders.
//!
//! The central type is [ConditionExpression]: a tree of conditions joined by `AND`/`OR`/`XOR`,
//! built from trusted SQL fragments, [Conditions] descriptions (or their JSON form) and other
//! nodes. Each node owns a binding table and names its placeholders with a token unique to the
//! node (drawn from an [IdentitySource]), so nodes can be nested freely. Array values bound for
//! `IN`/`NOT IN` expand into one placeholder per element when rendered.
//!
//! ```text
//! {"title": "Rust", "id IN": [1, 2]}
//!   => (title = :c0_0 AND id IN (:c0_2, :c0_3))   ["Rust", 1, 2]
//! ```
//!
//! Rendering never mutates a node. [ParameterBinding::into_numbered] turns the result into the
//! `$n` form tokio-postgres expects.
#[macro_use]
mod sql;

pub mod config;
pub mod expression_error;

/// Public types at the root level of this crate
pub use config::ExpressionConfig;
pub use expression_error::{ExpressionError, WithContext};
pub use sql::{
    element_type, is_array_type, to_array_type, Binding, ComparisonExpression, ConditionExpression,
    ConditionInput, ConditionKey, ConditionValue, Conditions, Conjunction, ExpressionBuilder,
    ExpressionContext, FunctionArg, FunctionExpression, Functions, IdentitySource,
    NumberedStatement, OrderByExpression, Ordering, ParameterBinding, Placeholder, RawExpression,
    SQLBuilder, SQLValue, TypeMap, UnaryExpression, ValuesExpression, ARRAY_MARKER,
};
