// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

#[macro_use]
#[cfg(test)]
mod test_util;

pub(crate) mod binding;
mod comparison;
pub(crate) mod condition;
pub(crate) mod condition_expression;
mod context;
mod expression_builder;
mod function;
pub mod order;
mod parameter_binding;
mod raw;
mod sql_builder;
mod sql_value;
mod unary;
mod values;

pub use binding::{element_type, is_array_type, to_array_type, Binding, Placeholder, ARRAY_MARKER};
pub use comparison::ComparisonExpression;
pub use condition::{ConditionInput, ConditionKey, ConditionValue, Conditions};
pub use condition_expression::{ConditionExpression, Conjunction};
pub use context::{ExpressionContext, IdentitySource, TypeMap};
pub use expression_builder::ExpressionBuilder;
pub use function::{FunctionArg, FunctionExpression, Functions};
pub use order::{OrderByExpression, Ordering};
pub use parameter_binding::{NumberedStatement, ParameterBinding};
pub use raw::RawExpression;
pub use sql_builder::SQLBuilder;
pub use sql_value::SQLValue;
pub use unary::UnaryExpression;
pub use values::ValuesExpression;
