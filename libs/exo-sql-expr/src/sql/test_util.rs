// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

#![cfg(test)]

//! Test assertion to check SQL statements and bindings.

/// Assert that the values of the given bindings match the expected ones.
///
/// # Usage:
/// ```no_run
/// assert_params!(actual_bindings, expected_value1, expected_value2, ...);
/// ```
///
/// Expected values are anything that converts into an `SQLValue`.
macro_rules! assert_params {
    ($actual_params:expr) => {
        assert!($actual_params.is_empty(), "Extra actual parameters: {:?}", $actual_params);
    };
    ($actual_params:expr, $($expected_param:expr),+ $(,)?) => {
        let expected: Vec<$crate::sql::SQLValue> =
            vec![$($crate::sql::SQLValue::from($expected_param)),+];
        let actual: Vec<$crate::sql::SQLValue> =
            $actual_params.iter().map(|binding| binding.value.clone()).collect();
        assert_eq!(actual, expected, "Parameter mismatch");
    };
}

macro_rules! assert_binding {
    ($actual:expr, $expected_stmt:expr) => {
        let (actual_stmt, actual_params) = $actual;
        assert_eq!(actual_stmt, $expected_stmt);
        assert_params!(actual_params);
    };
    ($actual:expr, $expected_stmt:expr, $($rest:expr),+ $(,)?) => {
        let (actual_stmt, actual_params) = $actual;
        assert_eq!(actual_stmt, $expected_stmt);
        assert_params!(actual_params, $($rest),+);
    };
}
