// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use anyhow::Result;
use exo_sql_expr::{
    ConditionExpression, Conditions, ExpressionBuilder, ExpressionConfig, ExpressionContext,
    ExpressionError, FunctionArg, Functions, IdentitySource, OrderByExpression, ParameterBinding,
    SQLValue, TypeMap, ValuesExpression,
};
use serde_json::json;

/// A context with its own identity counter, so placeholder names are predictable
fn scoped() -> ExpressionContext {
    ExpressionContext::new().with_identities(IdentitySource::new())
}

fn values(expression: &impl ExpressionBuilder) -> Vec<SQLValue> {
    expression
        .bindings()
        .into_iter()
        .map(|binding| binding.value)
        .collect()
}

#[test_log::test]
fn nested_boolean_composition() -> Result<()> {
    let context = scoped();
    let conditions = Conditions::from_json(&json!({"or": {"a": 1, "b": 2}}))?;
    let expression = ConditionExpression::from_input(conditions, &context)?;

    assert_eq!(expression.sql(), "(a = :c1_0 OR b = :c1_1)");
    assert_eq!(values(&expression), vec![SQLValue::Int(1), SQLValue::Int(2)]);
    Ok(())
}

#[test_log::test]
fn in_list_expansion() -> Result<()> {
    let context = scoped();
    let conditions = Conditions::from_json(&json!({"id IN": [1, 2, 3]}))?;
    let expression = ConditionExpression::from_input(conditions, &context)?;

    let (sql, bindings) = expression.to_sql();
    assert_eq!(sql, "id IN (:c0_1, :c0_2, :c0_3)");
    assert_eq!(
        bindings.iter().map(|b| b.value.clone()).collect::<Vec<_>>(),
        vec![SQLValue::Int(1), SQLValue::Int(2), SQLValue::Int(3)]
    );
    assert!(bindings.iter().all(|b| !b.is_array()));
    Ok(())
}

#[test_log::test]
fn empty_in_list_is_rejected() -> Result<()> {
    let context = scoped();
    let conditions = Conditions::from_json(&json!({"id IN": []}))?;

    assert!(matches!(
        ConditionExpression::from_input(conditions, &context),
        Err(ExpressionError::EmptyArray(_))
    ));
    Ok(())
}

#[test_log::test]
fn numbered_statement() -> Result<()> {
    let context = scoped().with_types(TypeMap::from([("author_id", "integer")]));
    let conditions = Conditions::from_json(&json!({
        "title": "Rust",
        "author_id IN": [3, 4],
        "or": {"year >": 2000, "0": "draft IS FALSE"}
    }))?;
    let expression = ConditionExpression::from_input(conditions, &context)?;

    assert_eq!(
        expression.sql(),
        "(title = :c0_0 AND author_id IN (:c0_2, :c0_3) AND (year > :c1_0 OR draft IS FALSE))"
    );

    let numbered = ParameterBinding::from_expression(&expression).into_numbered()?;
    assert_eq!(
        numbered.stmt,
        "(title = $1 AND author_id IN ($2, $3) AND (year > $4 OR draft IS FALSE))"
    );
    assert_eq!(
        numbered.values,
        vec![
            SQLValue::from("Rust"),
            SQLValue::Int(3),
            SQLValue::Int(4),
            SQLValue::Int(2000)
        ]
    );
    assert_eq!(numbered.params().len(), 4);
    Ok(())
}

#[test_log::test]
fn traverse_deep_tree() -> Result<()> {
    let context = scoped();
    let conditions = Conditions::from_json(&json!({
        "a": 1,
        "or": {"b": 2, "and": {"c": 3, "not": {"d": 4}}}
    }))?;
    let mut expression = ConditionExpression::from_input(conditions, &context)?;

    let mut visited = 0;
    expression.traverse(&mut |_| visited += 1);
    assert_eq!(visited, 4);

    expression.traverse_mut(&mut |node| {
        for binding in node.own_bindings_mut() {
            binding.value = SQLValue::Null;
        }
    });
    assert!(values(&expression).iter().all(|v| *v == SQLValue::Null));
    assert_eq!(
        expression.sql(),
        "(a = :c0_0 AND (b = :c1_0 OR (c = :c2_0 AND NOT (d = :c3_0))))"
    );
    Ok(())
}

#[test_log::test]
fn functions_inside_conditions() -> Result<()> {
    let context = scoped();
    let functions = Functions::new(&context);

    let mut expression = ConditionExpression::with_context(&context);
    expression
        .add(Conditions::new().expression(
            "LOWER(name) =",
            functions.coalesce([FunctionArg::literal("nickname"), FunctionArg::value("ann")])?,
        ))?
        .gt("age", 30)?;

    assert_eq!(
        expression.sql(),
        "(LOWER(name) = COALESCE(nickname, :c1_0) AND age > :c0_0)"
    );
    assert_eq!(values(&expression), vec![SQLValue::from("ann"), SQLValue::Int(30)]);
    Ok(())
}

#[test_log::test]
fn order_clause_passthrough() -> Result<()> {
    let order_by = OrderByExpression::from_conditions(Conditions::from_json(&json!({
        "title": "ASC",
        "id": "DESC"
    }))?)?;

    assert_eq!(order_by.sql(), "ORDER BY title ASC, id DESC");
    assert!(order_by.bindings().is_empty());
    Ok(())
}

#[test_log::test]
fn values_rows() -> Result<()> {
    let mut rows = ValuesExpression::default();
    rows.add_json(&json!({"name": "a", "age": 1}))?
        .add_json(&json!({"name": "b", "age": 2}))?;

    assert_eq!(rows.sql(), "(?, ?), (?, ?)");
    assert_eq!(
        values(&rows),
        vec![
            SQLValue::from("a"),
            SQLValue::Int(1),
            SQLValue::from("b"),
            SQLValue::Int(2)
        ]
    );

    let numbered = ParameterBinding::from_expression(&rows).into_numbered()?;
    assert_eq!(numbered.stmt, "($1, $2), ($3, $4)");
    Ok(())
}

#[test_log::test]
fn configured_prefix() -> Result<()> {
    let context = scoped().with_config(ExpressionConfig::new("p")?)?;
    let mut expression = ConditionExpression::with_context(&context);
    expression.eq("id", 1)?;

    assert_eq!(expression.sql(), "id = :p0_0");
    Ok(())
}

#[test_log::test]
fn shared_identities_never_collide() -> Result<()> {
    let identities = IdentitySource::new();
    let first = ExpressionContext::new().with_identities(identities.clone());
    let second = ExpressionContext::new().with_identities(identities);

    let mut a = ConditionExpression::with_context(&first);
    a.eq("id", 1)?;
    let mut b = ConditionExpression::with_context(&second);
    b.eq("id", 2)?;

    let mut outer = ConditionExpression::with_context(&first);
    outer.add(a)?.add(b)?;

    assert_eq!(outer.sql(), "(id = :c0_0 AND id = :c1_0)");
    assert_eq!(values(&outer), vec![SQLValue::Int(1), SQLValue::Int(2)]);
    Ok(())
}

#[test_log::test]
fn default_contexts_never_collide() -> Result<()> {
    let mut a = ConditionExpression::with_context(&ExpressionContext::new());
    a.eq("id", 1)?;
    let mut b = ConditionExpression::with_context(&ExpressionContext::default());
    b.eq("id", 2)?;
    assert_ne!(a.identity(), b.identity());

    let mut outer = ConditionExpression::new();
    outer.add(a)?.add(b)?;

    let numbered = ParameterBinding::from_expression(&outer).into_numbered()?;
    assert_eq!(numbered.stmt, "(id = $1 AND id = $2)");
    assert_eq!(numbered.values, vec![SQLValue::Int(1), SQLValue::Int(2)]);
    Ok(())
}

#[test_log::test]
fn colliding_scoped_counters_are_reported() -> Result<()> {
    let mut a = ConditionExpression::with_context(&scoped());
    a.eq("id", 1)?;
    let mut b = ConditionExpression::with_context(&scoped());
    b.eq("id", 2)?;

    let mut outer = ConditionExpression::with_context(&scoped());
    outer.add(a)?.add(b)?;
    assert_eq!(outer.sql(), "(id = :c0_0 AND id = :c0_0)");

    assert!(matches!(
        ParameterBinding::from_expression(&outer).into_numbered(),
        Err(ExpressionError::ConflictingBinding(name)) if name == "c0_0"
    ));
    Ok(())
}
