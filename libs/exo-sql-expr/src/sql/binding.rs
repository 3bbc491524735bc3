// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{borrow::Cow, fmt::Display};

use tracing::{debug, trace};

use crate::expression_error::ExpressionError;

use super::SQLValue;

/// Suffix of a declared type whose bindings expand into one placeholder per element
pub const ARRAY_MARKER: &str = "[]";

pub fn is_array_type(declared_type: &str) -> bool {
    declared_type.ends_with(ARRAY_MARKER)
}

/// `integer` -> `integer[]`. Types that already carry the marker are returned unchanged.
pub fn to_array_type(declared_type: Option<&str>) -> String {
    match declared_type {
        Some(ty) if is_array_type(ty) => ty.to_string(),
        Some(ty) => format!("{ty}{ARRAY_MARKER}"),
        None => ARRAY_MARKER.to_string(),
    }
}

/// `integer[]` -> `integer`. A bare marker has no element type.
pub fn element_type(declared_type: &str) -> Option<String> {
    let element = declared_type
        .strip_suffix(ARRAY_MARKER)
        .unwrap_or(declared_type);
    (!element.is_empty()).then(|| element.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// Rendered as `?`; resolved by position
    Positional,
    /// Rendered as `:name`
    Named(String),
}

impl Placeholder {
    /// Parse `?` or `:name` (the leading colon is optional).
    pub fn parse(text: &str) -> Result<Self, ExpressionError> {
        if text == "?" {
            return Ok(Placeholder::Positional);
        }
        let name = text.strip_prefix(':').unwrap_or(text);
        if !name.is_empty() && name.chars().all(is_word_char) {
            Ok(Placeholder::Named(name.to_string()))
        } else {
            Err(ExpressionError::InvalidPlaceholder(text.to_string()))
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Placeholder::Positional => None,
            Placeholder::Named(name) => Some(name),
        }
    }
}

impl Display for Placeholder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Placeholder::Positional => write!(f, "?"),
            Placeholder::Named(name) => write!(f, ":{name}"),
        }
    }
}

pub(crate) fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// A value bound to a placeholder, with an optional declared type for the executor.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub placeholder: Placeholder,
    pub value: SQLValue,
    pub declared_type: Option<String>,
    /// Position in the binding table of the node that created it
    pub ordinal: usize,
}

impl Binding {
    pub fn is_array(&self) -> bool {
        self.declared_type.as_deref().is_some_and(is_array_type)
    }
}

/// The binding table owned by a single expression node.
///
/// Generated placeholder names are `<prefix><identity><n>`, where `identity` is unique to the node
/// and `n` is the node's placeholder counter, so nested nodes that bind the same field never
/// collide.
#[derive(Debug, Clone)]
pub struct ValueBinder {
    prefix: String,
    identity: String,
    placeholder_count: usize,
    bindings: Vec<Binding>,
    array_expansion_pending: bool,
}

impl ValueBinder {
    pub(crate) fn new(prefix: &str, identity: String) -> Self {
        Self {
            prefix: prefix.to_string(),
            identity,
            placeholder_count: 0,
            bindings: Vec::new(),
            array_expansion_pending: false,
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn is_array_expansion_pending(&self) -> bool {
        self.array_expansion_pending
    }

    /// A placeholder for `token`: positional if the token is purely numeric, otherwise a fresh
    /// generated name.
    pub fn placeholder(&mut self, token: &str) -> Placeholder {
        if !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()) {
            Placeholder::Positional
        } else {
            let placeholder = self.named_placeholder(self.placeholder_count);
            self.placeholder_count += 1;
            placeholder
        }
    }

    fn named_placeholder(&self, index: usize) -> Placeholder {
        Placeholder::Named(format!("{}{}{index}", self.prefix, self.identity))
    }

    /// Record a binding and return its ordinal.
    pub fn bind(
        &mut self,
        placeholder: Placeholder,
        value: SQLValue,
        declared_type: Option<String>,
    ) -> Result<usize, ExpressionError> {
        if let Some(ty) = declared_type.as_deref().filter(|ty| is_array_type(ty)) {
            if placeholder == Placeholder::Positional {
                return Err(ExpressionError::PositionalArrayBinding);
            }
            match value.as_array() {
                None => {
                    return Err(ExpressionError::NotAnArray {
                        placeholder: placeholder.to_string(),
                        declared_type: ty.to_string(),
                    });
                }
                Some([]) => return Err(ExpressionError::EmptyArray(placeholder.to_string())),
                Some(_) => self.array_expansion_pending = true,
            }
        }

        let ordinal = self.bindings.len();
        trace!(%placeholder, %value, ?declared_type, ordinal, "bind");

        self.bindings.push(Binding {
            placeholder,
            value,
            declared_type,
            ordinal,
        });

        Ok(ordinal)
    }

    /// Re-check array-typed bindings, e.g. after their values were rewritten in place.
    pub(crate) fn validate(&self) -> Result<(), ExpressionError> {
        for binding in self.bindings.iter().filter(|b| b.is_array()) {
            match binding.value.as_array() {
                None => {
                    return Err(ExpressionError::NotAnArray {
                        placeholder: binding.placeholder.to_string(),
                        declared_type: binding.declared_type.clone().unwrap_or_default(),
                    });
                }
                Some([]) => {
                    return Err(ExpressionError::EmptyArray(binding.placeholder.to_string()));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    pub(crate) fn bindings_mut(&mut self) -> &mut [Binding] {
        &mut self.bindings
    }

    /// Resolve array bindings for rendering without touching the table.
    ///
    /// Element placeholders continue from the current placeholder counter, so a render never
    /// reuses a name already handed out, and rendering the same table twice gives the same names.
    pub(crate) fn expand(&self) -> Expansion {
        if !self.array_expansion_pending && !self.bindings.iter().any(Binding::is_array) {
            return Expansion {
                resolved: self.bindings.iter().map(|b| vec![b.clone()]).collect(),
                replacements: vec![],
            };
        }

        let mut next_placeholder = self.placeholder_count;
        let mut next_ordinal = 0;
        let mut resolved = Vec::with_capacity(self.bindings.len());
        let mut replacements = vec![];

        for binding in &self.bindings {
            match (binding.is_array(), binding.value.as_array()) {
                (true, Some(elems)) => {
                    let declared_type = binding.declared_type.as_deref().and_then(element_type);
                    let expanded: Vec<Binding> = elems
                        .iter()
                        .map(|elem| {
                            let placeholder = self.named_placeholder(next_placeholder);
                            next_placeholder += 1;
                            let ordinal = next_ordinal;
                            next_ordinal += 1;
                            Binding {
                                placeholder,
                                value: elem.clone(),
                                declared_type: declared_type.clone(),
                                ordinal,
                            }
                        })
                        .collect();

                    let joined = expanded
                        .iter()
                        .map(|b| b.placeholder.to_string())
                        .collect::<Vec<_>>()
                        .join(", ");
                    debug!(placeholder = %binding.placeholder, expanded = %joined, "expanding array binding");

                    replacements.push((binding.placeholder.to_string(), joined));
                    resolved.push(expanded);
                }
                _ => {
                    let mut binding = binding.clone();
                    binding.ordinal = next_ordinal;
                    next_ordinal += 1;
                    resolved.push(vec![binding]);
                }
            }
        }

        Expansion {
            resolved,
            replacements,
        }
    }
}

/// The render-time view of a [`ValueBinder`] with array bindings resolved.
#[derive(Debug)]
pub(crate) struct Expansion {
    /// Indexed by the ordinal in the binding table
    resolved: Vec<Vec<Binding>>,
    /// Array placeholder text and its comma-joined replacement
    replacements: Vec<(String, String)>,
}

impl Expansion {
    pub(crate) fn bindings_for(&self, ordinal: usize) -> &[Binding] {
        self.resolved
            .get(ordinal)
            .map(|bindings| bindings.as_slice())
            .unwrap_or_default()
    }

    pub(crate) fn len(&self) -> usize {
        self.resolved.len()
    }

    pub(crate) fn rewrite<'a>(&self, text: &'a str) -> Cow<'a, str> {
        self.replacements
            .iter()
            .fold(Cow::Borrowed(text), |text, (placeholder, replacement)| {
                match replace_placeholder(&text, placeholder, replacement) {
                    Some(replaced) => Cow::Owned(replaced),
                    None => text,
                }
            })
    }
}

/// Replace whole-token occurrences of `placeholder` (so `:c1_1` leaves `:c1_10` alone). Returns
/// `None` when nothing matched.
fn replace_placeholder(text: &str, placeholder: &str, replacement: &str) -> Option<String> {
    let mut result = String::with_capacity(text.len());
    let mut last = 0;
    let mut replaced = false;

    for (start, matched) in text.match_indices(placeholder) {
        let end = start + matched.len();
        if start < last || text[end..].chars().next().is_some_and(is_word_char) {
            continue;
        }
        result.push_str(&text[last..start]);
        result.push_str(replacement);
        last = end;
        replaced = true;
    }

    replaced.then(|| {
        result.push_str(&text[last..]);
        result
    })
}
