// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `when` predicate algebra.
//!
//! A small AST the DSL layer produces (via `Deserialize`) and the engine
//! interprets against a [`Facts`] context. No macro expansion, no
//! expression-string parsing in the core: by the time a `Predicate`
//! reaches here it is already a typed tree.

use serde::{Deserialize, Serialize};

use crate::facts::FactValue;

/// A literal value usable on either side of a comparison.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Literal {
    fn partial_cmp_value(&self, other: &FactValue) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Literal::Bool(a), FactValue::Bool(b)) => a.partial_cmp(b),
            (Literal::Int(a), FactValue::Int(b)) => a.partial_cmp(b),
            (Literal::Int(a), FactValue::Float(b)) => (*a as f64).partial_cmp(b),
            (Literal::Float(a), FactValue::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Literal::Float(a), FactValue::Float(b)) => a.partial_cmp(b),
            (Literal::Str(a), FactValue::Str(b)) => Some(a.as_str().cmp(b.as_str())),
            _ => None,
        }
    }

    fn eq_value(&self, other: &FactValue) -> bool {
        match (self, other) {
            (Literal::Bool(a), FactValue::Bool(b)) => a == b,
            (Literal::Int(a), FactValue::Int(b)) => a == b,
            (Literal::Float(a), FactValue::Float(b)) => a == b,
            (Literal::Int(a), FactValue::Float(b)) => (*a as f64) == *b,
            (Literal::Float(a), FactValue::Int(b)) => *a == (*b as f64),
            (Literal::Str(a), FactValue::Str(b)) => a == b,
            _ => false,
        }
    }
}

/// A value reference: either a literal or a lookup against the facts
/// context. Untagged so the DSL can
/// write either a bare literal (`"debian"`, `4`) or `{"fact": "os_family"}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueRef {
    Fact { fact: String },
    Lit(Literal),
}

impl ValueRef {
    pub fn fact(name: impl Into<String>) -> Self {
        ValueRef::Fact { fact: name.into() }
    }

    pub fn lit(literal: Literal) -> Self {
        ValueRef::Lit(literal)
    }

    /// Resolve against the facts context. A missing fact resolves to
    /// `FactValue::None`, the sentinel unequal to every literal.
    fn resolve(&self, facts: &FactValue) -> FactValue {
        match self {
            ValueRef::Lit(l) => match l {
                Literal::Bool(b) => FactValue::Bool(*b),
                Literal::Int(n) => FactValue::Int(*n),
                Literal::Float(f) => FactValue::Float(*f),
                Literal::Str(s) => FactValue::Str(s.clone()),
            },
            ValueRef::Fact { .. } => facts.clone(),
        }
    }
}

/// The predicate AST. Supported nodes: literal, fact reference, `==`,
/// `!=`, `<`, `>`, `<=`, `>=`, `and`, `or`, `not`, `in`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Always true; the default when a step carries no `when` clause.
    Always,
    Literal(Literal),
    Eq(ValueRef, ValueRef),
    Ne(ValueRef, ValueRef),
    Lt(ValueRef, ValueRef),
    Gt(ValueRef, ValueRef),
    Le(ValueRef, ValueRef),
    Ge(ValueRef, ValueRef),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
    /// `value in [candidates...]`.
    In(ValueRef, Vec<ValueRef>),
}

impl Default for Predicate {
    fn default() -> Self {
        Predicate::Always
    }
}

impl Predicate {
    /// Evaluate against a fact context, yielding a boolean. Non-boolean
    /// results are coerced to truthiness.
    pub fn eval(&self, facts: &crate::facts::Facts) -> bool {
        self.eval_inner(facts).is_truthy()
    }

    fn lookup(value_ref: &ValueRef, facts: &crate::facts::Facts) -> FactValue {
        match value_ref {
            ValueRef::Lit(l) => ValueRef::Lit(l.clone()).resolve(&FactValue::None),
            ValueRef::Fact { fact: name } => facts.get(name).cloned().unwrap_or(FactValue::None),
        }
    }

    fn eval_inner(&self, facts: &crate::facts::Facts) -> FactValue {
        match self {
            Predicate::Always => FactValue::Bool(true),
            Predicate::Literal(l) => ValueRef::Lit(l.clone()).resolve(&FactValue::None),
            Predicate::Eq(a, b) => FactValue::Bool(Self::compare_eq(a, b, facts)),
            Predicate::Ne(a, b) => FactValue::Bool(!Self::compare_eq(a, b, facts)),
            Predicate::Lt(a, b) => FactValue::Bool(Self::compare_ord(a, b, facts) == Some(std::cmp::Ordering::Less)),
            Predicate::Gt(a, b) => {
                FactValue::Bool(Self::compare_ord(a, b, facts) == Some(std::cmp::Ordering::Greater))
            }
            Predicate::Le(a, b) => FactValue::Bool(matches!(
                Self::compare_ord(a, b, facts),
                Some(std::cmp::Ordering::Less) | Some(std::cmp::Ordering::Equal)
            )),
            Predicate::Ge(a, b) => FactValue::Bool(matches!(
                Self::compare_ord(a, b, facts),
                Some(std::cmp::Ordering::Greater) | Some(std::cmp::Ordering::Equal)
            )),
            Predicate::And(a, b) => FactValue::Bool(a.eval(facts) && b.eval(facts)),
            Predicate::Or(a, b) => FactValue::Bool(a.eval(facts) || b.eval(facts)),
            Predicate::Not(a) => FactValue::Bool(!a.eval(facts)),
            Predicate::In(needle, haystack) => {
                let needle_value = Self::lookup(needle, facts);
                let found = haystack
                    .iter()
                    .any(|candidate| values_eq(&needle_value, &Self::lookup(candidate, facts)));
                FactValue::Bool(found)
            }
        }
    }

    /// Relational and equality ops are evaluated as "left literal compared
    /// against right value" when possible; when both sides are facts we
    /// compare the resolved values directly.
    fn compare_eq(a: &ValueRef, b: &ValueRef, facts: &crate::facts::Facts) -> bool {
        let av = Self::lookup(a, facts);
        let bv = Self::lookup(b, facts);
        values_eq(&av, &bv)
    }

    fn compare_ord(a: &ValueRef, b: &ValueRef, facts: &crate::facts::Facts) -> Option<std::cmp::Ordering> {
        let av = Self::lookup(a, facts);
        let bv = Self::lookup(b, facts);
        if let Some(lit) = value_as_literal(&av) {
            lit.partial_cmp_value(&bv)
        } else {
            None
        }
    }
}

fn value_as_literal(v: &FactValue) -> Option<Literal> {
    match v {
        FactValue::Bool(b) => Some(Literal::Bool(*b)),
        FactValue::Int(n) => Some(Literal::Int(*n)),
        FactValue::Float(f) => Some(Literal::Float(*f)),
        FactValue::Str(s) => Some(Literal::Str(s.clone())),
        FactValue::List(_) | FactValue::None => None,
    }
}

fn values_eq(a: &FactValue, b: &FactValue) -> bool {
    // A missing fact (None) compares unequal to everything, including
    // another missing fact.
    if matches!(a, FactValue::None) || matches!(b, FactValue::None) {
        return false;
    }
    match (value_as_literal(a), value_as_literal(b)) {
        (Some(la), _) => la.eq_value(b),
        (None, _) => a == b,
    }
}

#[cfg(test)]
#[path = "predicate_tests.rs"]
mod tests;
