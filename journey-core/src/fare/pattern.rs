//! Attribute patterns for ticket eligibility.
//!
//! A ticket's validity is expressed as constraints over route and stop
//! attributes, e.g. "stop zone ∈ {1, 1/2}" or "route short name does not
//! start with L". Constraints added for the same attribute and operator
//! accumulate as alternatives; constraints across different
//! attribute/operator combinations must all hold.

use crate::domain::{Route, Stop};
use std::collections::BTreeMap;

/// Text matching operators available in constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TextOperator {
    StartsWith,
    NotStartsWith,
    EndsWith,
    NotEndsWith,
    In,
    NotIn,
}

impl TextOperator {
    /// Whether this operator asserts the absence of a match.
    pub fn is_negation(self) -> bool {
        matches!(
            self,
            TextOperator::NotStartsWith | TextOperator::NotEndsWith | TextOperator::NotIn
        )
    }
}

/// Evaluate one operator against a value and its list of alternatives.
///
/// Positive operators match when *any* alternative matches; negated
/// operators match when *no* alternative does.
pub fn matches(operator: TextOperator, value: &str, alternatives: &[String]) -> bool {
    match operator {
        TextOperator::StartsWith => alternatives.iter().any(|a| value.starts_with(a.as_str())),
        TextOperator::NotStartsWith => !alternatives.iter().any(|a| value.starts_with(a.as_str())),
        TextOperator::EndsWith => alternatives.iter().any(|a| value.ends_with(a.as_str())),
        TextOperator::NotEndsWith => !alternatives.iter().any(|a| value.ends_with(a.as_str())),
        TextOperator::In => alternatives.iter().any(|a| a == value),
        TextOperator::NotIn => !alternatives.iter().any(|a| a == value),
    }
}

/// Route attributes constraints can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RouteAttribute {
    ShortName,
    LongName,
}

/// Stop attributes constraints can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StopAttribute {
    Name,
    Zone,
}

fn evaluate<A: Copy + Ord>(
    constraints: &BTreeMap<(A, TextOperator), Vec<String>>,
    value_of: impl Fn(A) -> Option<String>,
) -> bool {
    constraints.iter().all(|(&(attribute, operator), values)| {
        match value_of(attribute) {
            Some(value) => matches(operator, &value, values),
            // A missing attribute can satisfy only negated constraints.
            None => operator.is_negation(),
        }
    })
}

/// Conjunction of constraints over route attributes.
#[derive(Debug, Clone, Default)]
pub struct RoutePattern {
    constraints: BTreeMap<(RouteAttribute, TextOperator), Vec<String>>,
}

impl RoutePattern {
    pub fn add_constraint(
        &mut self,
        attribute: RouteAttribute,
        operator: TextOperator,
        value: impl Into<String>,
    ) {
        self.constraints
            .entry((attribute, operator))
            .or_default()
            .push(value.into());
    }

    pub fn matches(&self, route: &Route) -> bool {
        evaluate(&self.constraints, |attribute| match attribute {
            RouteAttribute::ShortName => Some(route.short_name.clone()),
            RouteAttribute::LongName => Some(route.long_name.clone()),
        })
    }
}

/// Conjunction of constraints over stop attributes.
#[derive(Debug, Clone, Default)]
pub struct StopPattern {
    constraints: BTreeMap<(StopAttribute, TextOperator), Vec<String>>,
}

impl StopPattern {
    pub fn add_constraint(
        &mut self,
        attribute: StopAttribute,
        operator: TextOperator,
        value: impl Into<String>,
    ) {
        self.constraints
            .entry((attribute, operator))
            .or_default()
            .push(value.into());
    }

    pub fn matches(&self, stop: &Stop) -> bool {
        evaluate(&self.constraints, |attribute| match attribute {
            StopAttribute::Name => Some(stop.name.clone()),
            StopAttribute::Zone => stop.zone.clone(),
        })
    }
}
