// tighten-policy/src/requirement.rs
// ============================================================================
// Module: Requirement Tree
// Description: A universal Boolean algebra over domain-specific tri-state
// predicates, used to compose the evidence conditions behind a tightening
// decision.
// ============================================================================

//! ## Overview
//! A single decision (`spec.md` §4.8, e.g. "make this column `NOT NULL`")
//! is the conjunction/disjunction of several evidence conditions — the
//! column is declared mandatory, the profile probe succeeded, no coverage
//! anomaly was raised. [`Requirement`] composes those conditions generically;
//! [`TriStatePredicate`] is the boundary where the tightening policy injects
//! its domain-specific evidence lookups.

use serde::Deserialize;
use serde::Serialize;

use crate::tristate::TriState;

/// A domain-specific, evidence-aware predicate.
pub trait TriStatePredicate {
    /// Evaluation context the predicate reads from (e.g. a profile lookup
    /// for one coordinate).
    type Context<'a>;

    /// Evaluates this predicate against the context, returning `Unknown`
    /// when the needed evidence was not captured.
    fn evaluate(&self, context: &Self::Context<'_>) -> TriState;
}

/// A universal requirement tree with domain-specific leaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Requirement<P> {
    /// All sub-requirements must hold.
    And(Vec<Requirement<P>>),
    /// At least one sub-requirement must hold.
    Or(Vec<Requirement<P>>),
    /// Inverts the sub-requirement.
    Not(Box<Requirement<P>>),
    /// A domain-specific leaf predicate.
    Predicate(P),
}

impl<P> Requirement<P> {
    /// Builds an `And` of the given requirements.
    #[must_use]
    pub fn all(requirements: Vec<Self>) -> Self {
        Self::And(requirements)
    }

    /// Builds an `Or` of the given requirements.
    #[must_use]
    pub fn any(requirements: Vec<Self>) -> Self {
        Self::Or(requirements)
    }

    /// Negates a requirement.
    #[must_use]
    pub fn negate(requirement: Self) -> Self {
        Self::Not(Box::new(requirement))
    }

    /// Wraps a single predicate as a requirement leaf.
    #[must_use]
    pub const fn predicate(predicate: P) -> Self {
        Self::Predicate(predicate)
    }

    /// Evaluates this requirement tree with tri-state (Kleene) semantics.
    pub fn eval_tristate(&self, context: &P::Context<'_>) -> TriState
    where
        P: TriStatePredicate,
    {
        match self {
            Self::Predicate(predicate) => predicate.evaluate(context),
            Self::Not(inner) => crate::tristate::not(inner.eval_tristate(context)),
            Self::And(items) => {
                items.iter().fold(TriState::True, |acc, item| crate::tristate::and(acc, item.eval_tristate(context)))
            }
            Self::Or(items) => {
                items.iter().fold(TriState::False, |acc, item| crate::tristate::or(acc, item.eval_tristate(context)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    enum FlagPredicate {
        Literal(bool),
        Unknown,
    }

    struct NoContext;

    impl TriStatePredicate for FlagPredicate {
        type Context<'a> = NoContext;

        fn evaluate(&self, _context: &Self::Context<'_>) -> TriState {
            match self {
                Self::Literal(value) => TriState::from(*value),
                Self::Unknown => TriState::Unknown,
            }
        }
    }

    #[test]
    fn and_of_true_and_unknown_is_unknown() {
        let requirement = Requirement::all(vec![
            Requirement::predicate(FlagPredicate::Literal(true)),
            Requirement::predicate(FlagPredicate::Unknown),
        ]);
        assert_eq!(requirement.eval_tristate(&NoContext), TriState::Unknown);
    }

    #[test]
    fn or_of_false_and_true_is_true() {
        let requirement = Requirement::any(vec![
            Requirement::predicate(FlagPredicate::Literal(false)),
            Requirement::predicate(FlagPredicate::Literal(true)),
        ]);
        assert_eq!(requirement.eval_tristate(&NoContext), TriState::True);
    }

    #[test]
    fn not_of_unknown_is_unknown() {
        let requirement = Requirement::negate(Requirement::predicate(FlagPredicate::Unknown));
        assert_eq!(requirement.eval_tristate(&NoContext), TriState::Unknown);
    }
}
