// tighten-policy/src/tristate.rs
// ============================================================================
// Module: Tri-State Logic
// Description: Tri-state truth values and the logic table used to combine
// evidence-backed requirements.
// ============================================================================

//! ## Overview
//! Policy evaluation never treats missing evidence as failure or success
//! (`spec.md` §4.6, §4.8): a probe that did not run leaves the requirement
//! `Unknown`, and that uncertainty propagates through `And`/`Or` composition
//! via [`TriState`] and strong Kleene logic, the default and only supported
//! table here (fail-closed: `Unknown` never resolves to `True` on its own).

use serde::Deserialize;
use serde::Serialize;

/// Tri-state truth value for evidence-aware evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriState {
    /// Definitively true.
    True,
    /// Definitively false.
    False,
    /// Indeterminate due to missing or insufficient evidence.
    Unknown,
}

impl TriState {
    /// Returns true if the value is `True`.
    #[must_use]
    pub const fn is_true(self) -> bool {
        matches!(self, Self::True)
    }

    /// Returns true if the value is `Unknown`.
    #[must_use]
    pub const fn is_unknown(self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl From<bool> for TriState {
    fn from(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }
}

/// Combines tri-state values with strong Kleene semantics: `Unknown` behaves
/// as absorbing unless the other operand alone determines the result.
#[must_use]
pub fn and(lhs: TriState, rhs: TriState) -> TriState {
    match (lhs, rhs) {
        (TriState::False, _) | (_, TriState::False) => TriState::False,
        (TriState::True, TriState::True) => TriState::True,
        _ => TriState::Unknown,
    }
}

/// Combines tri-state values with strong Kleene OR semantics.
#[must_use]
pub fn or(lhs: TriState, rhs: TriState) -> TriState {
    match (lhs, rhs) {
        (TriState::True, _) | (_, TriState::True) => TriState::True,
        (TriState::False, TriState::False) => TriState::False,
        _ => TriState::Unknown,
    }
}

/// Negates a tri-state value; `Unknown` negates to itself.
#[must_use]
pub const fn not(value: TriState) -> TriState {
    match value {
        TriState::True => TriState::False,
        TriState::False => TriState::True,
        TriState::Unknown => TriState::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_is_false_if_either_side_is_false() {
        assert_eq!(and(TriState::False, TriState::Unknown), TriState::False);
        assert_eq!(and(TriState::Unknown, TriState::False), TriState::False);
    }

    #[test]
    fn and_is_unknown_when_neither_side_is_false_but_one_is_unknown() {
        assert_eq!(and(TriState::True, TriState::Unknown), TriState::Unknown);
    }

    #[test]
    fn or_is_true_if_either_side_is_true() {
        assert_eq!(or(TriState::True, TriState::Unknown), TriState::True);
        assert_eq!(or(TriState::Unknown, TriState::True), TriState::True);
    }
}
