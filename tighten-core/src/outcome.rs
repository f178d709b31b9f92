// tighten-core/src/outcome.rs
// ============================================================================
// Module: Failure aggregator (C2)
// Description: A result discriminant carrying a value or a non-empty ordered
// list of errors, with combinators that collect every error rather than
// short-circuiting.
// ============================================================================

//! ## Overview
//! Every pipeline stage (`spec.md` §4.2) returns [`Outcome`] rather than
//! `std::result::Result`, because stage-local validation must report *every*
//! problem it finds — two missing modules and three invalid schemas surface
//! as five errors in discovery order (`spec.md` §8, law 4), not just the
//! first. Reserve actual panics for programmer errors (an invalid registry
//! lookup), never for expected, user-facing failure.

use serde::Deserialize;
use serde::Serialize;

/// A single structured error record.
///
/// `code` is a dotted identifier (e.g.
/// `pipeline.buildSsdt.model.extraction.connectionStringMissing`, `spec.md`
/// §4.2); `message` is human-readable; `details` carries free-form
/// machine-readable context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Dotted error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Optional machine-readable detail payload (serialized JSON text).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorRecord {
    /// Builds an error record with no additional detail.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Attaches a detail payload.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Either a value, or one-or-more accumulated [`ErrorRecord`]s.
///
/// The non-empty invariant on the error list is maintained by construction:
/// [`Outcome::fail`] takes a single record, and every combinator that merges
/// error lists only ever appends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The stage succeeded with a value.
    Ok(T),
    /// The stage failed with one or more errors, in discovery order.
    Err(Vec<ErrorRecord>),
}

impl<T> Outcome<T> {
    /// Builds a successful outcome.
    #[must_use]
    pub const fn ok(value: T) -> Self {
        Self::Ok(value)
    }

    /// Builds a failed outcome from a single error.
    #[must_use]
    pub fn fail(error: ErrorRecord) -> Self {
        Self::Err(vec![error])
    }

    /// Builds a failed outcome from a non-empty list of errors.
    ///
    /// # Panics
    ///
    /// Panics if `errors` is empty — an empty error list violates the
    /// failure-aggregator invariant and indicates a programmer error at the
    /// call site, not a recoverable runtime failure.
    #[must_use]
    pub fn fail_many(errors: Vec<ErrorRecord>) -> Self {
        assert!(!errors.is_empty(), "Outcome::fail_many requires at least one error");
        Self::Err(errors)
    }

    /// Returns true when this outcome is successful.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Maps the success value, leaving errors untouched.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Ok(value) => Outcome::Ok(f(value)),
            Self::Err(errors) => Outcome::Err(errors),
        }
    }

    /// Chains a fallible stage; errors from either stage propagate verbatim
    /// (this does not merge errors from two independent stages — use
    /// [`Outcome::collect`] for that).
    #[must_use]
    pub fn bind<U>(self, f: impl FnOnce(T) -> Outcome<U>) -> Outcome<U> {
        match self {
            Self::Ok(value) => f(value),
            Self::Err(errors) => Outcome::Err(errors),
        }
    }

    /// Folds a sequence of fallible computations, collecting *all* errors
    /// across the sequence rather than stopping at the first failure
    /// (`spec.md` §4.2: "collecting all errors").
    pub fn collect<I, U>(items: I) -> Outcome<Vec<U>>
    where
        I: IntoIterator<Item = Outcome<U>>,
    {
        let mut values = Vec::new();
        let mut errors = Vec::new();
        for item in items {
            match item {
                Outcome::Ok(value) => {
                    if errors.is_empty() {
                        values.push(value);
                    }
                }
                Outcome::Err(mut item_errors) => errors.append(&mut item_errors),
            }
        }
        if errors.is_empty() { Outcome::Ok(values) } else { Outcome::Err(errors) }
    }

    /// Converts into a `std::result::Result`, discarding the ability to
    /// recover multiple errors — used only at the outermost boundary (the
    /// dispatcher surfaces the list verbatim per `spec.md` §7).
    pub fn into_result(self) -> Result<T, Vec<ErrorRecord>> {
        match self {
            Self::Ok(value) => Ok(value),
            Self::Err(errors) => Err(errors),
        }
    }
}

impl<T> From<Result<T, ErrorRecord>> for Outcome<T> {
    fn from(result: Result<T, ErrorRecord>) -> Self {
        match result {
            Ok(value) => Self::Ok(value),
            Err(error) => Self::fail(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_gathers_every_error_in_discovery_order() {
        let items = vec![
            Outcome::ok(1),
            Outcome::fail(ErrorRecord::new("a", "first")),
            Outcome::ok(2),
            Outcome::fail(ErrorRecord::new("b", "second")),
        ];
        let result = Outcome::collect(items);
        match result {
            Outcome::Err(errors) => {
                assert_eq!(errors.len(), 2);
                assert_eq!(errors[0].code, "a");
                assert_eq!(errors[1].code, "b");
            }
            Outcome::Ok(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn collect_of_all_ok_preserves_order() {
        let items = vec![Outcome::ok(1), Outcome::ok(2), Outcome::ok(3)];
        let Outcome::Ok(values) = Outcome::collect(items) else {
            panic!("expected success");
        };
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn bind_short_circuits_on_first_error_only_in_sequential_chains() {
        let outcome: Outcome<i32> = Outcome::ok(1);
        let chained = outcome.bind(|value| Outcome::fail(ErrorRecord::new("x", "boom")).map(|()| value));
        assert!(!chained.is_ok());
    }
}
