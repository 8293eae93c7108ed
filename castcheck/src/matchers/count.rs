use std::fmt;

/// Shorthand for a count of 1.
pub const ONCE: usize = 1;
/// Shorthand for a count of 2.
pub const TWICE: usize = 2;
/// Shorthand for a count of 3.
pub const THRICE: usize = 3;

/// How many matching broadcasts an expectation requires.
///
/// The default is `Exactly(1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CountConstraint {
    Exactly(usize),
    AtLeast(usize),
    AtMost(usize),
}

impl Default for CountConstraint {
    fn default() -> Self {
        CountConstraint::Exactly(ONCE)
    }
}

impl CountConstraint {
    /// Returns true if `actual` broadcasts satisfy this constraint.
    pub fn is_satisfied_by(&self, actual: usize) -> bool {
        match *self {
            CountConstraint::Exactly(n) => actual == n,
            CountConstraint::AtLeast(n) => actual >= n,
            CountConstraint::AtMost(n) => actual <= n,
        }
    }

    /// Returns whether `actual` satisfies the constraint, together with the
    /// phrase used in failure messages ("exactly 2", "at least 1", ...).
    pub fn check(&self, actual: usize) -> (bool, String) {
        (self.is_satisfied_by(actual), self.to_string())
    }

    /// The `n` the constraint was built with.
    pub fn expected(&self) -> usize {
        match *self {
            CountConstraint::Exactly(n)
            | CountConstraint::AtLeast(n)
            | CountConstraint::AtMost(n) => n,
        }
    }
}

impl fmt::Display for CountConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountConstraint::Exactly(n) => write!(f, "exactly {n}"),
            CountConstraint::AtLeast(n) => write!(f, "at least {n}"),
            CountConstraint::AtMost(n) => write!(f, "at most {n}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_exactly_once() {
        assert_eq!(CountConstraint::default(), CountConstraint::Exactly(1));
    }

    #[test]
    fn exactly_requires_equal_count() {
        let (ok, phrase) = CountConstraint::Exactly(2).check(2);
        assert!(ok);
        assert_eq!(phrase, "exactly 2");
        assert!(!CountConstraint::Exactly(2).is_satisfied_by(1));
        assert!(!CountConstraint::Exactly(2).is_satisfied_by(3));
        assert!(CountConstraint::Exactly(0).is_satisfied_by(0));
    }

    #[test]
    fn at_least_is_monotonic_downwards() {
        let actual = 3;
        assert!(CountConstraint::AtLeast(3).is_satisfied_by(actual));
        for n in 0..=3 {
            assert!(CountConstraint::AtLeast(n).is_satisfied_by(actual), "n = {n}");
        }
        assert!(!CountConstraint::AtLeast(4).is_satisfied_by(actual));
        assert_eq!(CountConstraint::AtLeast(ONCE).to_string(), "at least 1");
    }

    #[test]
    fn at_most_is_monotonic_upwards() {
        let actual = 2;
        assert!(!CountConstraint::AtMost(1).is_satisfied_by(actual));
        for n in 2..10 {
            assert!(CountConstraint::AtMost(n).is_satisfied_by(actual), "n = {n}");
        }
        assert_eq!(CountConstraint::AtMost(ONCE).to_string(), "at most 1");
    }

    #[test]
    fn shorthands_resolve_to_integers() {
        assert_eq!(CountConstraint::Exactly(TWICE), CountConstraint::Exactly(2));
        assert_eq!(CountConstraint::Exactly(THRICE).expected(), 3);
    }
}
