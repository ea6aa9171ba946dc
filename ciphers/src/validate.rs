//! Length preconditions shared by all algorithm bindings.
//!
//! Bounds are passed in by the caller, who reads them from libsodium at call time. Every
//! public operation runs its checks before allocating or calling into libsodium.

use std::fmt;

use thiserror::Error;

/// The bound a length was checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    Exactly(usize),
    InRange { min: usize, max: usize },
    AtLeast(usize),
    AtMost(usize),
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Exactly(n) => write!(f, "exactly {n}"),
            Constraint::InRange { min, max } => write!(f, "between {min} and {max}"),
            Constraint::AtLeast(n) => write!(f, "at least {n}"),
            Constraint::AtMost(n) => write!(f, "at most {n}"),
        }
    }
}

/// A length precondition failed
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid {name}: got {actual}, expected {constraint}")]
pub struct ValidationError {
    pub name: &'static str,
    pub actual: usize,
    pub constraint: Constraint,
}

fn check(
    ok: bool,
    actual: usize,
    constraint: Constraint,
    name: &'static str,
) -> Result<(), ValidationError> {
    match ok {
        true => Ok(()),
        false => Err(ValidationError {
            name,
            actual,
            constraint,
        }),
    }
}

pub fn check_is_same(
    actual: usize,
    expected: usize,
    name: &'static str,
) -> Result<(), ValidationError> {
    check(actual == expected, actual, Constraint::Exactly(expected), name)
}

/// Inclusive on both ends
pub fn check_in_range(
    actual: usize,
    min: usize,
    max: usize,
    name: &'static str,
) -> Result<(), ValidationError> {
    check(
        min <= actual && actual <= max,
        actual,
        Constraint::InRange { min, max },
        name,
    )
}

pub fn check_at_least(
    actual: usize,
    min: usize,
    name: &'static str,
) -> Result<(), ValidationError> {
    check(actual >= min, actual, Constraint::AtLeast(min), name)
}

pub fn check_at_most(actual: usize, max: usize, name: &'static str) -> Result<(), ValidationError> {
    check(actual <= max, actual, Constraint::AtMost(max), name)
}
