//! Structural argument matching.
//!
//! Expected and received argument lists are compared element-wise with
//! deep equality. When they differ, the matcher reports the first
//! difference with a path into the nested structure, e.g. `[1].optional`.

use crate::value::Value;
use std::fmt;

/// The first point at which two argument lists diverge
#[derive(Debug, Clone, PartialEq)]
pub enum Difference {
    /// Different number of arguments
    Count {
        /// Expected argument count
        expected: usize,
        /// Received argument count
        actual: usize,
    },
    /// Different values at `path`
    Value {
        /// Location of the difference
        path: String,
        /// Expected value at that location
        expected: Value,
        /// Received value at that location (`Nil` if missing)
        actual: Value,
    },
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count { expected, actual } => {
                write!(f, "expected {expected} argument(s), got {actual}")
            }
            Self::Value {
                path,
                expected,
                actual,
            } => write!(f, "{path}: expected {expected}, got {actual}"),
        }
    }
}

/// Deep structural equality
///
/// Variants never compare equal across kinds, and floats use IEEE
/// equality (`NaN` matches nothing).
#[must_use]
pub fn structurally_eq(expected: &Value, actual: &Value) -> bool {
    expected == actual
}

/// Compare argument lists; `None` means they match
#[must_use]
pub fn compare(expected: &[Value], actual: &[Value]) -> Option<Difference> {
    if expected.len() != actual.len() {
        return Some(Difference::Count {
            expected: expected.len(),
            actual: actual.len(),
        });
    }
    expected
        .iter()
        .zip(actual)
        .enumerate()
        .find_map(|(i, (e, a))| first_difference(&format!("[{i}]"), e, a))
}

fn first_difference(path: &str, expected: &Value, actual: &Value) -> Option<Difference> {
    match (expected, actual) {
        (Value::List(e), Value::List(a)) if e.len() == a.len() => e
            .iter()
            .zip(a)
            .enumerate()
            .find_map(|(i, (e, a))| first_difference(&format!("{path}[{i}]"), e, a)),
        (Value::Map(e), Value::Map(a)) => {
            let keys = e.keys().chain(a.keys().filter(|k| !e.contains_key(*k)));
            for key in keys {
                let nested = format!("{path}.{key}");
                match (e.get(key), a.get(key)) {
                    (Some(ev), Some(av)) => {
                        if let Some(diff) = first_difference(&nested, ev, av) {
                            return Some(diff);
                        }
                    }
                    (ev, av) => {
                        return Some(Difference::Value {
                            path: nested,
                            expected: ev.cloned().unwrap_or_default(),
                            actual: av.cloned().unwrap_or_default(),
                        })
                    }
                }
            }
            None
        }
        _ if structurally_eq(expected, actual) => None,
        _ => Some(Difference::Value {
            path: path.to_string(),
            expected: expected.clone(),
            actual: actual.clone(),
        }),
    }
}
