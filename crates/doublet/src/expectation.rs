//! Expectations: stubs that also assert on how they are called.
//!
//! Argument mismatches fail synchronously at the call site, so the
//! caller observes an `Expectation` error from the very call that broke
//! the contract. The first mismatch is also kept and reported again once
//! the scope ends, together with any call-count constraint (or on
//! [`ExpectationHandle::verify`] for open-ended expectations), so code
//! that discards the call's error still fails the expectation.

use crate::config::DoubletConfig;
use crate::logging;
use crate::matcher;
use crate::object::Object;
use crate::recorder::CallRecord;
use crate::registry::MethodRegistry;
use crate::result::{DoubleError, DoubleResult, ExpectationFailure};
use crate::stub::{StubSession, Verify};
use crate::substitution::{Original, Replacement, Substitution};
use crate::value::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Call-count constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Times {
    /// Exactly `n` calls
    Exactly(usize),
    /// At least `n` calls
    AtLeast(usize),
    /// At most `n` calls
    AtMost(usize),
}

impl Times {
    /// Check an observed call count
    #[must_use]
    pub const fn matches(self, calls: usize) -> bool {
        match self {
            Self::Exactly(n) => calls == n,
            Self::AtLeast(n) => calls >= n,
            Self::AtMost(n) => calls <= n,
        }
    }
}

impl fmt::Display for Times {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(n) => write!(f, "exactly {n} time(s)"),
            Self::AtLeast(n) => write!(f, "at least {n} time(s)"),
            Self::AtMost(n) => write!(f, "at most {n} time(s)"),
        }
    }
}

/// Declared arguments, return value and optional call count
///
/// ```
/// use doublet::{args, Expectation};
///
/// let expectation = Expectation::new()
///     .with(args!["value"])
///     .returns("result")
///     .once();
/// assert_eq!(expectation.expected_args().len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expectation {
    with: Vec<Value>,
    returns: Option<Value>,
    times: Option<Times>,
}

impl Expectation {
    /// Expect no arguments; a return value must still be set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Expected arguments, compared structurally
    #[must_use]
    pub fn with(mut self, args: Vec<Value>) -> Self {
        self.with = args;
        self
    }

    /// Value returned by every matching call
    #[must_use]
    pub fn returns(mut self, value: impl Into<Value>) -> Self {
        self.returns = Some(value.into());
        self
    }

    /// Require exactly `n` calls
    #[must_use]
    pub const fn times(mut self, n: usize) -> Self {
        self.times = Some(Times::Exactly(n));
        self
    }

    /// Require exactly one call
    #[must_use]
    pub const fn once(self) -> Self {
        self.times(1)
    }

    /// Require no calls
    #[must_use]
    pub const fn never(self) -> Self {
        self.times(0)
    }

    /// Require at least `n` calls
    #[must_use]
    pub const fn at_least(mut self, n: usize) -> Self {
        self.times = Some(Times::AtLeast(n));
        self
    }

    /// Require at most `n` calls
    #[must_use]
    pub const fn at_most(mut self, n: usize) -> Self {
        self.times = Some(Times::AtMost(n));
        self
    }

    /// Declared arguments
    #[must_use]
    pub fn expected_args(&self) -> &[Value] {
        &self.with
    }

    /// Declared return value
    #[must_use]
    pub fn return_value(&self) -> Option<&Value> {
        self.returns.as_ref()
    }

    /// Declared call count
    #[must_use]
    pub fn call_count(&self) -> Option<Times> {
        self.times
    }

    /// Build the argument-checking replacement for `method` on `target`
    ///
    /// The first mismatching call is stored in `check` for later
    /// verification.
    fn into_replacement(
        self,
        target: &Object,
        method: &str,
        check: &ExpectationCheck,
    ) -> DoubleResult<Replacement> {
        MethodRegistry::capture(target, method)?;
        let returns = self.returns.ok_or_else(|| {
            DoubleError::usage(format!(
                "expectation for `{method}' on {} has no return value",
                target.label()
            ))
        })?;
        let expected = self.with;
        let label = target.label().to_string();
        let method = method.to_string();
        let first_mismatch = Rc::clone(&check.first_mismatch);

        Ok(Replacement::try_func(move |args| {
            if let Some(difference) = matcher::compare(&expected, args) {
                let difference = difference.to_string();
                logging::log_argument_mismatch(&label, &method, &difference);
                let failure = ExpectationFailure::Arguments {
                    expected: expected.clone(),
                    actual: args.to_vec(),
                    difference,
                };
                first_mismatch
                    .borrow_mut()
                    .get_or_insert_with(|| failure.clone());
                return Err(DoubleError::Expectation {
                    target: label.clone(),
                    method: method.clone(),
                    failure,
                });
            }
            Ok(returns.clone())
        }))
    }
}

/// What an expectation verifies once its calls are over
#[derive(Debug, Clone)]
pub(crate) struct ExpectationCheck {
    times: Option<Times>,
    first_mismatch: Rc<RefCell<Option<ExpectationFailure>>>,
}

impl ExpectationCheck {
    fn new(times: Option<Times>) -> Self {
        Self {
            times,
            first_mismatch: Rc::default(),
        }
    }

    /// Argument mismatches first, then the call count
    pub(crate) fn verify(&self, substitution: &Substitution) -> DoubleResult<()> {
        let failed = |failure| DoubleError::Expectation {
            target: substitution.target().label().to_string(),
            method: substitution.method().to_string(),
            failure,
        };
        if let Some(failure) = self.first_mismatch.borrow().clone() {
            return Err(failed(failure));
        }
        let Some(times) = self.times else {
            return Ok(());
        };
        let actual = substitution.recorder().call_count();
        if times.matches(actual) {
            return Ok(());
        }
        Err(failed(ExpectationFailure::CallCount {
            expected: times.to_string(),
            actual,
        }))
    }
}

/// Install `expectation`, run `block`, then restore
pub(crate) fn run<R, E, F>(
    target: &Object,
    method: &str,
    expectation: Expectation,
    config: DoubletConfig,
    block: F,
) -> Result<R, E>
where
    F: FnOnce(&Original) -> Result<R, E>,
    E: From<DoubleError>,
{
    let check = ExpectationCheck::new(expectation.times);
    let replacement = expectation.into_replacement(target, method, &check)?;
    StubSession::new(target, config)
        .replace(method, replacement)
        .verify_with(Verify::Expectation(check))
        .run(block)
}

/// Install `expectation` until [`crate::unstub`]
pub(crate) fn install(
    target: &Object,
    method: &str,
    expectation: Expectation,
    config: DoubletConfig,
) -> DoubleResult<ExpectationHandle> {
    let check = ExpectationCheck::new(expectation.times);
    let replacement = expectation.into_replacement(target, method, &check)?;
    let mut installed = StubSession::new(target, config)
        .replace(method, replacement)
        .install()?;
    let substitution = installed
        .pop()
        .ok_or_else(|| DoubleError::usage(format!("nothing installed for `{method}'")))?;
    Ok(ExpectationHandle {
        substitution,
        check,
    })
}

/// An open-ended expectation
#[derive(Debug, Clone)]
pub struct ExpectationHandle {
    substitution: Substitution,
    check: ExpectationCheck,
}

impl ExpectationHandle {
    /// Report the first argument mismatch, then check the call-count
    /// constraint if one was declared
    pub fn verify(&self) -> DoubleResult<()> {
        self.check.verify(&self.substitution)
    }

    /// Underlying substitution
    #[must_use]
    pub fn substitution(&self) -> &Substitution {
        &self.substitution
    }

    /// Whether the method was invoked
    #[must_use]
    pub fn was_invoked(&self) -> bool {
        self.substitution.was_invoked()
    }

    /// Number of invocations, including mismatched ones
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.substitution.call_count()
    }

    /// Arguments of the most recent invocation
    #[must_use]
    pub fn last_arguments(&self) -> Vec<Value> {
        self.substitution.last_arguments()
    }

    /// Retained invocation history
    #[must_use]
    pub fn calls(&self) -> Vec<CallRecord> {
        self.substitution.calls()
    }
}
