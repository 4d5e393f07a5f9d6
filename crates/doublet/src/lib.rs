//! Doublet: Reversible Method Stubs for Rust Test Suites
//!
//! Doublet temporarily replaces methods on patchable [`Object`]s with a
//! fixed value or a callable, checks that replaced methods were called
//! with the expected arguments, and always restores the original
//! behavior when a scope ends, even when the scope fails or panics.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      DOUBLET Architecture                         │
//! ├──────────────────────────────────────────────────────────────────┤
//! │   ┌─────────────┐    ┌──────────────┐    ┌────────────────┐      │
//! │   │ stub/expect │───►│ StubSession  │───►│ Substitution   │      │
//! │   │ (Doubles)   │    │ RestoreGuard │    │ + CallRecorder │      │
//! │   └─────────────┘    └──────────────┘    └───────┬────────┘      │
//! │                                                  ▼               │
//! │   ┌─────────────┐    ┌──────────────┐    ┌────────────────┐      │
//! │   │ Object.call │───►│ MethodTable  │◄───│ MethodRegistry │      │
//! │   │             │    │ patch stacks │    │ capture/install│      │
//! │   └─────────────┘    └──────────────┘    └────────────────┘      │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use doublet::prelude::*;
//!
//! let class = Class::new("Subject");
//! class.define("baz", Arity::Exact(1), |_, args| Ok(args[0].clone()));
//! let subject = class.new_instance();
//!
//! doublet::expect(
//!     &subject,
//!     "baz",
//!     Expectation::new().with(args!["value"]).returns("result"),
//!     |_| {
//!         assert_eq!(subject.call("baz", &args!["value"])?, Value::from("result"));
//!         Ok::<_, DoubleError>(())
//!     },
//! )
//! .unwrap();
//!
//! // A mismatched call fails where it happens and again when the scope ends
//! let outcome = doublet::expect(
//!     &subject,
//!     "baz",
//!     Expectation::new().with(args!["value"]).returns("result"),
//!     |_| {
//!         assert!(subject.call("baz", &args!["another"]).unwrap_err().is_expectation());
//!         Ok::<_, DoubleError>(())
//!     },
//! );
//! assert!(outcome.unwrap_err().is_expectation());
//!
//! assert_eq!(subject.call("baz", &args!["baz"]).unwrap(), Value::from("baz"));
//! ```
//!
//! # Threading
//!
//! Objects are `Rc`-based and not `Send`: patches are installed, invoked
//! and restored on the calling thread only.

#![warn(missing_docs)]

pub mod config;
mod doubles;
pub mod expectation;
pub mod logging;
pub mod matcher;
pub mod object;
pub mod recorder;
pub mod registry;
mod result;
pub mod stub;
pub mod substitution;
mod value;

pub use config::DoubletConfig;
pub use doubles::Doubles;
pub use expectation::{Expectation, ExpectationHandle, Times};
pub use matcher::Difference;
pub use object::{Arity, Class, Method, Object, ObjectId};
pub use recorder::{CallRecord, CallRecorder};
pub use registry::{MethodRegistry, PatchId};
pub use result::{DoubleError, DoubleResult, ExpectationFailure};
pub use stub::StubSession;
pub use substitution::{Original, Replacement, Substitution};
pub use value::Value;

/// Commonly used items
pub mod prelude {
    pub use crate::{args, kwargs};
    pub use crate::{
        Arity, Class, DoubleError, DoubleResult, Doubles, DoubletConfig, Expectation,
        ExpectationFailure, Method, Object, Original, Replacement, Substitution, Value,
    };
}

/// Replace one method for the duration of `block`, using the default configuration
///
/// See [`Doubles::stub`].
pub fn stub<R, E, F>(
    target: &Object,
    method: &str,
    replacement: impl Into<Replacement>,
    block: F,
) -> Result<R, E>
where
    F: FnOnce(&Original) -> Result<R, E>,
    E: From<DoubleError>,
{
    Doubles::new().stub(target, method, replacement, block)
}

/// Replace several methods for the duration of `block`
///
/// See [`Doubles::stub_many`].
pub fn stub_many<R, E, F, I, K, V>(target: &Object, methods: I, block: F) -> Result<R, E>
where
    F: FnOnce(&Original) -> Result<R, E>,
    E: From<DoubleError>,
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Replacement>,
{
    Doubles::new().stub_many(target, methods, block)
}

/// Replace one method until [`unstub`]
pub fn install_stub(
    target: &Object,
    method: &str,
    replacement: impl Into<Replacement>,
) -> DoubleResult<Substitution> {
    Doubles::new().install_stub(target, method, replacement)
}

/// Replace several methods until [`unstub`]
pub fn install_stubs<I, K, V>(target: &Object, methods: I) -> DoubleResult<Vec<Substitution>>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Replacement>,
{
    Doubles::new().install_stubs(target, methods)
}

/// Restore the most recent substitution of each named method
pub fn unstub(target: &Object, methods: &[&str]) -> DoubleResult<()> {
    Doubles::new().unstub(target, methods)
}

/// Install an argument-checking stub for the duration of `block`
///
/// See [`Doubles::expect`].
pub fn expect<R, E, F>(
    target: &Object,
    method: &str,
    expectation: Expectation,
    block: F,
) -> Result<R, E>
where
    F: FnOnce(&Original) -> Result<R, E>,
    E: From<DoubleError>,
{
    Doubles::new().expect(target, method, expectation, block)
}

/// Install an argument-checking stub until [`unstub`]
pub fn install_expectation(
    target: &Object,
    method: &str,
    expectation: Expectation,
) -> DoubleResult<ExpectationHandle> {
    Doubles::new().install_expectation(target, method, expectation)
}
