//! Substitutions: one patched method and its invocation state.

use crate::object::{Method, Object};
use crate::recorder::{CallRecord, CallRecorder};
use crate::registry::{MethodRegistry, PatchId};
use crate::result::DoubleResult;
use crate::value::Value;
use std::fmt;
use std::rc::Rc;

type ReplacementFn = dyn Fn(&[Value], &Original) -> DoubleResult<Value>;

/// What a patched method does instead of its original
#[derive(Clone)]
pub enum Replacement {
    /// Return this value regardless of arguments
    Value(Value),
    /// Forward all arguments to a callable along with a call-through hook
    Callable(Rc<ReplacementFn>),
}

impl fmt::Debug for Replacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Callable(_) => f.write_str("Callable(..)"),
        }
    }
}

impl Replacement {
    /// Fixed return value
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    /// Infallible callable over the received arguments
    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Value + 'static,
    {
        Self::Callable(Rc::new(move |args: &[Value], _: &Original| Ok(f(args))))
    }

    /// Fallible callable over the received arguments
    pub fn try_func<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> DoubleResult<Value> + 'static,
    {
        Self::Callable(Rc::new(move |args: &[Value], _: &Original| f(args)))
    }

    /// Callable that may delegate to the implementation it replaced
    pub fn through<F>(f: F) -> Self
    where
        F: Fn(&[Value], &Original) -> DoubleResult<Value> + 'static,
    {
        Self::Callable(Rc::new(f))
    }

    fn apply(&self, args: &[Value], original: &Original) -> DoubleResult<Value> {
        match self {
            Self::Value(value) => Ok(value.clone()),
            Self::Callable(f) => f(args, original),
        }
    }
}

macro_rules! replacement_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Replacement {
                fn from(value: $ty) -> Self {
                    Self::Value(Value::from(value))
                }
            }
        )*
    };
}

replacement_from!(Value, bool, i32, i64, f64, &str, String);

/// Call-through hook to the implementation a substitution replaced
///
/// The replaced implementation is whatever the method resolved to when
/// the substitution was installed: the true original, or an outer
/// substitution when stubs are nested.
#[derive(Debug, Clone)]
pub struct Original {
    receiver: Object,
    method: String,
    implementation: Method,
}

impl Original {
    pub(crate) fn new(receiver: Object, method: &str, implementation: Method) -> Self {
        Self {
            receiver,
            method: method.to_string(),
            implementation,
        }
    }

    /// Invoke the replaced implementation bound to the receiver
    pub fn call(&self, args: &[Value]) -> DoubleResult<Value> {
        self.implementation
            .invoke(&self.method, &self.receiver, args)
    }

    /// Name of the replaced method
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Receiver the hook is bound to
    #[must_use]
    pub fn receiver(&self) -> &Object {
        &self.receiver
    }
}

/// One installed method replacement
///
/// Dropping a `Substitution` does not restore the method; scoped
/// sessions restore through a guard, open-ended ones through `unstub`.
#[derive(Debug, Clone)]
pub struct Substitution {
    target: Object,
    method: String,
    patch: PatchId,
    original: Method,
    recorder: Rc<CallRecorder>,
}

impl Substitution {
    /// Capture the current implementation of `method` and install `replacement`
    pub fn install(
        target: &Object,
        method: &str,
        replacement: Replacement,
        history_limit: usize,
    ) -> DoubleResult<Self> {
        let original = MethodRegistry::capture(target, method)?;
        let recorder = Rc::new(CallRecorder::new(history_limit));

        let implementation = {
            let recorder = Rc::clone(&recorder);
            let original = original.clone();
            let method = method.to_string();
            Method::variadic(move |receiver, args| {
                recorder.record(args);
                tracing::trace!(
                    object = %receiver.label(),
                    method = %method,
                    calls = recorder.call_count(),
                    "substitution invoked"
                );
                let hook = Original::new(receiver.clone(), &method, original.clone());
                replacement.apply(args, &hook)
            })
        };

        let patch = MethodRegistry::install(target, method, implementation);
        Ok(Self {
            target: target.clone(),
            method: method.to_string(),
            patch,
            original,
            recorder,
        })
    }

    /// Remove this substitution from its target
    ///
    /// Returns `false` if it had already been removed (e.g. by `unstub`).
    pub fn restore(&self) -> bool {
        MethodRegistry::restore(&self.target, &self.method, self.patch)
    }

    /// Whether this substitution is still installed
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.target.table().borrow().contains_patch(&self.method, self.patch)
    }

    /// Call-through hook bound to the patched target
    #[must_use]
    pub fn original(&self) -> Original {
        Original::new(self.target.clone(), &self.method, self.original.clone())
    }

    /// Invoke the replaced implementation on the target
    pub fn call_original(&self, args: &[Value]) -> DoubleResult<Value> {
        self.original().call(args)
    }

    /// Patched object
    #[must_use]
    pub fn target(&self) -> &Object {
        &self.target
    }

    /// Patched method name
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Registry key of the installed patch
    #[must_use]
    pub fn patch_id(&self) -> PatchId {
        self.patch
    }

    /// Whether the patched method was invoked
    #[must_use]
    pub fn was_invoked(&self) -> bool {
        self.recorder.was_invoked()
    }

    /// Arguments of the most recent invocation
    #[must_use]
    pub fn last_arguments(&self) -> Vec<Value> {
        self.recorder.last_arguments()
    }

    /// Number of invocations
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.recorder.call_count()
    }

    /// Retained invocation history
    #[must_use]
    pub fn calls(&self) -> Vec<CallRecord> {
        self.recorder.calls()
    }

    pub(crate) fn recorder(&self) -> &CallRecorder {
        &self.recorder
    }
}
