//! The `Doubles` facade: stub, expect and unstub under one configuration.

use crate::config::DoubletConfig;
use crate::expectation::{self, Expectation, ExpectationHandle};
use crate::object::Object;
use crate::result::{DoubleError, DoubleResult};
use crate::stub::{self, StubSession};
use crate::substitution::{Original, Replacement, Substitution};

/// Entry point for installing test doubles
///
/// ```
/// use doublet::{Arity, Class, Doubles, DoubleError, Value};
///
/// let class = Class::new("Subject");
/// class.define("foo", Arity::Exact(0), |_, _| Ok(Value::from("foo")));
/// let subject = class.new_instance();
///
/// let doubles = Doubles::new();
/// doubles
///     .stub(&subject, "foo", "new foo", |_| {
///         assert_eq!(subject.call("foo", &[])?, Value::from("new foo"));
///         Ok::<_, DoubleError>(())
///     })
///     .unwrap();
/// assert_eq!(subject.call("foo", &[]).unwrap(), Value::from("foo"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Doubles {
    config: DoubletConfig,
}

impl Doubles {
    /// Facade with the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Facade with an explicit configuration
    #[must_use]
    pub fn with_config(config: DoubletConfig) -> Self {
        Self { config }
    }

    /// Facade configured from `DOUBLET_*` environment variables
    pub fn from_env() -> DoubleResult<Self> {
        Ok(Self::with_config(DoubletConfig::from_env()?))
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &DoubletConfig {
        &self.config
    }

    /// Replace one method for the duration of `block`
    ///
    /// Fails with `NotInvoked` after restoration if the method was never
    /// called inside the block.
    pub fn stub<R, E, F>(
        &self,
        target: &Object,
        method: &str,
        replacement: impl Into<Replacement>,
        block: F,
    ) -> Result<R, E>
    where
        F: FnOnce(&Original) -> Result<R, E>,
        E: From<DoubleError>,
    {
        StubSession::new(target, self.config.clone())
            .replace(method, replacement)
            .require_invocation()
            .run(block)
    }

    /// Replace several methods for the duration of `block`
    ///
    /// The block's hook calls through to the last method given. There is
    /// no never-invoked check for this form.
    pub fn stub_many<R, E, F, I, K, V>(&self, target: &Object, methods: I, block: F) -> Result<R, E>
    where
        F: FnOnce(&Original) -> Result<R, E>,
        E: From<DoubleError>,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Replacement>,
    {
        methods
            .into_iter()
            .fold(StubSession::new(target, self.config.clone()), |session, (k, v)| {
                session.replace(k, v)
            })
            .run(block)
    }

    /// Replace one method until [`Doubles::unstub`]
    pub fn install_stub(
        &self,
        target: &Object,
        method: &str,
        replacement: impl Into<Replacement>,
    ) -> DoubleResult<Substitution> {
        let mut installed = StubSession::new(target, self.config.clone())
            .replace(method, replacement)
            .install()?;
        installed
            .pop()
            .ok_or_else(|| DoubleError::usage(format!("nothing installed for `{method}'")))
    }

    /// Replace several methods until [`Doubles::unstub`]
    pub fn install_stubs<I, K, V>(&self, target: &Object, methods: I) -> DoubleResult<Vec<Substitution>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Replacement>,
    {
        methods
            .into_iter()
            .fold(StubSession::new(target, self.config.clone()), |session, (k, v)| {
                session.replace(k, v)
            })
            .install()
    }

    /// Restore the most recent substitution of each named method
    pub fn unstub(&self, target: &Object, methods: &[&str]) -> DoubleResult<()> {
        stub::unstub(target, methods, &self.config)
    }

    /// Replace `method` with an argument-checking stub for the duration of `block`
    pub fn expect<R, E, F>(
        &self,
        target: &Object,
        method: &str,
        expectation: Expectation,
        block: F,
    ) -> Result<R, E>
    where
        F: FnOnce(&Original) -> Result<R, E>,
        E: From<DoubleError>,
    {
        expectation::run(target, method, expectation, self.config.clone(), block)
    }

    /// Replace `method` with an argument-checking stub until [`Doubles::unstub`]
    pub fn install_expectation(
        &self,
        target: &Object,
        method: &str,
        expectation: Expectation,
    ) -> DoubleResult<ExpectationHandle> {
        expectation::install(target, method, expectation, self.config.clone())
    }
}
