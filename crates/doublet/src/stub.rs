//! Stub Sessions
//!
//! A session installs one or more substitutions on a single target and
//! either runs a block and restores them, or leaves them installed until
//! an explicit [`unstub`].
//!
//! ## Restoration
//!
//! Scoped sessions hold their substitutions in a guard that restores them
//! in reverse installation order on drop, so a failing or panicking block
//! never leaves the target patched.

use crate::config::DoubletConfig;
use crate::expectation::ExpectationCheck;
use crate::logging;
use crate::object::Object;
use crate::registry::MethodRegistry;
use crate::result::{DoubleError, DoubleResult};
use crate::substitution::{Original, Replacement, Substitution};
use std::collections::HashSet;

/// What to check once a scoped session has restored its target
#[derive(Debug, Clone)]
pub(crate) enum Verify {
    /// No post-scope check
    Nothing,
    /// Every substitution must have been invoked
    Invoked,
    /// Every substitution must satisfy the expectation
    Expectation(ExpectationCheck),
}

struct RestoreGuard {
    installed: Vec<Substitution>,
}

impl RestoreGuard {
    /// Restore everything now and hand the records back for verification
    fn finish(mut self) -> Vec<Substitution> {
        let installed = std::mem::take(&mut self.installed);
        restore_all(&installed);
        installed
    }
}

impl Drop for RestoreGuard {
    fn drop(&mut self) {
        restore_all(&self.installed);
    }
}

fn restore_all(installed: &[Substitution]) {
    for substitution in installed.iter().rev() {
        substitution.restore();
    }
    if let Some(first) = installed.first() {
        logging::log_session_end(first.target().label(), installed.len());
    }
}

/// A set of replacements for one target
#[derive(Debug, Clone)]
pub struct StubSession {
    target: Object,
    entries: Vec<(String, Replacement)>,
    verify: Verify,
    config: DoubletConfig,
}

impl StubSession {
    /// Create an empty session for `target`
    #[must_use]
    pub fn new(target: &Object, config: DoubletConfig) -> Self {
        Self {
            target: target.clone(),
            entries: Vec::new(),
            verify: Verify::Nothing,
            config,
        }
    }

    /// Add a replacement for `method`
    #[must_use]
    pub fn replace(mut self, method: impl Into<String>, replacement: impl Into<Replacement>) -> Self {
        self.entries.push((method.into(), replacement.into()));
        self
    }

    /// Fail after the block if any replaced method was never invoked
    #[must_use]
    pub fn require_invocation(mut self) -> Self {
        self.verify = Verify::Invoked;
        self
    }

    pub(crate) fn verify_with(mut self, verify: Verify) -> Self {
        self.verify = verify;
        self
    }

    /// Method names in installation order
    #[must_use]
    pub fn methods(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Reject empty or duplicate entries and unresolvable names before
    /// anything is installed
    fn validate(&self) -> DoubleResult<()> {
        if self.entries.is_empty() {
            return Err(DoubleError::usage(format!(
                "no methods given to stub on {}",
                self.target.label()
            )));
        }
        let mut seen = HashSet::new();
        for (name, _) in &self.entries {
            if !seen.insert(name.as_str()) {
                return Err(DoubleError::usage(format!(
                    "`{name}' given more than once for {}",
                    self.target.label()
                )));
            }
            MethodRegistry::capture(&self.target, name)?;
        }
        Ok(())
    }

    fn install_into(self, installed: &mut Vec<Substitution>) -> DoubleResult<()> {
        for (name, replacement) in self.entries {
            installed.push(Substitution::install(
                &self.target,
                &name,
                replacement,
                self.config.history_limit,
            )?);
        }
        Ok(())
    }

    /// Install, run `block`, then restore
    ///
    /// The block receives a call-through hook for the last method
    /// installed. An error from the block takes precedence over a failed
    /// post-scope verification.
    pub fn run<R, E, F>(self, block: F) -> Result<R, E>
    where
        F: FnOnce(&Original) -> Result<R, E>,
        E: From<DoubleError>,
    {
        self.validate()?;
        logging::log_session_start(self.target.label(), &self.methods(), true);

        let verify = self.verify.clone();
        let verify_invoked = self.config.verify_invoked;
        let target_label = self.target.label().to_string();

        let mut guard = RestoreGuard {
            installed: Vec::with_capacity(self.entries.len()),
        };
        self.install_into(&mut guard.installed)?;

        let hook = guard
            .installed
            .last()
            .map(Substitution::original)
            .ok_or_else(|| DoubleError::usage(format!("nothing installed on {target_label}")))?;

        let outcome = block(&hook);
        let installed = guard.finish();
        let value = outcome?;

        match verify {
            Verify::Nothing => {}
            Verify::Invoked if !verify_invoked => {}
            Verify::Invoked => {
                if let Some(idle) = installed.iter().find(|s| !s.was_invoked()) {
                    return Err(DoubleError::NotInvoked {
                        target: target_label,
                        method: idle.method().to_string(),
                    }
                    .into());
                }
            }
            Verify::Expectation(check) => {
                for substitution in &installed {
                    check.verify(substitution)?;
                }
            }
        }
        Ok(value)
    }

    /// Install and leave the replacements active until [`unstub`]
    pub fn install(self) -> DoubleResult<Vec<Substitution>> {
        self.validate()?;
        logging::log_session_start(self.target.label(), &self.methods(), false);

        let mut guard = RestoreGuard {
            installed: Vec::with_capacity(self.entries.len()),
        };
        self.install_into(&mut guard.installed)?;
        Ok(std::mem::take(&mut guard.installed))
    }
}

/// Restore the most recent substitution of each named method
///
/// Every name is checked before anything is restored, so a failing call
/// leaves all patches in place.
pub fn unstub(target: &Object, methods: &[&str], config: &DoubletConfig) -> DoubleResult<()> {
    let mut pending = Vec::with_capacity(methods.len());
    for &method in methods {
        match MethodRegistry::latest(target, method) {
            Some(id) => pending.push((method, id)),
            None if config.strict_unstub => {
                return Err(DoubleError::NotStubbed {
                    target: target.label().to_string(),
                    method: method.to_string(),
                })
            }
            None => logging::log_unstub_skipped(target.label(), method),
        }
    }
    for (method, id) in pending {
        MethodRegistry::restore(target, method, id);
    }
    Ok(())
}
