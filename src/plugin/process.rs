//! Process Protocol Types
//!
//! Every plugin stage reports its work as a lazy sequence of per-instance
//! outcomes. Work happens between pulls: consuming the next element
//! performs the next instance's processing, and dropping the sequence
//! abandons the remaining work without touching outcomes already yielded.
//!
//! A recoverable per-instance failure travels in the error half of an
//! outcome; it never escapes the sequence as a propagated error. Whether
//! to escalate is the consumer's decision, via [`ProcessOutcome::into_result`].

use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::instance::Instance;

/// Lazy sequence of per-instance outcomes produced by one plugin run
pub type ProcessEvents<'a> = Box<dyn Iterator<Item = ProcessOutcome> + 'a>;

/// The outcome of processing exactly one instance
#[derive(Debug)]
pub struct ProcessOutcome {
    instance: Instance,
    result: PluginResult<()>,
}

impl ProcessOutcome {
    /// Successful outcome for one instance
    pub fn ok(instance: Instance) -> Self {
        Self { instance, result: Ok(()) }
    }

    /// Failed outcome carrying the per-instance error
    pub fn failed(instance: Instance, error: PluginError) -> Self {
        Self { instance, result: Err(error) }
    }

    /// The instance this outcome reports on
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// The carried error, if processing failed
    pub fn error(&self) -> Option<&PluginError> {
        self.result.as_ref().err()
    }

    /// Whether processing succeeded
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Whether processing failed
    pub fn is_failure(&self) -> bool {
        self.result.is_err()
    }

    /// Escalate: turn a carried failure into a propagated error
    ///
    /// `outcome.into_result()?` aborts further consumption of the
    /// sequence, the caller-policy equivalent of re-raising.
    pub fn into_result(self) -> PluginResult<Instance> {
        self.result.map(|_| self.instance)
    }

    /// Split into the instance and optional error
    pub fn into_parts(self) -> (Instance, Option<PluginError>) {
        (self.instance, self.result.err())
    }
}
