//! Plugin System Module
//!
//! Discovery, registration and staged execution of publishing plugins.
//! Plugins are matched to content instances by host and family, and every
//! stage reports per-instance outcomes through the same lazy process
//! protocol, so one failing instance never aborts its siblings.
//!
//! # Example Usage
//!
//! ```no_run
//! use stagehand::plugin::{Context, PluginRegistry, stages};
//!
//! let mut registry = PluginRegistry::new();
//! registry.register_plugin_path("/studio/plugins")?;
//!
//! let mut context = Context::new();
//! for handle in registry.discover(Some(stages::SELECTORS), None)? {
//!     let selector = handle.instantiate();
//!     for outcome in selector.process(&mut context) {
//!         outcome.into_result()?;
//!     }
//! }
//! # Ok::<(), stagehand::plugin::PluginError>(())
//! ```

pub mod compatibility;
pub mod context;
pub mod discovery;
pub mod error;
pub mod instance;
pub mod process;
pub mod registry;
pub mod runner;
pub mod traits;

#[cfg(test)]
pub mod tests;

// Re-export core types for easier access
pub use compatibility::{instances_by_plugin, is_compatible, plugins_by_instance};
pub use context::Context;
pub use error::{PluginError, PluginResult};
pub use instance::{Instance, InstanceData};
pub use process::{ProcessEvents, ProcessOutcome};
pub use registry::{PluginFactory, PluginHandle, PluginRegistry, SharedPluginRegistry};
pub use runner::{ErrorPolicy, PipelineRunner, PluginRun, PublishReport, StageReport};
pub use traits::{stages, Plugin, PluginSpec};

// Discovery internals
pub use discovery::PluginDefinitionParser;
