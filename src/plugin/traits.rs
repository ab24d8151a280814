//! Core Plugin Traits
//!
//! Defines the plugin capability contract and the declared metadata every
//! plugin carries, whether compiled in or described by a definition file.

use serde::{Deserialize, Serialize};

use crate::plugin::compatibility::instances_by_plugin;
use crate::plugin::context::Context;
use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::instance::Instance;
use crate::plugin::process::{ProcessEvents, ProcessOutcome};

/// Stage tags and their canonical pipeline ordering
///
/// The set is open-ended by convention: a plugin definition may declare
/// any stage string, and discovery classifies by that declaration. These
/// are the tags the standard pipeline drives.
pub mod stages {
    /// Instance discovery/creation stage
    pub const SELECTORS: &str = "selectors";

    /// Non-mutating inspection stage
    pub const VALIDATORS: &str = "validators";

    /// Externally-visible publishing stage
    pub const EXTRACTORS: &str = "extractors";

    /// Terminal notification stage
    pub const CONFORMS: &str = "conforms";

    /// Canonical execution order of the standard stages
    pub const ORDER: [&str; 4] = [SELECTORS, VALIDATORS, EXTRACTORS, CONFORMS];
}

/// Declared plugin metadata
///
/// Deserialized from YAML definition files for external plugins, or built
/// in code for compiled-in registrations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSpec {
    /// Plugin type-name (unique within a registry), e.g. `ValidateInstance`
    pub name: String,

    /// Stage tag this plugin runs in
    pub stage: String,

    /// Supported authoring hosts; empty means no host restriction
    #[serde(default)]
    pub hosts: Vec<String>,

    /// Applicable content families; empty means no family restriction
    #[serde(default)]
    pub families: Vec<String>,

    /// Plugin version
    #[serde(default)]
    pub version: Option<String>,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Factory key binding this definition to a registered constructor;
    /// empty defaults to the plugin name
    #[serde(default)]
    pub entry_point: String,
}

impl PluginSpec {
    /// Create a new spec with no host or family restriction
    pub fn new<S: Into<String>, T: Into<String>>(name: S, stage: T) -> Self {
        Self {
            name: name.into(),
            stage: stage.into(),
            hosts: Vec::new(),
            families: Vec::new(),
            version: None,
            description: String::new(),
            entry_point: String::new(),
        }
    }

    /// Restrict to the given hosts
    pub fn with_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict to the given families
    pub fn with_families<I, S>(mut self, families: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.families = families.into_iter().map(Into::into).collect();
        self
    }

    /// Set the version
    pub fn with_version<S: Into<String>>(mut self, version: S) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the description
    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }

    /// Set an explicit entry point
    pub fn with_entry_point<S: Into<String>>(mut self, entry_point: S) -> Self {
        self.entry_point = entry_point.into();
        self
    }

    /// The factory key this spec resolves through
    pub fn factory_key(&self) -> &str {
        if self.entry_point.is_empty() {
            &self.name
        } else {
            &self.entry_point
        }
    }

    /// Validate a spec before it enters a catalog
    pub fn validate(&self) -> PluginResult<()> {
        if self.name.is_empty() {
            return Err(PluginError::definition_parse_error(
                "Plugin name cannot be empty",
            ));
        }
        if self.stage.is_empty() {
            return Err(PluginError::definition_parse_error(format!(
                "Plugin '{}' declares no stage",
                self.name
            )));
        }
        Ok(())
    }
}

/// Core plugin interface that all stage plugins implement
///
/// Plugins are stateless, re-instantiable units: a fresh object is
/// constructed per invocation, and nothing is cached across discovery
/// calls.
pub trait Plugin: Send + Sync {
    /// Declared metadata for this plugin instance
    fn spec(&self) -> &PluginSpec;

    /// Run the plugin against a context
    ///
    /// Returns a lazy, single-pass sequence of per-instance outcomes.
    /// The default implementation visits the compatible, pipeline-visible
    /// instances in context order and funnels [`Plugin::process_instance`]
    /// results into outcomes, so a per-instance failure never aborts the
    /// remaining instances.
    ///
    /// Selection plugins override this wholesale: they create instances,
    /// append them to the context and yield one outcome per creation.
    fn process<'a>(&'a self, context: &'a mut Context) -> ProcessEvents<'a> {
        let targets: Vec<Instance> = instances_by_plugin(context, self.spec())
            .filter(|instance| instance.is_identified())
            .collect();

        Box::new(targets.into_iter().map(move |instance| {
            match self.process_instance(&instance) {
                Ok(()) => ProcessOutcome::ok(instance),
                Err(error) => ProcessOutcome::failed(instance, error),
            }
        }))
    }

    /// Process a single instance
    ///
    /// The per-instance hook driven by the default [`Plugin::process`].
    /// Plugins overriding `process` need not implement it.
    fn process_instance(&self, instance: &Instance) -> PluginResult<()> {
        let _ = instance;
        Ok(())
    }
}
